//! Static type checker for Go-style templates.
//!
//! Given a parsed [`Tree`] and the type of the value that will be passed to
//! it, the [`Checker`] proves that every field access, call, control
//! structure and built-in operation in the template is well typed, without
//! executing it.
//!
//! ```text
//! Checker::check(tree, dot)
//!     └── Walker
//!         ├── Scope            - `$` variables, copied per branch
//!         ├── TypeSystem       - member lookup, assignability
//!         ├── FunctionRegistry - functions and built-ins
//!         └── TreeFinder       - targets of {{template}}
//! ```
//!
//! A check stops at the first error, which carries the template name, the
//! offending source text and its location.
//!
//! # Example
//!
//! ```
//! use tmplcheck_checker::Checker;
//! use tmplcheck_core::{Field, HostTypes, TypeTable};
//! use tmplcheck_registry::{FunctionRegistry, TreeSet};
//!
//! let mut table = TypeTable::new();
//! let string = table.string();
//! let fields = table.struct_type(vec![Field::new("Title", string)]);
//! let page = table.named(Some("app"), "Page", fields);
//! let types = HostTypes::new(table);
//!
//! let functions = FunctionRegistry::with_defaults(&types);
//! let trees = TreeSet::parse("page", "<h1>{{.Title | html}}</h1>").unwrap();
//! let checker = Checker::new(&types, &functions, &trees);
//!
//! assert!(checker.check_named("page", page).is_ok());
//! ```

mod options;
mod scope;
mod walk;

pub use options::{CheckOptions, DEFAULT_MAX_TEMPLATE_DEPTH};
pub use scope::Scope;

use tmplcheck_core::{CheckError, CheckErrorKind, Location, Span, TypeId, TypeSystem};
use tmplcheck_parser::Tree;
use tmplcheck_registry::{FunctionRegistry, TreeFinder};
use tracing::debug;

use walk::Walker;

/// Checks templates against host types.
///
/// The checker only borrows its collaborators, so one set of types and
/// registries can back many checkers, including on other threads.
#[derive(Clone)]
pub struct Checker<'a> {
    types: &'a dyn TypeSystem,
    functions: &'a FunctionRegistry,
    trees: &'a dyn TreeFinder,
    options: CheckOptions,
}

impl<'a> Checker<'a> {
    pub fn new(
        types: &'a dyn TypeSystem,
        functions: &'a FunctionRegistry,
        trees: &'a dyn TreeFinder,
    ) -> Self {
        Self {
            types,
            functions,
            trees,
            options: CheckOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Check `tree` with `dot` as the type of its initial dot.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&self, tree: &Tree, dot: TypeId) -> Result<(), CheckError> {
        debug!(
            template = %tree.name,
            dot = %self.types.type_name(dot),
            "checking template"
        );
        let result = Walker::new(self).check_tree(tree, dot);
        match &result {
            Ok(()) => debug!(template = %tree.name, "template checked"),
            Err(error) => debug!(template = %tree.name, %error, "template failed"),
        }
        result
    }

    /// Look up a template by name and check it.
    pub fn check_named(&self, name: &str, dot: TypeId) -> Result<(), CheckError> {
        let Some(tree) = self.trees.find_tree(name) else {
            return Err(CheckError::new(
                CheckErrorKind::TemplateNotFound {
                    name: name.to_string(),
                },
                name,
                name,
                Location::new(name, Span::new(1, 1, 0)),
            ));
        };
        self.check(tree, dot)
    }
}

/// Check one tree with default options.
pub fn check(
    tree: &Tree,
    dot: TypeId,
    types: &dyn TypeSystem,
    functions: &FunctionRegistry,
    trees: &dyn TreeFinder,
) -> Result<(), CheckError> {
    Checker::new(types, functions, trees).check(tree, dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmplcheck_core::{BasicKind, ChanDir, ErrorCategory, Field, HostTypes, Signature, TypeTable};
    use tmplcheck_parser::{ActionNode, CommandNode, Ident, ListNode, Node, PipeNode, VariableNode};
    use tmplcheck_registry::TreeSet;

    struct Fixture {
        types: HostTypes,
        functions: FunctionRegistry,
        page: TypeId,
        user: TypeId,
        tree_node: TypeId,
    }

    /// `app.Page` is the dot of most tests.
    fn fixture() -> Fixture {
        let mut table = TypeTable::new();
        let string = table.string();
        let int = table.int();
        let float = table.basic(BasicKind::Float64);
        let error = table.error();

        let user = table.declare_named(Some("app"), "User");
        let user_ptr = table.pointer(user);
        let user_fields = table.struct_type(vec![
            Field::new("Name", string),
            Field::new("Age", int),
            Field::new("secret", string),
        ]);
        table.set_underlying(user, user_fields).unwrap();

        let to_string = table.func(vec![], vec![string]);
        let to_user = table.func(vec![], vec![user]);
        let nothing = table.func(vec![], vec![]);
        let pair = table.func(vec![], vec![string, int]);
        let load = table.func(vec![], vec![string, error]);
        let greet = table.func(vec![string], vec![string]);
        table.add_method(user, "DisplayName", to_string, false).unwrap();
        table.add_method(user, "Friend", to_user, true).unwrap();
        table.add_method(user, "Void", nothing, false).unwrap();
        table.add_method(user, "Pair", pair, false).unwrap();
        table.add_method(user, "Load", load, false).unwrap();
        table.add_method(user, "Greet", greet, false).unwrap();

        let empty_fields = table.struct_type(vec![]);
        let empty = table.named(Some("app"), "Empty", empty_fields);
        let users = table.slice(user);
        let tags = table.map(string, string);
        let matrix = table.array(3, int);
        let events = table.chan(ChanDir::Recv, string);
        let render = table.func(vec![string], vec![string]);

        let page_fields = table.struct_type(vec![
            Field::new("Title", string),
            Field::new("Count", int),
            Field::new("Field", empty),
            Field::new("Users", users),
            Field::new("Owner", user_ptr),
            Field::new("Tags", tags),
            Field::new("Matrix", matrix),
            Field::new("Events", events),
            Field::new("Render", render),
        ]);
        let page = table.named(Some("app"), "Page", page_fields);

        let tree_node = table.declare_named(Some("app"), "Node");
        let tree_node_ptr = table.pointer(tree_node);
        let children = table.slice(tree_node_ptr);
        let node_fields = table.struct_type(vec![
            Field::new("Label", string),
            Field::new("Children", children),
        ]);
        table.set_underlying(tree_node, node_fields).unwrap();

        let types = HostTypes::new(table).with_package("app");
        let functions = FunctionRegistry::with_defaults(&types).with_functions([
            ("upper", Signature::new(vec![string], vec![string])),
            ("half", Signature::new(vec![float], vec![float])),
        ]);

        Fixture {
            types,
            functions,
            page,
            user,
            tree_node,
        }
    }

    fn run(f: &Fixture, source: &str, dot: TypeId) -> Result<(), CheckError> {
        let trees = TreeSet::parse("test", source).unwrap();
        Checker::new(&f.types, &f.functions, &trees).check_named("test", dot)
    }

    fn fails(f: &Fixture, source: &str, dot: TypeId) -> CheckError {
        match run(f, source, dot) {
            Ok(()) => panic!("expected {source:?} to fail"),
            Err(error) => error,
        }
    }

    #[test]
    fn text_only() {
        let f = fixture();
        assert!(run(&f, "plain <b>text</b>", f.page).is_ok());
        assert!(run(&f, "plain", f.types.basic(BasicKind::Int)).is_ok());
    }

    #[test]
    fn fields_and_missing_fields() {
        let f = fixture();
        assert!(run(&f, "{{.Field}} {{.Title}} {{.Owner.Name}}", f.page).is_ok());

        let err = fails(&f, "{{.Missing}}", f.page);
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
        let message = err.to_string();
        assert!(message.contains("Missing"), "{message}");
        assert!(message.contains("app.Page"), "{message}");
        assert_eq!(err.template, "test");
        assert_eq!(err.context, ".Missing");
    }

    #[test]
    fn unexported_names_fail() {
        let f = fixture();
        let err = fails(&f, "{{.Owner.secret}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::Unexported { .. }));
        let err = fails(&f, "{{.nothing}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::Unexported { .. }));
    }

    #[test]
    fn method_chains() {
        let f = fixture();
        assert!(run(&f, "{{.Owner.Friend.Friend.DisplayName}}", f.page).is_ok());
        assert!(run(&f, "{{.Owner.Load}}", f.page).is_ok());

        let err = fails(&f, "{{.Owner.Friend.Void}}", f.page);
        assert_eq!(err.category(), ErrorCategory::SignatureShapeError);
        assert_eq!((err.location.line, err.location.col), (1, 17));

        let err = fails(&f, "{{.Owner.Pair}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::SecondResultNotError { .. }));
    }

    #[test]
    fn method_arguments() {
        let f = fixture();
        assert!(run(&f, r#"{{.Owner.Greet "hi"}}"#, f.page).is_ok());
        assert!(run(&f, r#"{{"hi" | .Owner.Greet}}"#, f.page).is_ok());

        let err = fails(&f, "{{.Owner.Greet}}", f.page);
        assert_eq!(err.category(), ErrorCategory::ArityMismatch);
        let err = fails(&f, "{{.Owner.Greet .Count}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
    }

    #[test]
    fn only_callable_fields_take_arguments() {
        let f = fixture();
        let err = fails(&f, r#"{{.Title "x"}}"#, f.page);
        assert!(matches!(err.kind, CheckErrorKind::FieldArguments { .. }));
        let err = fails(&f, r#"{{"x" | .Tags.key}}"#, f.page);
        assert!(matches!(err.kind, CheckErrorKind::FieldArguments { .. }));
        let err = fails(&f, "{{.Render.Name}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::CallableField { .. }));

        assert!(run(&f, r#"{{.Render "x" | upper}}"#, f.page).is_ok());
        assert!(run(&f, r#"{{"x" | .Render}}"#, f.page).is_ok());
        assert!(run(&f, r#"{{call .Render "x"}}"#, f.page).is_ok());
        let err = fails(&f, "{{.Render .Count}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
        let err = fails(&f, "{{.Render}}{{.Render}}{{.Render 1 2}}", f.page);
        assert_eq!(err.category(), ErrorCategory::ArityMismatch);
    }

    #[test]
    fn map_fields_are_keys() {
        let f = fixture();
        assert!(run(&f, "{{.Tags.anything | upper}}", f.page).is_ok());
        let err = fails(&f, "{{.Tags.key.Name}}", f.page);
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
    }

    #[test]
    fn range_bindings() {
        let f = fixture();
        assert!(run(&f, "{{range .Users}}{{.Name}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{range $u := .Users}}{{$u.Name}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{range $i, $u := .Users}}{{$u.Name}}{{end}}", f.page).is_ok());
        let source = "{{range $k, $v := .Tags}}{{upper $k}}{{upper $v}}{{end}}";
        assert!(run(&f, source, f.page).is_ok());
        assert!(run(&f, "{{range .Matrix}}{{printf \"%d\" .}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{range .Events}}{{upper .}}{{end}}", f.page).is_ok());

        let err = fails(&f, "{{range $i, $u := .Users}}{{upper $i}}{{end}}", f.page);
        assert_eq!(
            err.kind,
            CheckErrorKind::ArgumentType {
                name: "upper".to_string(),
                index: 0,
                expected: "string".to_string(),
                found: "int".to_string(),
            }
        );

        let err = fails(&f, "{{range .Count}}{{end}}", f.page);
        assert_eq!(err.category(), ErrorCategory::UnsupportedOperation);
        assert!(matches!(err.kind, CheckErrorKind::CannotRange { .. }));
    }

    #[test]
    fn range_else_sees_element_dot() {
        let f = fixture();
        assert!(run(&f, "{{range .Users}}{{else}}{{.Name}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{range .Users}}{{.Name}}{{else}}{{$.Title}}{{end}}", f.page).is_ok());
        let err = fails(&f, "{{range .Users}}{{.Name}}{{else}}{{.Title}}{{end}}", f.page);
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
        assert!(err.to_string().contains("app.User"), "{err}");
    }

    #[test]
    fn with_rebinds_dot() {
        let f = fixture();
        assert!(run(&f, "{{with .Owner}}{{.Name}}{{else}}{{.Title}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{with $o := .Owner}}{{$o.Name}}{{.Age}}{{end}}", f.page).is_ok());

        let err = fails(&f, "{{with .Owner}}{{.Title}}{{end}}", f.page);
        assert!(err.to_string().contains("User"), "{err}");
        let err = fails(&f, "{{with .Owner}}{{else}}{{.Name}}{{end}}", f.page);
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
    }

    #[test]
    fn if_checks_both_branches() {
        let f = fixture();
        let source = "{{if .Owner}}{{.Title}}{{else if .Count}}{{.Count}}{{end}}";
        assert!(run(&f, source, f.page).is_ok());
        let err = fails(&f, "{{if .Title}}ok{{else}}{{.Nope}}{{end}}", f.page);
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
    }

    #[test]
    fn variables_and_assignment() {
        let f = fixture();
        assert!(run(&f, "{{$t := .Title}}{{upper $t}}{{$t = \"x\"}}", f.page).is_ok());
        assert!(run(&f, "{{$.Title}}{{with .Owner}}{{$.Count}}{{end}}", f.page).is_ok());

        let err = fails(&f, "{{$c := .Count}}{{upper $c}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
        let err = fails(&f, "{{$t := .Title}}{{$t = .Count}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::NotAssignable { .. }));
    }

    #[test]
    fn declarations_bind_container_parts() {
        let f = fixture();
        assert!(run(&f, "{{$u := .Users}}{{$u.Name}}", f.page).is_ok());
        assert!(run(&f, "{{$v := .Tags}}{{upper $v}}", f.page).is_ok());
        assert!(run(&f, "{{$e := .Events}}{{upper $e}}", f.page).is_ok());
        assert!(run(&f, "{{$o := .Owner}}{{$o.Name}}", f.page).is_ok());
        assert!(run(&f, "{{with $u := .Users}}{{$u.Name}}{{len .}}{{end}}", f.page).is_ok());

        let err = fails(&f, "{{$u := .Users}}{{len $u}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::CannotTakeLen { .. }));
    }

    #[test]
    fn untyped_constants_concretize_only_at_new_dots() {
        let f = fixture();
        assert!(run(&f, "{{half 1}}", f.page).is_ok());
        assert!(run(&f, "{{$v := 1}}{{half $v}}", f.page).is_ok());
        assert!(run(&f, "{{half (print 1 | len)}}", f.page).is_err());

        let err = fails(&f, "{{with 1}}{{half .}}{{end}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
        let err = fails(&f, r#"{{define "x"}}{{half .}}{{end}}{{template "x" 1}}"#, f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
        assert_eq!(err.template, "x");
    }

    #[test]
    fn pipelines_pass_previous_result() {
        let f = fixture();
        assert!(run(&f, "{{.Title | upper | html}}", f.page).is_ok());
        let err = fails(&f, "{{.Count | upper}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
        assert!(run(&f, "{{(.Owner).Name}}", f.page).is_ok());
        assert!(run(&f, "{{(index .Users 0).Name | upper}}", f.page).is_ok());
    }

    #[test]
    fn non_functions_take_no_arguments() {
        let f = fixture();
        let err = fails(&f, r#"{{"x" 1}}"#, f.page);
        assert!(matches!(err.kind, CheckErrorKind::NotAFunction { .. }));
        let err = fails(&f, "{{.Title | 1}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::NotAFunction { .. }));
        let err = fails(&f, "{{(.Title) 1}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::NotAFunction { .. }));
    }

    #[test]
    fn literals() {
        let f = fixture();
        assert!(run(&f, r#"{{print 1 1.5 2i 'x' "s" true}}"#, f.page).is_ok());
        let err = fails(&f, "{{print 99999999999999999999}}", f.page);
        assert!(matches!(err.kind, CheckErrorKind::IntegerOverflow { .. }));
    }

    #[test]
    fn unknown_function() {
        let f = fixture();
        let err = fails(&f, "{{shout .Title}}", f.page);
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn sub_templates() {
        let f = fixture();
        let source = concat!(
            r#"{{define "user"}}{{.Name}}{{end}}"#,
            r#"{{range .Users}}{{template "user" .}}{{end}}"#,
        );
        assert!(run(&f, source, f.page).is_ok());

        let err = fails(&f, r#"{{define "user"}}{{.Name}}{{end}}{{template "user" .}}"#, f.page);
        assert_eq!(err.template, "user");

        let err = fails(&f, r#"{{template "missing" .}}"#, f.page);
        assert!(matches!(err.kind, CheckErrorKind::TemplateNotFound { .. }));
    }

    #[test]
    fn template_without_pipe_gets_nil_dot() {
        let f = fixture();
        let source = r#"{{define "footer"}}bye{{end}}{{template "footer"}}"#;
        assert!(run(&f, source, f.page).is_ok());
        let source = r#"{{define "footer"}}{{.Title}}{{end}}{{template "footer"}}"#;
        assert!(run(&f, source, f.page).is_err());
    }

    #[test]
    fn sub_templates_start_with_fresh_scope() {
        let f = fixture();
        let span = Span::new(1, 3, 2);
        let uses_x = Node::Action(ActionNode {
            pipe: PipeNode {
                cmds: vec![CommandNode {
                    args: vec![Node::Variable(VariableNode {
                        idents: vec![Ident::new("$x", span)],
                        span,
                    })],
                    span,
                }],
                span,
                ..PipeNode::default()
            },
            span,
        });
        let source = r#"{{$x := .Title}}{{template "child" .}}"#;
        let mut trees = TreeSet::parse("page", source).unwrap();
        trees.insert(Tree::new(
            "child",
            "child",
            ListNode {
                nodes: vec![uses_x],
                span,
            },
        ));

        let checker = Checker::new(&f.types, &f.functions, &trees);
        let err = checker.check_named("page", f.page).unwrap_err();
        assert_eq!(
            err.kind,
            CheckErrorKind::UndefinedVariable {
                name: "$x".to_string()
            }
        );
        assert_eq!(err.template, "child");
    }

    #[test]
    fn recursive_templates_terminate() {
        let f = fixture();
        let source = concat!(
            r#"{{define "tree"}}{{.Label}}{{range .Children}}{{template "tree" .}}{{end}}{{end}}"#,
            r#"{{template "tree" .}}"#,
        );
        assert!(run(&f, source, f.tree_node).is_ok());
    }

    #[test]
    fn template_depth_limit() {
        let f = fixture();
        let source = concat!(
            r#"{{define "a"}}{{template "b" .}}{{end}}"#,
            r#"{{define "b"}}{{template "c" .}}{{end}}"#,
            r#"{{define "c"}}x{{end}}{{template "a" .}}"#,
        );
        let trees = TreeSet::parse("test", source).unwrap();

        let checker = Checker::new(&f.types, &f.functions, &trees);
        assert!(checker.check_named("test", f.page).is_ok());

        let shallow = checker.with_options(CheckOptions::new().with_max_template_depth(1));
        let err = shallow.check_named("test", f.page).unwrap_err();
        assert!(matches!(err.kind, CheckErrorKind::TemplateDepthExceeded { limit: 1, .. }));
    }

    #[test]
    fn builtins_in_templates() {
        let f = fixture();
        let source = "{{len .Title}}{{len .Users}}{{len .Matrix}}{{len .Tags}}";
        assert!(run(&f, source, f.page).is_ok());
        assert!(run(&f, "{{(slice .Users 1).Name}}{{(slice .Users 0 1 2).Age}}", f.page).is_ok());
        assert!(run(&f, r#"{{slice .Matrix 0 2 | printf "%d"}}"#, f.page).is_ok());
        assert!(run(&f, r#"{{index .Tags "a" | upper}}"#, f.page).is_ok());
        assert!(run(&f, "{{if and .Title .Count}}{{end}}{{if not .Owner}}{{end}}", f.page).is_ok());
        assert!(run(&f, "{{if eq .Count 1}}{{end}}{{slice .Title 1 2 | upper}}", f.page).is_ok());

        let err = fails(&f, "{{len .Count}}", f.page);
        assert_eq!(err.category(), ErrorCategory::UnsupportedOperation);
        let err = fails(&f, "{{index .Tags 1}}", f.page);
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
    }

    #[test]
    fn check_named_reports_missing_root() {
        let f = fixture();
        let trees = TreeSet::new();
        let err = Checker::new(&f.types, &f.functions, &trees)
            .check_named("nope", f.user)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
