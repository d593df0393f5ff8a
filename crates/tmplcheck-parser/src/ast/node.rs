//! Template syntax tree nodes.
//!
//! [`Node`] is a closed sum type; the checker matches on it exhaustively.
//! Every node carries the [`Span`] of its first character. Field, chain and
//! variable nodes keep a span per identifier so diagnostics can point at the
//! exact element of a dotted chain.
//!
//! `Display` renders nodes back to template syntax. The checker uses that text
//! as the "at <...>" context of its errors.

use std::fmt;

use tmplcheck_core::Span;

use super::literal::NumberKind;

/// An identifier with its own position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A template syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text.
    Text(TextNode),
    /// A sequence of nodes.
    List(ListNode),
    /// A non-control action: `{{pipeline}}`.
    Action(ActionNode),
    /// A pipeline, possibly declaring variables.
    Pipe(PipeNode),
    /// One stage of a pipeline.
    Command(CommandNode),
    /// `.A.B`, rooted at dot.
    Field(FieldNode),
    /// `(expr).A.B`
    Chain(ChainNode),
    /// `$x.A.B`
    Variable(VariableNode),
    /// A function name.
    Identifier(IdentifierNode),
    /// `.`
    Dot(Span),
    /// `nil`
    Nil(Span),
    Bool(BoolNode),
    String(StringNode),
    Number(NumberNode),
    /// `{{if pipeline}} list {{else}} list {{end}}`
    If(BranchNode),
    /// `{{range pipeline}} list {{else}} list {{end}}`
    Range(BranchNode),
    /// `{{with pipeline}} list {{else}} list {{end}}`
    With(BranchNode),
    /// `{{template "name" pipeline}}`
    Template(TemplateNode),
    /// `{{/* text */}}`
    Comment(CommentNode),
    /// `{{break}}`
    Break(Span),
    /// `{{continue}}`
    Continue(Span),
}

impl Node {
    /// Position of the node's first character.
    pub fn span(&self) -> Span {
        match self {
            Node::Text(n) => n.span,
            Node::List(n) => n.span,
            Node::Action(n) => n.span,
            Node::Pipe(n) => n.span,
            Node::Command(n) => n.span,
            Node::Field(n) => n.span,
            Node::Chain(n) => n.span,
            Node::Variable(n) => n.span,
            Node::Identifier(n) => n.span,
            Node::Bool(n) => n.span,
            Node::String(n) => n.span,
            Node::Number(n) => n.span,
            Node::If(n) | Node::Range(n) | Node::With(n) => n.span,
            Node::Template(n) => n.span,
            Node::Comment(n) => n.span,
            Node::Dot(span) | Node::Nil(span) | Node::Break(span) | Node::Continue(span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListNode {
    pub nodes: Vec<Node>,
    pub span: Span,
}

impl ListNode {
    pub fn new(span: Span) -> Self {
        Self {
            nodes: Vec::new(),
            span,
        }
    }

    /// Whether the list holds nothing but whitespace text and comments.
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Text(text) => text.text.trim().is_empty(),
            Node::Comment(_) => true,
            _ => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionNode {
    pub pipe: PipeNode,
    pub span: Span,
}

/// A pipeline: commands separated by `|`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipeNode {
    /// Declared or assigned variables, including the `$`.
    pub decl: Vec<Ident>,
    /// The variables are assigned (`=`) rather than declared (`:=`).
    pub is_assign: bool,
    pub cmds: Vec<CommandNode>,
    pub span: Span,
}

/// A pipeline stage. The first argument decides how it executes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandNode {
    pub args: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Field names, without the leading dots.
    pub idents: Vec<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub node: Box<Node>,
    pub fields: Vec<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNode {
    /// The variable name (with `$`) followed by any field names.
    pub idents: Vec<Ident>,
    pub span: Span,
}

impl VariableNode {
    /// The variable's name, including the `$`.
    pub fn name(&self) -> &str {
        self.idents.first().map_or("$", |ident| ident.name.as_str())
    }

    /// Field names applied to the variable.
    pub fn fields(&self) -> &[Ident] {
        self.idents.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierNode {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolNode {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringNode {
    /// The literal as written, with quotes.
    pub quoted: String,
    /// The decoded value.
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberNode {
    /// The literal as written.
    pub text: String,
    pub kind: NumberKind,
    pub span: Span,
}

/// Shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub pipe: PipeNode,
    pub list: ListNode,
    pub else_list: Option<ListNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    /// Name of the invoked template.
    pub name: String,
    pub pipe: Option<PipeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub text: String,
    pub span: Span,
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(n) => f.write_str(&n.text),
            Node::List(n) => n.fmt(f),
            Node::Action(n) => write!(f, "{{{{{}}}}}", n.pipe),
            Node::Pipe(n) => n.fmt(f),
            Node::Command(n) => n.fmt(f),
            Node::Field(n) => n.fmt(f),
            Node::Chain(n) => n.fmt(f),
            Node::Variable(n) => n.fmt(f),
            Node::Identifier(n) => f.write_str(&n.name),
            Node::Dot(_) => f.write_str("."),
            Node::Nil(_) => f.write_str("nil"),
            Node::Bool(n) => write!(f, "{}", n.value),
            Node::String(n) => f.write_str(&n.quoted),
            Node::Number(n) => f.write_str(&n.text),
            Node::If(n) => n.write(f, "if"),
            Node::Range(n) => n.write(f, "range"),
            Node::With(n) => n.write(f, "with"),
            Node::Template(n) => match &n.pipe {
                Some(pipe) => write!(f, "{{{{template {:?} {}}}}}", n.name, pipe),
                None => write!(f, "{{{{template {:?}}}}}", n.name),
            },
            Node::Comment(n) => f.write_str(&n.text),
            Node::Break(_) => f.write_str("{{break}}"),
            Node::Continue(_) => f.write_str("{{continue}}"),
        }
    }
}

impl fmt::Display for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PipeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            for (i, var) in self.decl.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&var.name)?;
            }
            f.write_str(if self.is_assign { " = " } else { " := " })?;
        }
        for (i, cmd) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match arg {
                Node::Pipe(pipe) => write!(f, "({pipe})")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for FieldNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ident in &self.idents {
            write!(f, ".{}", ident.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            Node::Pipe(pipe) => write!(f, "({pipe})")?,
            other => write!(f, "{other}")?,
        }
        for ident in &self.fields {
            write!(f, ".{}", ident.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for VariableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ident) in self.idents.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&ident.name)?;
        }
        Ok(())
    }
}

impl BranchNode {
    fn write(&self, f: &mut fmt::Formatter<'_>, keyword: &str) -> fmt::Result {
        write!(f, "{{{{{keyword} {}}}}}{}", self.pipe, self.list)?;
        if let Some(else_list) = &self.else_list {
            write!(f, "{{{{else}}}}{else_list}")?;
        }
        f.write_str("{{end}}")
    }
}
