//! Static type checking for Go-style text and HTML templates.
//!
//! `tmplcheck` proves, without rendering anything, that a template only
//! touches fields, methods and functions that exist on the data it will be
//! given, and that every call, `range`, `with` and `{{template}}` is well
//! typed.
//!
//! The crate is split into:
//! - [`tmplcheck_core`]: the host type model and error types
//! - [`tmplcheck_parser`]: template lexer, syntax tree and parser
//! - [`tmplcheck_registry`]: function and template registries
//! - [`tmplcheck_checker`]: the checker itself
//!
//! # Example
//!
//! ```
//! use tmplcheck::prelude::*;
//!
//! let mut table = TypeTable::new();
//! let string = table.string();
//! let int = table.int();
//! let fields = table.struct_type(vec![
//!     Field::new("Name", string),
//!     Field::new("Visits", int),
//! ]);
//! let user = table.named(Some("app"), "User", fields);
//! let types = HostTypes::new(table).with_package("app");
//!
//! let functions = FunctionRegistry::with_defaults(&types);
//! let trees = TreeSet::parse("profile", "{{.Name}} ({{.Visits}} visits){{.Email}}").unwrap();
//! let checker = Checker::new(&types, &functions, &trees);
//!
//! let errors = check_all(&checker, &[CheckRequest::new("profile", user)]).unwrap_err();
//! assert!(errors.to_string().contains("can't evaluate field Email in type app.User"));
//! ```

mod batch;

pub use batch::{CheckErrors, CheckRequest, check_all};
#[cfg(feature = "parallel")]
pub use batch::check_all_parallel;

pub use tmplcheck_checker::{CheckOptions, Checker, Scope, check};
pub use tmplcheck_core::{CheckError, CheckErrorKind, ErrorCategory, Location};
pub use tmplcheck_parser::{ParseError, Parser, Tree};
pub use tmplcheck_registry::{FunctionRegistry, TreeFinder, TreeSet};

/// Everything needed to describe host types and check templates.
pub mod prelude {
    pub use crate::batch::{CheckErrors, CheckRequest, check_all};
    #[cfg(feature = "parallel")]
    pub use crate::batch::check_all_parallel;
    pub use tmplcheck_checker::{CheckOptions, Checker};
    pub use tmplcheck_core::{
        BasicKind, ChanDir, CheckError, CheckErrorKind, ErrorCategory, Field, HostTypes,
        InterfaceMethod, Signature, TypeId, TypeSystem, TypeTable,
    };
    pub use tmplcheck_parser::{ParseError, Parser, Tree};
    pub use tmplcheck_registry::{FunctionRegistry, TreeFinder, TreeSet};
}
