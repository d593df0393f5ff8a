//! Registries consulted while checking templates.
//!
//! - [`FunctionRegistry`]: function names to signatures, with the built-in
//!   fallbacks in [`Builtin`]
//! - [`TreeFinder`] / [`TreeSet`]: named templates for `{{template}}` calls
//! - [`check_arguments`] / [`check_results`]: the signature rules shared by
//!   functions, methods and `call`
//!
//! Both registries are immutable once built and can be shared across
//! threads.

mod builtins;
mod calls;
mod functions;
mod trees;

pub use builtins::Builtin;
pub use calls::{assignable_through_pointers, check_arguments, check_results};
pub use functions::FunctionRegistry;
pub use trees::{TreeFinder, TreeSet};
