//! Core types for the tmplcheck template type checker.
//!
//! This crate holds everything shared by the parser, the registries and the
//! checker:
//!
//! - [`Span`] / [`Location`]: source positions
//! - [`CheckError`] / [`ParseError`]: the error types every stage returns
//! - [`TypeTable`] / [`TypeId`]: the host type model
//! - [`TypeSystem`] / [`HostTypes`]: the adapter the checker queries

mod error;
mod span;
mod type_system;
pub mod types;

pub use error::{CheckError, CheckErrorKind, ErrorCategory, ParseError, ParseErrorKind, TypeError};
pub use span::{Location, Span};
pub use type_system::{HostTypes, TypeSystem};
pub use types::{
    BasicInfo, BasicKind, ChanDir, Field, InterfaceMethod, InterfaceType, Member, Method,
    NamedType, Signature, StructType, TypeData, TypeId, TypeTable,
};
