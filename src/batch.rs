//! Checking many (template, dot type) pairs at once.
//!
//! Each request is checked independently; one failing template does not stop
//! the others. Failures are collected into [`CheckErrors`] in request order.

use std::fmt;

use thiserror::Error;
use tmplcheck_checker::Checker;
use tmplcheck_core::{CheckError, TypeId};
use tracing::debug;

/// One template to check and the type of the value it will be given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub template: String,
    pub dot: TypeId,
}

impl CheckRequest {
    pub fn new(template: impl Into<String>, dot: TypeId) -> Self {
        Self {
            template: template.into(),
            dot,
        }
    }
}

/// Every failure from a batch, one per failing request.
///
/// Displays one error per line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct CheckErrors {
    errors: Vec<CheckError>,
}

impl CheckErrors {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CheckError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<CheckError> {
        self.errors
    }
}

impl fmt::Display for CheckErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for CheckErrors {
    type Item = CheckError;
    type IntoIter = std::vec::IntoIter<CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'e> IntoIterator for &'e CheckErrors {
    type Item = &'e CheckError;
    type IntoIter = std::slice::Iter<'e, CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

fn collect(requests: usize, errors: Vec<CheckError>) -> Result<(), CheckErrors> {
    debug!(requests, failed = errors.len(), "checked template batch");
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckErrors { errors })
    }
}

/// Check every request in order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_all(checker: &Checker<'_>, requests: &[CheckRequest]) -> Result<(), CheckErrors> {
    let errors = requests
        .iter()
        .filter_map(|request| checker.check_named(&request.template, request.dot).err())
        .collect();
    collect(requests.len(), errors)
}

/// Check every request on the rayon thread pool.
///
/// Errors are reported in request order, as [`check_all`] does.
#[cfg(feature = "parallel")]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_all_parallel(
    checker: &Checker<'_>,
    requests: &[CheckRequest],
) -> Result<(), CheckErrors> {
    use rayon::prelude::*;

    let errors = requests
        .par_iter()
        .filter_map(|request| checker.check_named(&request.template, request.dot).err())
        .collect();
    collect(requests.len(), errors)
}
