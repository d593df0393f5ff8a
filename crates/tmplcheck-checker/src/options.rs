//! Checker configuration.

/// Default limit on nested `{{template}}` calls.
pub const DEFAULT_MAX_TEMPLATE_DEPTH: usize = 64;

/// Options for a [`Checker`](crate::Checker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// How deeply `{{template}}` calls may nest before the check fails.
    ///
    /// Calling a template again with a dot type it is already being checked
    /// with is treated as recursion and accepted without descending, so this
    /// only bounds chains of distinct (template, dot) pairs.
    pub max_template_depth: usize,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self {
            max_template_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
        }
    }

    pub fn with_max_template_depth(mut self, depth: usize) -> Self {
        self.max_template_depth = depth;
        self
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self::new()
    }
}
