//! Named template lookup for `{{template}}` calls.

use rustc_hash::FxHashMap;
use tmplcheck_parser::{ParseError, Parser, Tree};

/// Resolves a template name to its tree.
///
/// Finders are shared read-only between concurrent checks.
pub trait TreeFinder: Send + Sync {
    fn find_tree(&self, name: &str) -> Option<&Tree>;
}

/// The set of templates that can call each other.
#[derive(Debug, Clone, Default)]
pub struct TreeSet {
    trees: FxHashMap<String, Tree>,
}

impl TreeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one source into a new set.
    ///
    /// The source's top-level content becomes the template `name`; each
    /// `define` and `block` adds one more.
    pub fn parse(name: &str, source: &str) -> Result<Self, ParseError> {
        let mut set = Self::new();
        set.add_source(name, source)?;
        Ok(set)
    }

    /// Parse another source into this set.
    ///
    /// A template that renders only whitespace never replaces an existing
    /// template of the same name, so a file of `define`s does not clobber
    /// the page it is added to.
    pub fn add_source(&mut self, name: &str, source: &str) -> Result<(), ParseError> {
        for tree in Parser::parse(name, source)? {
            let keep_existing = tree.is_blank() && self.trees.contains_key(&tree.name);
            if !keep_existing {
                self.insert(tree);
            }
        }
        Ok(())
    }

    /// Add a tree, replacing any tree with the same name.
    pub fn insert(&mut self, tree: Tree) -> Option<Tree> {
        self.trees.insert(tree.name.clone(), tree)
    }

    pub fn get(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tree> {
        self.trees.values()
    }
}

impl FromIterator<Tree> for TreeSet {
    fn from_iter<I: IntoIterator<Item = Tree>>(iter: I) -> Self {
        let mut set = Self::new();
        for tree in iter {
            set.insert(tree);
        }
        set
    }
}

impl TreeFinder for TreeSet {
    fn find_tree(&self, name: &str) -> Option<&Tree> {
        self.get(name)
    }
}

impl TreeFinder for FxHashMap<String, Tree> {
    fn find_tree(&self, name: &str) -> Option<&Tree> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"{{define "header"}}{{.Title}}{{end}}{{template "header" .}}body"#;

    #[test]
    fn parse_collects_defines() {
        let set = TreeSet::parse("layout", LAYOUT).unwrap();
        assert_eq!(set.names(), ["header", "layout"]);
        assert!(set.find_tree("header").is_some());
        assert!(set.find_tree("footer").is_none());
    }

    #[test]
    fn blank_sources_do_not_replace_templates() {
        let mut set = TreeSet::parse("layout", LAYOUT).unwrap();
        set.add_source("layout", r#"{{define "footer"}}bye{{end}}"#)
            .unwrap();

        assert_eq!(set.len(), 3);
        assert!(!set.get("layout").unwrap().is_blank());
        assert!(set.get("footer").is_some());
    }

    #[test]
    fn hash_map_is_a_finder() {
        let set = TreeSet::parse("layout", LAYOUT).unwrap();
        let map: FxHashMap<String, Tree> = set
            .iter()
            .map(|tree| (tree.name.clone(), tree.clone()))
            .collect();
        assert_eq!(map.find_tree("header").map(|t| t.name.as_str()), Some("header"));
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(TreeSet::parse("broken", "{{if .}}").is_err());
    }
}
