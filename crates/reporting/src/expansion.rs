//! Expand/collapse state for the rendered hierarchy, keyed by node path.

use std::collections::HashSet;

/// Answers whether a node's children should be shown. Has no effect on
/// aggregation, only on which rows are emitted for display.
pub trait ExpansionState {
    fn is_expanded(&self, key: &str) -> bool;
}

/// Key of the `index`-th child under `parent_key` (`""` for roots), e.g.
/// `-0` for the first root and `-0-2` for its third child.
pub fn node_key(parent_key: &str, index: usize) -> String {
    format!("{parent_key}-{index}")
}

/// Explicit set of expanded node keys; everything else is collapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpandedKeys {
    keys: HashSet<String>,
}

impl ExpandedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn collapse(&mut self, key: &str) {
        self.keys.remove(key);
    }

    /// Flip a key and return its new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ExpandedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ExpansionState for ExpandedKeys {
    fn is_expanded(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Every node expanded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandAll;

impl ExpansionState for ExpandAll {
    fn is_expanded(&self, _key: &str) -> bool {
        true
    }
}
