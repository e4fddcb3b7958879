//! A segment-keyed trie from dotted patterns to values.
//!
//! Patterns are dotted names in which a segment may be the wildcard `{*}`,
//! matching any single segment (this is how map levels are expressed).
//!
//! Matching prefers a literal child over the wildcard child at every level and
//! never backtracks: once a literal branch is taken, a dead end further down is
//! "no match" even if the wildcard sibling would have matched. Schemas that mix
//! map wildcards and literal sub-keys rely on this.

use std::collections::BTreeMap;

use crate::error::BindError;
use crate::name::NameIterator;

/// The wildcard pattern segment.
pub const WILDCARD: &str = "{*}";

#[derive(Debug, Clone)]
pub struct PatternMap<T> {
    matched: Option<T>,
    children: BTreeMap<String, PatternMap<T>>,
    wildcard: Option<Box<PatternMap<T>>>,
}

impl<T> Default for PatternMap<T> {
    fn default() -> Self {
        Self {
            matched: None,
            children: BTreeMap::new(),
            wildcard: None,
        }
    }
}

impl<T> PatternMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `value` with `pattern`.
    ///
    /// Fails with [`BindError::DuplicatePattern`] if the exact pattern is
    /// already bound; the map is left unchanged in that case.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), BindError> {
        let mut node = self;
        for segment in NameIterator::new(pattern) {
            node = if segment == WILDCARD {
                node.wildcard.get_or_insert_with(Box::default).as_mut()
            } else {
                node.children.entry(segment.to_string()).or_default()
            };
        }
        if node.matched.is_some() {
            return Err(BindError::DuplicatePattern {
                pattern: pattern.to_string(),
            });
        }
        node.matched = Some(value);
        Ok(())
    }

    /// Whether the exact pattern is already bound.
    pub fn contains(&self, pattern: &str) -> bool {
        let mut node = self;
        for segment in NameIterator::new(pattern) {
            let next = if segment == WILDCARD {
                node.wildcard.as_deref()
            } else {
                node.children.get(segment)
            };
            match next {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.matched.is_some()
    }

    /// Match the segments remaining in `name` against the trie.
    ///
    /// `name` itself is not advanced; the caller decides what to consume.
    pub fn match_name(&self, name: &NameIterator<'_>) -> Option<&T> {
        let mut node = self;
        for segment in name.remaining_segments() {
            node = match node.children.get(segment) {
                Some(literal) => literal,
                None => node.wildcard.as_deref()?,
            };
        }
        node.matched.as_ref()
    }

    /// Value bound at this exact node, if any.
    pub fn matched(&self) -> Option<&T> {
        self.matched.as_ref()
    }

    /// Names of the direct children; the wildcard child is listed as `{*}`.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children
            .keys()
            .map(String::as_str)
            .chain(self.wildcard.as_ref().map(|_| WILDCARD))
    }

    pub fn child(&self, name: &str) -> Option<&PatternMap<T>> {
        if name == WILDCARD {
            self.wildcard.as_deref()
        } else {
            self.children.get(name)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_none() && self.children.is_empty() && self.wildcard.is_none()
    }

    /// Visit every bound value with its full pattern, literal children first.
    pub fn for_each<'s>(&'s self, mut visit: impl FnMut(&str, &'s T)) {
        fn walk<'s, T>(map: &'s PatternMap<T>, prefix: &str, visit: &mut impl FnMut(&str, &'s T)) {
            if let Some(value) = map.matched() {
                visit(prefix, value);
            }
            for name in map.child_names() {
                if let Some(child) = map.child(name) {
                    let key = if prefix.is_empty() {
                        name.to_string()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    walk(child, &key, visit);
                }
            }
        }
        walk(self, "", &mut visit);
    }
}
