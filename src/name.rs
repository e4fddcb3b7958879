//! Segment-wise access to dotted property names.
//!
//! `app.server.threads` is three segments. A segment that starts with `"`
//! runs to the closing quote, so map keys may contain dots:
//! `app.server.regions."eu.west".label` has `eu.west` as its fourth segment.
//! Segments are always handed out unquoted.

use std::fmt;
use std::ops::Range;

/// A cursor over the segments of a dotted name.
///
/// The cursor sits *between* segments: [`next_segment`](Self::next_segment)
/// peeks at the segment after it, [`Iterator::next`] consumes that segment,
/// and [`previous`](Self::previous) steps back over the last consumed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIterator<'a> {
    name: &'a str,
    bounds: Vec<Range<usize>>,
    index: usize,
}

impl<'a> NameIterator<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            bounds: segment_bounds(name),
            index: 0,
        }
    }

    /// The full name, independent of the cursor.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn has_next(&self) -> bool {
        self.index < self.bounds.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Peek at the next segment without consuming it.
    pub fn next_segment(&self) -> Option<&'a str> {
        self.segment(self.index)
    }

    pub fn next_segment_equals(&self, expected: &str) -> bool {
        self.next_segment() == Some(expected)
    }

    /// Step back over the most recently consumed segment.
    pub fn previous(&mut self) -> Option<&'a str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.segment(self.index)
    }

    pub fn go_to_end(&mut self) {
        self.index = self.bounds.len();
    }

    pub fn go_to_start(&mut self) {
        self.index = 0;
    }

    /// Number of segments consumed so far.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn segment_count(&self) -> usize {
        self.bounds.len()
    }

    /// The unquoted segment at absolute index `index`, regardless of the cursor.
    pub fn segment(&self, index: usize) -> Option<&'a str> {
        self.bounds
            .get(index)
            .map(|range| unquote(&self.name[range.clone()]))
    }

    /// The raw text of all consumed segments, dots included.
    pub fn consumed(&self) -> &'a str {
        match self.index {
            0 => "",
            n => &self.name[..self.bounds[n - 1].end],
        }
    }

    /// The segments not yet consumed, unquoted.
    pub fn remaining_segments(&self) -> impl Iterator<Item = &'a str> + '_ {
        (self.index..self.bounds.len()).filter_map(|i| self.segment(i))
    }
}

impl<'a> Iterator for NameIterator<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let segment = self.next_segment()?;
        self.index += 1;
        Some(segment)
    }
}

impl fmt::Display for NameIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Quote `key` if it could not otherwise be read back as a single segment.
pub fn quote_segment(key: &str) -> String {
    if key.contains('.') || key.starts_with('"') {
        format!("\"{key}\"")
    } else {
        key.to_string()
    }
}

/// Join already-unquoted segments into a dotted name, quoting where needed.
pub fn join_segments<'s>(segments: impl IntoIterator<Item = &'s str>) -> String {
    segments
        .into_iter()
        .map(quote_segment)
        .collect::<Vec<_>>()
        .join(".")
}

fn segment_bounds(name: &str) -> Vec<Range<usize>> {
    let bytes = name.as_bytes();
    let mut bounds = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        let end = if bytes[start] == b'"' {
            // An unterminated quote swallows the rest of the name.
            match name[start + 1..].find('"') {
                Some(offset) => {
                    let close = start + 1 + offset + 1;
                    match name[close..].find('.') {
                        Some(dot) => close + dot,
                        None => bytes.len(),
                    }
                }
                None => bytes.len(),
            }
        } else {
            match name[start..].find('.') {
                Some(dot) => start + dot,
                None => bytes.len(),
            }
        };
        bounds.push(start..end);
        start = end + 1;
    }

    bounds
}

fn unquote(raw: &str) -> &str {
    match raw.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => raw,
    }
}
