//! Bounded diagnostics collector shared by the lexer and parser phases.

use crate::error::ParseError;

/// Collects diagnostics for one parse call.
///
/// Entries are kept ordered by source offset (ties keep insertion order). When a
/// limit is set only the `limit` earliest diagnostics are retained, so the list
/// always holds the first `limit` problems in the source regardless of which
/// phase reported them.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<ParseError>,
    limit: Option<usize>,
    dropped: usize,
}

impl Diagnostics {
    /// Create a collector keeping at most `limit` diagnostics (`None` = unbounded).
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            errors: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    /// Create a collector with no limit.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Record a diagnostic.
    pub fn push(&mut self, error: ParseError) {
        let offset = error.offset();
        let at = self.errors.partition_point(|e| e.offset() <= offset);

        if let Some(limit) = self.limit {
            if at >= limit {
                self.dropped += 1;
                return;
            }
        }

        self.errors.insert(at, error);

        if let Some(limit) = self.limit {
            if self.errors.len() > limit {
                self.errors.truncate(limit);
                self.dropped += 1;
            }
        }
    }

    /// Number of retained diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the limit has been reached.
    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.errors.len() >= limit)
    }

    /// Number of diagnostics discarded because of the limit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The earliest retained diagnostic.
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Iterate over retained diagnostics in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }

    /// Consume the collector, returning the retained diagnostics.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Position, Span};

    fn err_at(offset: usize, message: &str) -> ParseError {
        ParseError::syntax(message, Span::point(Position::new(1, offset + 1, offset)))
    }

    #[test]
    fn test_keeps_source_order() {
        let mut diags = Diagnostics::unbounded();
        diags.push(err_at(10, "b"));
        diags.push(err_at(2, "a"));
        diags.push(err_at(30, "c"));

        let messages: Vec<_> = diags.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut diags = Diagnostics::unbounded();
        diags.push(err_at(4, "first"));
        diags.push(err_at(4, "second"));
        assert_eq!(diags.first().unwrap().message, "first");
    }

    #[test]
    fn test_limit_keeps_earliest() {
        let mut diags = Diagnostics::new(Some(2));
        diags.push(err_at(20, "late"));
        diags.push(err_at(5, "early"));
        diags.push(err_at(10, "middle"));
        diags.push(err_at(40, "later"));

        let messages: Vec<_> = diags.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["early", "middle"]);
        assert!(diags.is_full());
        assert_eq!(diags.dropped(), 2);
    }

    #[test]
    fn test_unbounded_is_never_full() {
        let mut diags = Diagnostics::unbounded();
        for i in 0..500 {
            diags.push(err_at(i, "x"));
        }
        assert_eq!(diags.len(), 500);
        assert!(!diags.is_full());
    }
}
