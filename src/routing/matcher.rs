//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns such as `/api/books/{id}`
//! - Match a concrete request path against a pattern, segment by segment
//! - Rank matches so static segments beat parameters, leftmost first
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A `{name}` segment matches exactly one non-empty segment
//! - No regex and no catch-all segments
//! - A trailing slash is a distinct path (`/api/books/` is not `/api/books`)

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param,
}

/// Ordering of successful matches against the same path.
///
/// One flag per segment, `true` for static. Compared lexicographically, so at
/// the first position where two patterns differ the static segment wins:
/// `/a/b/{y}` outranks `/a/{x}/c`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchRank(Vec<bool>);

impl MatchRank {
    pub fn static_segments(&self) -> usize {
        self.0.iter().filter(|is_static| **is_static).count()
    }
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw
            .split('/')
            .map(|segment| {
                if segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Static(segment.to_string())
                }
            })
            .collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a concrete path, returning its rank on success so callers can
    /// prefer `/books/search` over `/books/{id}`.
    pub fn match_path(&self, path: &str) -> Option<MatchRank> {
        let mut rank = Vec::with_capacity(self.segments.len());
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Static(expected) if expected == part => rank.push(true),
                Segment::Param if !part.is_empty() => rank.push(false),
                _ => return None,
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(MatchRank(rank))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let pattern = PathPattern::parse("/api/books");
        assert!(pattern.match_path("/api/books").is_some());
        assert!(pattern.match_path("/api/books/").is_none());
        assert!(pattern.match_path("/api/Books").is_none());
        assert!(pattern.match_path("/api").is_none());
    }

    #[test]
    fn test_param_pattern() {
        let pattern = PathPattern::parse("/api/books/{id}");
        let rank = pattern.match_path("/api/books/7").unwrap();
        assert_eq!(rank.static_segments(), 3);
        assert!(pattern.match_path("/api/books/").is_none());
        assert!(pattern.match_path("/api/books/7/extra").is_none());
    }

    #[test]
    fn test_static_ranks_above_param() {
        let search = PathPattern::parse("/api/books/search");
        let by_id = PathPattern::parse("/api/books/{id}");
        let path = "/api/books/search";
        assert!(search.match_path(path) > by_id.match_path(path));
    }

    #[test]
    fn test_leftmost_static_segment_wins_tie() {
        let late = PathPattern::parse("/a/{x}/c");
        let early = PathPattern::parse("/a/b/{y}");
        let path = "/a/b/c";

        let late = late.match_path(path).unwrap();
        let early = early.match_path(path).unwrap();
        assert_eq!(late.static_segments(), early.static_segments());
        assert!(early > late);
    }

    #[test]
    fn test_root_pattern() {
        let root = PathPattern::parse("/");
        assert!(root.match_path("/").is_some());
        assert!(root.match_path("/api").is_none());
    }
}
