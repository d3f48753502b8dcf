//! gitattributes-style path patterns.
//!
//! Patterns without a slash match any path component, so `*.psd` matches
//! `art/cover.psd` and `assets` matches everything below an `assets`
//! directory. Patterns containing a slash are anchored at the repository
//! root and match the path itself or any leading directory of it.

use glob::{MatchOptions, Pattern};
use tracing::warn;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct PathPattern {
    glob: Pattern,
    anchored: bool,
}

impl PathPattern {
    fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim_end_matches('/');
        let anchored = trimmed.contains('/');
        let source = trimmed.trim_start_matches('/');
        if source.is_empty() {
            return None;
        }

        match Pattern::new(source) {
            Ok(glob) => Some(PathPattern { glob, anchored }),
            Err(e) => {
                warn!(pattern = raw, error = %e, "skipping invalid path pattern");
                None
            }
        }
    }

    fn matches(&self, path: &str) -> bool {
        if self.anchored {
            // The full path, or one of its leading directories.
            path.match_indices('/')
                .map(|(i, _)| &path[..i])
                .chain(std::iter::once(path))
                .any(|prefix| self.glob.matches_with(prefix, MATCH_OPTIONS))
        } else {
            path.split('/')
                .any(|component| self.glob.matches_with(component, MATCH_OPTIONS))
        }
    }
}

/// A set of path patterns; a path is allowed if any pattern matches it.
///
/// An empty filter matches nothing.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<PathPattern>,
}

impl PathFilter {
    /// Compile a filter. Patterns that do not compile are skipped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PathFilter {
            patterns: patterns
                .into_iter()
                .filter_map(|p| PathPattern::new(p.as_ref()))
                .collect(),
        }
    }

    /// Build a filter from whitespace-separated patterns.
    pub fn from_whitespace(text: &str) -> Self {
        PathFilter::new(text.split_whitespace())
    }

    /// Check whether any pattern matches the repository-relative `path`.
    pub fn allows(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
