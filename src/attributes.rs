//! LFS path declarations from `.gitattributes`.

use tracing::debug;

use crate::pathfilter::PathFilter;
use crate::store::ContentStore;
use crate::{Error, Result};

/// Repository path of the attributes file.
pub const ATTRIBUTES_FILE: &str = ".gitattributes";

/// Paths declared with `filter=lfs` in `.gitattributes`.
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    paths: PathFilter,
}

impl AttributeFilter {
    /// Collect every `filter=lfs` pattern from attributes text.
    ///
    /// Returns `None` when no line declares an LFS path, which callers must
    /// treat differently from a filter that matches nothing.
    pub fn parse(text: &str) -> Option<Self> {
        // str::lines strips both "\n" and "\r\n".
        let patterns: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| line.contains("filter=lfs"))
            .filter_map(|line| line.split_whitespace().next())
            .collect();

        if patterns.is_empty() {
            return None;
        }

        Some(AttributeFilter {
            paths: PathFilter::new(patterns),
        })
    }

    /// Fetch and parse `.gitattributes` at `rev`.
    ///
    /// A repository without the file has no LFS declarations, which is not
    /// an error.
    pub fn load<S: ContentStore + ?Sized>(store: &S, rev: &str) -> Result<Option<Self>> {
        let content = match store.file_content(rev, ATTRIBUTES_FILE) {
            Ok(content) => content,
            Err(Error::NotFound(_)) => {
                debug!(rev, "no {} found", ATTRIBUTES_FILE);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(Self::parse(&String::from_utf8_lossy(&content)))
    }

    /// Check if a path is declared for LFS tracking.
    pub fn is_tracked(&self, path: &str) -> bool {
        self.paths.allows(path)
    }

    /// Number of declared patterns.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
