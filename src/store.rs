//! Read-only repository access by ref.

use std::fmt;

use serde::Deserialize;

use crate::Result;

/// Type of an entry in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Symlink,
    Dir,
    Submodule,
    #[serde(other)]
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::File => "file",
            EntryKind::Symlink => "symlink",
            EntryKind::Dir => "dir",
            EntryKind::Submodule => "submodule",
            EntryKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryEntry {
    /// Repository-relative path of the entry.
    pub path: String,
    /// Base name of the entry.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
}

impl DirectoryEntry {
    /// Create a regular file entry.
    pub fn file(path: &str, size: u64) -> Self {
        DirectoryEntry::new(path, EntryKind::File, size)
    }

    /// Create an entry of any kind.
    pub fn new(path: &str, kind: EntryKind, size: u64) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        DirectoryEntry {
            path: path.to_string(),
            name,
            kind,
            size,
        }
    }
}

/// The immediate entries of a directory.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<DirectoryEntry>,
    /// Set when the platform's result-count ceiling was reached and the
    /// listing may be missing entries.
    pub truncated: bool,
}

/// Read-only access to repository content at a given ref.
///
/// Implementations are shared between concurrently checked commits, so they
/// must be safe to call from several threads.
pub trait ContentStore: Send + Sync {
    /// Fetch the raw content of a file.
    ///
    /// A missing file is reported as [`crate::Error::NotFound`], distinct
    /// from transport failures.
    fn file_content(&self, rev: &str, path: &str) -> Result<Vec<u8>>;

    /// List a directory's immediate entries. `dir` is empty for the
    /// repository root.
    fn list_directory(&self, rev: &str, dir: &str) -> Result<Listing>;
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn file_content(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        (**self).file_content(rev, path)
    }

    fn list_directory(&self, rev: &str, dir: &str) -> Result<Listing> {
        (**self).list_directory(rev, dir)
    }
}

/// Parent directory of a repository path, `""` for top-level files.
pub fn parent_dir(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}
