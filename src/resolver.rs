//! File size lookup through directory listings.
//!
//! The contents API reports sizes in directory listings, which is the only
//! way to learn a blob's size without downloading it. Listings stop at
//! [`LISTING_CEILING`] entries, so a lookup distinguishes three failures:
//! the file may be hidden past the ceiling, the path may not be a file, or
//! the push may reference a path the ref does not contain.

use tracing::trace;

use crate::error::SizeError;
use crate::store::{parent_dir, ContentStore, EntryKind};

/// Maximum number of entries the contents API returns for one directory.
pub const LISTING_CEILING: usize = 1000;

/// Resolve the size in bytes of `path` at `rev`.
pub fn resolve_size<S: ContentStore + ?Sized>(
    store: &S,
    rev: &str,
    path: &str,
) -> Result<u64, SizeError> {
    let listing = store.list_directory(rev, parent_dir(path))?;
    let maybe_incomplete = listing.truncated || listing.entries.len() >= LISTING_CEILING;

    if let Some(entry) = listing.entries.iter().find(|e| e.path == path) {
        return match entry.kind {
            EntryKind::File => Ok(entry.size),
            kind => Err(SizeError::WrongEntryKind {
                path: path.to_string(),
                kind,
            }),
        };
    }

    trace!(path, entries = listing.entries.len(), maybe_incomplete, "path not in listing");

    // TODO: fall back to the git trees API once a directory passes the ceiling.
    if maybe_incomplete {
        Err(SizeError::ListingTruncated {
            path: path.to_string(),
        })
    } else {
        Err(SizeError::MissingExpectedFile {
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DirectoryEntry, Listing};
    use crate::{Error, Result};

    struct DirStore {
        dir: String,
        listing: Listing,
    }

    impl ContentStore for DirStore {
        fn file_content(&self, _rev: &str, path: &str) -> Result<Vec<u8>> {
            Err(Error::NotFound(path.into()))
        }

        fn list_directory(&self, _rev: &str, dir: &str) -> Result<Listing> {
            if dir == self.dir {
                Ok(self.listing.clone())
            } else {
                Err(Error::NotFound(dir.into()))
            }
        }
    }

    fn store(dir: &str, entries: Vec<DirectoryEntry>) -> DirStore {
        DirStore {
            dir: dir.into(),
            listing: Listing {
                entries,
                truncated: false,
            },
        }
    }

    fn filler(dir: &str, count: usize) -> Vec<DirectoryEntry> {
        (0..count)
            .map(|i| DirectoryEntry::file(&format!("{}/filler{}", dir, i), 1))
            .collect()
    }

    #[test]
    fn test_file_size() {
        let s = store(
            "some/path",
            vec![
                DirectoryEntry::file("some/path/file1", 5),
                DirectoryEntry::new("some/path/file2", EntryKind::Symlink, 6),
            ],
        );
        assert_eq!(resolve_size(&s, "abc123", "some/path/file1").unwrap(), 5);
    }

    #[test]
    fn test_root_file() {
        let s = store("", vec![DirectoryEntry::file("README.md", 5362)]);
        assert_eq!(resolve_size(&s, "abc123", "README.md").unwrap(), 5362);
    }

    #[test]
    fn test_symlink_is_wrong_kind() {
        let s = store(
            "some/path",
            vec![DirectoryEntry::new("some/path/file2", EntryKind::Symlink, 6)],
        );
        match resolve_size(&s, "abc123", "some/path/file2") {
            Err(SizeError::WrongEntryKind { kind, .. }) => assert_eq!(kind, EntryKind::Symlink),
            other => panic!("expected WrongEntryKind, got {:?}", other),
        }
    }

    #[test]
    fn test_submodule_is_wrong_kind() {
        let s = store(
            "vendor",
            vec![DirectoryEntry::new("vendor/lib", EntryKind::Submodule, 0)],
        );
        assert!(matches!(
            resolve_size(&s, "abc123", "vendor/lib"),
            Err(SizeError::WrongEntryKind { .. })
        ));
    }

    #[test]
    fn test_missing_below_ceiling() {
        let s = store("big", filler("big", LISTING_CEILING - 1));
        assert!(matches!(
            resolve_size(&s, "abc123", "big/target"),
            Err(SizeError::MissingExpectedFile { .. })
        ));
    }

    #[test]
    fn test_missing_at_ceiling_is_truncated() {
        let s = store("big", filler("big", LISTING_CEILING));
        assert!(matches!(
            resolve_size(&s, "abc123", "big/target"),
            Err(SizeError::ListingTruncated { .. })
        ));
    }

    #[test]
    fn test_found_at_ceiling() {
        let mut entries = filler("big", LISTING_CEILING - 1);
        entries.push(DirectoryEntry::file("big/target", 4242));
        let s = store("big", entries);
        assert_eq!(resolve_size(&s, "abc123", "big/target").unwrap(), 4242);
    }

    #[test]
    fn test_truncated_flag_from_store() {
        let mut s = store("dir", vec![DirectoryEntry::file("dir/other", 1)]);
        s.listing.truncated = true;
        assert!(matches!(
            resolve_size(&s, "abc123", "dir/target"),
            Err(SizeError::ListingTruncated { .. })
        ));
    }

    #[test]
    fn test_listing_failure_is_transport() {
        let s = store("elsewhere", vec![]);
        assert!(matches!(
            resolve_size(&s, "abc123", "dir/target"),
            Err(SizeError::Transport(Error::NotFound(_)))
        ));
    }
}
