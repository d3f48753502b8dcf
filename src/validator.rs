//! Checks that an LFS-declared file was committed as a pointer.

use crate::error::ValidationError;
use crate::store::ContentStore;
use crate::Pointer;

/// Smallest size a well-formed pointer file can have.
pub const POINTER_MIN_SIZE: u64 = 20;

/// Largest size we expect of a pointer file.
/// c.f. https://github.com/git-lfs/git-lfs/blob/main/lfs/scanner.go
pub const POINTER_MAX_SIZE: u64 = 150;

/// Validate that `path` at `rev` holds a pointer, given its known size.
///
/// Sizes outside `[POINTER_MIN_SIZE, POINTER_MAX_SIZE]` fail without
/// fetching any content.
pub fn validate_pointer<S: ContentStore + ?Sized>(
    store: &S,
    rev: &str,
    path: &str,
    size: u64,
) -> Result<Pointer, ValidationError> {
    if !(POINTER_MIN_SIZE..=POINTER_MAX_SIZE).contains(&size) {
        return Err(ValidationError::InvalidStructure(format!(
            "{} bytes is outside the pointer size range {}..={}",
            size, POINTER_MIN_SIZE, POINTER_MAX_SIZE
        )));
    }

    let content = store
        .file_content(rev, path)
        .map_err(ValidationError::Fetch)?;

    Pointer::parse(&content).map_err(|e| ValidationError::InvalidStructure(e.to_string()))
}
