//! Error types for lfs-watchdog operations.

use thiserror::Error;

use crate::store::EntryKind;

/// Result type for lfs-watchdog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to GitHub or decoding its responses.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server returned an error
    #[error("GitHub API error: {message} (code: {code})")]
    ServerError { code: u16, message: String },

    /// File or directory not found at the requested ref
    #[error("not found: {0}")]
    NotFound(String),

    /// Authentication required
    #[error("authentication required")]
    AuthRequired,

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The API answered with a shape we did not ask for
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Base64 content could not be decoded
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => Error::AuthRequired,
            ureq::Error::Status(404, response) => Error::NotFound(response.get_url().to_string()),
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "unknown error".into());
                Error::ServerError { code, message }
            }
            other => Error::Http(other.to_string()),
        }
    }
}

/// Why a file's size could not be resolved from its directory listing.
#[derive(Error, Debug)]
pub enum SizeError {
    /// The listing hit the API ceiling and the file was not among the
    /// returned entries. The file may still exist.
    #[error("'{path}' not in the first {max} entries of its directory", max = crate::resolver::LISTING_CEILING)]
    ListingTruncated { path: String },

    /// The path exists but is not a regular file.
    #[error("name '{path}' matches, but object is a {kind}")]
    WrongEntryKind { path: String, kind: EntryKind },

    /// The push referenced a path its directory listing does not contain.
    #[error("'{path}' is referenced by the push but missing from its directory listing")]
    MissingExpectedFile { path: String },

    /// Listing the directory failed.
    #[error(transparent)]
    Transport(#[from] Error),
}

/// Outcome of a failed pointer validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The file is not a well-formed LFS pointer.
    #[error("LFS pointer size or structure is incorrect: {0}")]
    InvalidStructure(String),

    /// The content could not be fetched, so validity is unknown.
    #[error("could not fetch pointer content: {0}")]
    Fetch(#[source] Error),
}

/// Failure to load `.github/watchdog.yml`. Defaults still apply.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not fetch watchdog config: {0}")]
    Fetch(#[source] Error),

    #[error("could not parse watchdog config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_error_messages() {
        let err = SizeError::WrongEntryKind {
            path: "some/path/file2".into(),
            kind: EntryKind::Symlink,
        };
        assert_eq!(
            err.to_string(),
            "name 'some/path/file2' matches, but object is a symlink"
        );

        let err = SizeError::ListingTruncated { path: "big/dir/x".into() };
        assert!(err.to_string().contains("first 1000 entries"));
    }

    #[test]
    fn test_transport_is_transparent() {
        let err = SizeError::from(Error::AuthRequired);
        assert_eq!(err.to_string(), "authentication required");
    }
}
