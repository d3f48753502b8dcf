//! LFS pointer file format.
//!
//! A pointer is the small text record committed in place of content that
//! lives in LFS storage:
//!
//! ```text
//! version https://git-lfs.github.com/spec/v1
//! oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393
//! size 12345
//! ```

use sha2::{Digest, Sha256};
use std::fmt;

/// LFS specification version.
pub const LFS_SPEC_V1: &str = "https://git-lfs.github.com/spec/v1";

/// Pre-release version URL, still found in old repositories.
pub const HAWSER_SPEC_V1: &str = "https://hawser.github.com/spec/v1";

/// Version URL written by git-media, which git-lfs still reads.
pub const GIT_MEDIA_V2: &str = "http://git-media.io/v/2";

const VERSIONS: [&str; 3] = [LFS_SPEC_V1, HAWSER_SPEC_V1, GIT_MEDIA_V2];

/// Reason a buffer could not be parsed as a pointer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("pointer is not valid UTF-8")]
    NotUtf8,

    #[error("empty pointer")]
    Empty,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("malformed line: {0:?}")]
    MalformedLine(String),

    #[error("expected key '{expected}', got '{found}'")]
    UnexpectedKey { expected: &'static str, found: String },

    #[error("unexpected line after size: {0:?}")]
    TrailingLine(String),

    #[error("invalid oid: {0}")]
    InvalidOid(String),

    #[error("invalid size: {0:?}")]
    InvalidSize(String),

    #[error("missing {0}")]
    Missing(&'static str),
}

/// LFS Object ID - a SHA256 hash of the file content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    bytes: [u8; 32],
}

impl Oid {
    /// Parse an OID from 64 lowercase hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, ParseError> {
        if hex.len() != 64 {
            return Err(ParseError::InvalidOid(format!(
                "expected 64 hex chars, got {}",
                hex.len()
            )));
        }
        if hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(ParseError::InvalidOid("oid must be lowercase hex".into()));
        }

        let bytes = hex::decode(hex).map_err(|e| ParseError::InvalidOid(e.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Oid { bytes: arr })
    }

    /// Compute the OID (SHA256 hash) of content.
    pub fn from_content(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Oid { bytes }
    }

    /// Get the OID as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.to_hex())
    }
}

/// A parsed LFS pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    oid: Oid,
    size: u64,
    extensions: Vec<(String, String)>,
}

impl Pointer {
    /// Create a pointer from file content.
    pub fn from_content(content: &[u8]) -> Self {
        Pointer {
            oid: Oid::from_content(content),
            size: content.len() as u64,
            extensions: Vec::new(),
        }
    }

    /// Parse a pointer from its text representation.
    ///
    /// Keys come in a fixed order: `version`, any `ext-<n>-<name>` lines,
    /// `oid`, then `size`. Each line is exactly `key value`; blank lines are
    /// skipped, nothing else is.
    pub fn parse(content: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(content).map_err(|_| ParseError::NotUtf8)?;
        let mut lines = text.lines().filter(|l| !l.is_empty());

        let (key, version) = next_line(&mut lines).ok_or(ParseError::Empty)??;
        expect_key("version", key)?;
        if !VERSIONS.contains(&version) {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        let mut extensions = Vec::new();
        let oid = loop {
            let (key, value) = next_line(&mut lines).ok_or(ParseError::Missing("oid"))??;
            if is_extension_key(key) {
                extensions.push((key.to_string(), value.to_string()));
                continue;
            }
            expect_key("oid", key)?;
            let hex = value
                .strip_prefix("sha256:")
                .ok_or_else(|| ParseError::InvalidOid(format!("unsupported oid type: {}", value)))?;
            break Oid::from_hex(hex)?;
        };

        let (key, value) = next_line(&mut lines).ok_or(ParseError::Missing("size"))??;
        expect_key("size", key)?;
        let size = value
            .parse()
            .map_err(|_| ParseError::InvalidSize(value.to_string()))?;

        if let Some(line) = lines.next() {
            return Err(ParseError::TrailingLine(line.to_string()));
        }

        Ok(Pointer {
            oid,
            size,
            extensions,
        })
    }

    /// Get the OID of this pointer.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Get the size of the file the pointer stands for.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Extension lines in the order they appeared.
    pub fn extensions(&self) -> &[(String, String)] {
        &self.extensions
    }

    /// Encode the pointer to its text representation.
    pub fn encode(&self) -> String {
        let mut out = format!("version {}\n", LFS_SPEC_V1);
        for (key, value) in &self.extensions {
            out.push_str(&format!("{} {}\n", key, value));
        }
        out.push_str(&format!("oid sha256:{}\nsize {}\n", self.oid.to_hex(), self.size));
        out
    }
}

/// Split the next line into `key value`.
fn next_line<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
) -> Option<Result<(&'a str, &'a str), ParseError>> {
    lines.next().map(|line| match line.split_once(' ') {
        Some((key, value))
            if !key.is_empty() && !value.is_empty() && !value.starts_with(' ') =>
        {
            Ok((key, value))
        }
        _ => Err(ParseError::MalformedLine(line.to_string())),
    })
}

fn expect_key(expected: &'static str, found: &str) -> Result<(), ParseError> {
    if found == expected {
        Ok(())
    } else {
        Err(ParseError::UnexpectedKey {
            expected,
            found: found.to_string(),
        })
    }
}

/// `ext-<priority>-<name>`, e.g. `ext-0-foo`.
fn is_extension_key(key: &str) -> bool {
    key.strip_prefix("ext-")
        .and_then(|rest| rest.split_once('-'))
        .is_some_and(|(priority, name)| {
            !priority.is_empty()
                && priority.bytes().all(|b| b.is_ascii_digit())
                && !name.is_empty()
                && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &[u8] = b"version https://git-lfs.github.com/spec/v1\n\
        oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
        size 12345\n";

    #[test]
    fn test_pointer_from_content() {
        let pointer = Pointer::from_content(b"Hello, World!");
        assert_eq!(pointer.size(), 13);
        assert_eq!(
            pointer.oid().to_hex(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_pointer_encode_matches_git_lfs() {
        let expected = "version https://git-lfs.github.com/spec/v1\n\
                        oid sha256:dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f\n\
                        size 13\n";
        assert_eq!(Pointer::from_content(b"Hello, World!").encode(), expected);
    }

    #[test]
    fn test_pointer_parse_valid() {
        let pointer = Pointer::parse(VALID).unwrap();
        assert_eq!(pointer.size(), 12345);
        assert_eq!(
            pointer.oid().to_hex(),
            "4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393"
        );
    }

    #[test]
    fn test_pointer_parse_crlf_and_hawser() {
        let text = "version https://hawser.github.com/spec/v1\r\n\
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\r\n\
                    size 100\r\n";
        assert_eq!(Pointer::parse(text.as_bytes()).unwrap().size(), 100);
    }

    #[test]
    fn test_pointer_parse_extensions() {
        let text = "version https://git-lfs.github.com/spec/v1\n\
                    ext-0-foo sha256:0000000000000000000000000000000000000000000000000000000000000000\n\
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                    size 7\n";
        let pointer = Pointer::parse(text.as_bytes()).unwrap();
        assert_eq!(pointer.extensions().len(), 1);
        assert_eq!(pointer.extensions()[0].0, "ext-0-foo");
    }

    #[test]
    fn test_pointer_parse_invalid() {
        // Not a pointer
        assert!(Pointer::parse(b"a bad lfs pointer").is_err());
        assert!(Pointer::parse(b"").is_err());
        assert!(Pointer::parse(&[0xff, 0xfe, 0x00, 0x01]).is_err());

        // Missing oid
        assert!(Pointer::parse(b"version https://git-lfs.github.com/spec/v1\nsize 123\n").is_err());

        // Short oid
        assert!(
            Pointer::parse(b"version https://git-lfs.github.com/spec/v1\noid sha256:abc\nsize 1\n")
                .is_err()
        );

        // Version not first
        let text = "oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                    version https://git-lfs.github.com/spec/v1\n\
                    size 1\n";
        assert!(Pointer::parse(text.as_bytes()).is_err());

        // Unknown version
        let text = "version https://example.com/spec/v9\n\
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                    size 1\n";
        assert!(Pointer::parse(text.as_bytes()).is_err());

        // Negative size
        let text = "version https://git-lfs.github.com/spec/v1\n\
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                    size -1\n";
        assert!(Pointer::parse(text.as_bytes()).is_err());
    }

    #[test]
    fn test_pointer_parse_rejects_duplicates_and_unknown_keys() {
        let dup = "version https://git-lfs.github.com/spec/v1\n\
                   oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                   size 1\n\
                   size 2\n";
        assert!(Pointer::parse(dup.as_bytes()).is_err());

        let unknown = "version https://git-lfs.github.com/spec/v1\n\
                       oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                       color blue\n\
                       size 1\n";
        assert!(Pointer::parse(unknown.as_bytes()).is_err());
    }

    #[test]
    fn test_pointer_parse_enforces_key_order() {
        let size_first = "version https://git-lfs.github.com/spec/v1\n\
                          size 12345\n\
                          oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n";
        assert_eq!(
            Pointer::parse(size_first.as_bytes()),
            Err(ParseError::UnexpectedKey {
                expected: "oid",
                found: "size".into()
            })
        );

        let ext_after_oid = "version https://git-lfs.github.com/spec/v1\n\
                             oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                             ext-0-foo sha256:0000000000000000000000000000000000000000000000000000000000000000\n\
                             size 7\n";
        assert!(Pointer::parse(ext_after_oid.as_bytes()).is_err());

        let trailing = format!("{}extra line\n", std::str::from_utf8(VALID).unwrap());
        assert!(matches!(
            Pointer::parse(trailing.as_bytes()),
            Err(ParseError::TrailingLine(_))
        ));
    }

    #[test]
    fn test_pointer_parse_rejects_indented_keys() {
        let text = "version https://git-lfs.github.com/spec/v1\n  \
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n  \
                    size 1\n";
        assert!(text.contains("\n  oid"));
        assert!(matches!(
            Pointer::parse(text.as_bytes()),
            Err(ParseError::MalformedLine(_))
        ));

        let double_space = "version https://git-lfs.github.com/spec/v1\n\
                            oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                            size  1\n";
        assert!(Pointer::parse(double_space.as_bytes()).is_err());
    }

    #[test]
    fn test_pointer_parse_git_media_alias() {
        let text = "version http://git-media.io/v/2\n\
                    oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                    size 12345\n";
        assert_eq!(Pointer::parse(text.as_bytes()).unwrap().size(), 12345);
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(Pointer::parse(b"").unwrap_err().to_string(), "empty pointer");
        assert_eq!(
            Pointer::parse(b"version https://git-lfs.github.com/spec/v1\n")
                .unwrap_err()
                .to_string(),
            "missing oid"
        );
    }

    #[test]
    fn test_oid_rejects_uppercase() {
        assert!(Oid::from_hex("4D7A214614AB2935C943F9E0FF69D22EADBB8F32B1258DAAA5E2CA24D17E2393").is_err());
        assert!(Oid::from_hex("not valid hex").is_err());
    }
}
