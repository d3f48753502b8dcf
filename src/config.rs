//! Per-repository policy read from `.github/watchdog.yml`.
//!
//! ```yaml
//! # Contact used in violation comments
//! helpContact: "#tech-git"
//!
//! # Suggest LFS for files larger than the threshold in bytes
//! lfsSuggestionsEnabled: true
//! lfsSizeThreshold: 512000
//!
//! # Files checked against lfsSizeExemptionsThreshold instead
//! lfsSizeExemptions: |
//!   Regression/CrsTestSuite.txt
//!   *.xml
//! lfsSizeExemptionsThreshold: 20000000
//!
//! # Report a commit status in addition to comments
//! lfsStatusEnabled: false
//! ```

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::pathfilter::PathFilter;
use crate::store::ContentStore;

/// Repository path of the policy file.
pub const CONFIG_FILE: &str = ".github/watchdog.yml";

pub const DEFAULT_HELP_CONTACT: &str = "your Git administrators";
pub const DEFAULT_SIZE_THRESHOLD: u64 = 512_000;
pub const DEFAULT_EXEMPTIONS_THRESHOLD: u64 = 20_000_000;

/// Policy applied to one commit.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Who to contact for help, shown in notices.
    pub help_contact: String,
    /// Whether large non-LFS files are reported at all.
    pub suggestions_enabled: bool,
    /// Files larger than this many bytes are LFS candidates.
    pub size_threshold: u64,
    /// Paths checked against `exemptions_threshold` instead.
    pub exemptions: PathFilter,
    /// Threshold for exempt paths. Not clamped to `size_threshold`: a lower
    /// value makes exempt paths stricter.
    pub exemptions_threshold: u64,
    /// Whether to set a commit status.
    pub status_enabled: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            help_contact: DEFAULT_HELP_CONTACT.to_string(),
            suggestions_enabled: true,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            exemptions: PathFilter::default(),
            exemptions_threshold: DEFAULT_EXEMPTIONS_THRESHOLD,
            status_enabled: false,
        }
    }
}

/// On-disk shape of the policy file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_help_contact")]
    help_contact: String,
    #[serde(default = "default_true", deserialize_with = "yaml_bool")]
    lfs_suggestions_enabled: bool,
    #[serde(default = "default_size_threshold")]
    lfs_size_threshold: u64,
    #[serde(default)]
    lfs_size_exemptions: String,
    #[serde(default = "default_exemptions_threshold")]
    lfs_size_exemptions_threshold: u64,
    #[serde(default, deserialize_with = "yaml_bool")]
    lfs_status_enabled: bool,
}

fn default_help_contact() -> String {
    DEFAULT_HELP_CONTACT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_size_threshold() -> u64 {
    DEFAULT_SIZE_THRESHOLD
}

fn default_exemptions_threshold() -> u64 {
    DEFAULT_EXEMPTIONS_THRESHOLD
}

/// Accept YAML 1.1 boolean words (`yes`, `off`, ...) next to real booleans.
fn yaml_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrWord {
        Bool(bool),
        Word(String),
    }

    match BoolOrWord::deserialize(deserializer)? {
        BoolOrWord::Bool(b) => Ok(b),
        BoolOrWord::Word(w) => match w.to_ascii_lowercase().as_str() {
            "yes" | "y" | "on" | "true" => Ok(true),
            "no" | "n" | "off" | "false" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("invalid boolean: {:?}", w))),
        },
    }
}

impl PolicyConfig {
    /// Parse policy YAML. Unknown keys are rejected so typos surface.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // A document without content deserializes to unit, not to a mapping.
        let blank = text.lines().map(str::trim).all(|l| l.is_empty() || l.starts_with('#'));
        if blank {
            return Ok(PolicyConfig::default());
        }

        let raw: RawConfig = serde_yaml::from_str(text)?;
        Ok(PolicyConfig {
            help_contact: raw.help_contact,
            suggestions_enabled: raw.lfs_suggestions_enabled,
            size_threshold: raw.lfs_size_threshold,
            exemptions: PathFilter::from_whitespace(&raw.lfs_size_exemptions),
            exemptions_threshold: raw.lfs_size_exemptions_threshold,
            status_enabled: raw.lfs_status_enabled,
        })
    }

    /// Load the policy at `rev`.
    ///
    /// Always yields a usable config: on any failure the defaults are
    /// returned together with the error, so the caller can report it.
    pub fn load<S: ContentStore + ?Sized>(store: &S, rev: &str) -> (Self, Option<ConfigError>) {
        let loaded = store
            .file_content(rev, CONFIG_FILE)
            .map_err(ConfigError::Fetch)
            .and_then(|content| Self::from_yaml(&String::from_utf8_lossy(&content)));

        match loaded {
            Ok(config) => (config, None),
            Err(e) => (PolicyConfig::default(), Some(e)),
        }
    }

    /// Threshold that applies to `path`.
    pub fn threshold_for(&self, path: &str) -> u64 {
        if self.exemptions.allows(path) {
            self.exemptions_threshold
        } else {
            self.size_threshold
        }
    }

    /// Whether a non-LFS file of `size` bytes at `path` should be suggested
    /// for LFS tracking.
    pub fn suggests_lfs(&self, path: &str, size: u64) -> bool {
        self.suggestions_enabled && size > self.threshold_for(path)
    }
}
