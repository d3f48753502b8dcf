//! Publishing findings back to the code host.

use serde::Serialize;
use tracing::info;

use crate::Result;

const LFS_LINK: &str = "[Git LFS](https://git-lfs.github.com/)";
const TUTORIAL_LINK: &str = "[Git LFS tutorial](https://www.youtube.com/watch?v=YQzNfb4IwEY)";

/// Findings for one commit, ready to be published.
#[derive(Debug, Clone, Copy)]
pub struct Notice<'a> {
    pub invalid_pointers: &'a [String],
    pub size_candidates: &'a [String],
    pub help_contact: &'a str,
    /// Base size threshold in bytes.
    pub size_threshold: u64,
}

impl Notice<'_> {
    /// Size threshold as shown to humans.
    pub fn size_threshold_kb(&self) -> u64 {
        self.size_threshold / 1024
    }

    pub fn is_empty(&self) -> bool {
        self.invalid_pointers.is_empty() && self.size_candidates.is_empty()
    }

    /// Render the notice as a markdown commit comment.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.size_candidates.is_empty() {
            out.push_str(&format!(
                "**:warning: The following files are larger than {}KB and may need to be tracked with {}:**",
                self.size_threshold_kb(),
                LFS_LINK
            ));
            push_list(&mut out, self.size_candidates);
        }

        if !self.invalid_pointers.is_empty() {
            out.push_str(&format!(
                "**:warning: The following files have not been properly added to {}:**",
                LFS_LINK
            ));
            push_list(&mut out, self.invalid_pointers);
        }

        out.push_str(&format!(
            "> Watch the {} or contact {} for help.",
            TUTORIAL_LINK, self.help_contact
        ));
        out
    }
}

fn push_list(out: &mut String, paths: &[String]) {
    for path in paths {
        out.push_str(&format!("\n- {}", path));
    }
    out.push_str("\n\n");
}

/// Tri-state commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

/// Destination for commit findings.
pub trait Reporter: Send + Sync {
    /// Post a notice on commit `sha`.
    fn publish(&self, sha: &str, notice: &Notice<'_>) -> Result<()>;

    /// Set the watchdog status of commit `sha`.
    fn set_status(&self, sha: &str, state: CommitState, description: &str) -> Result<()>;
}

/// Logs findings instead of posting them. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn publish(&self, sha: &str, notice: &Notice<'_>) -> Result<()> {
        for path in notice.invalid_pointers {
            info!(sha, path = path.as_str(), "invalid pointer");
        }
        for path in notice.size_candidates {
            info!(sha, path = path.as_str(), "LFS candidate");
        }
        Ok(())
    }

    fn set_status(&self, sha: &str, state: CommitState, description: &str) -> Result<()> {
        info!(sha, ?state, description, "commit status");
        Ok(())
    }
}
