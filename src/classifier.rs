//! Per-commit classification.
//!
//! For every file a commit adds or modifies, the classifier decides whether
//! the file:
//! - is declared for LFS in `.gitattributes` but was committed without a
//!   valid pointer, or
//! - is not declared for LFS but is large enough that it probably should be.
//!
//! Files are checked one after another in payload order. A lookup failure
//! only skips the file it happened on.

use tracing::{debug, error, info, warn};

use crate::attributes::AttributeFilter;
use crate::cache::CachedStore;
use crate::config::PolicyConfig;
use crate::error::{SizeError, ValidationError};
use crate::push::Commit;
use crate::report::{CommitState, Notice, Reporter};
use crate::resolver::resolve_size;
use crate::store::ContentStore;
use crate::validator::validate_pointer;

/// Classification of one file.
#[derive(Debug)]
pub enum Verdict {
    /// Nothing to report.
    Ok,
    /// Declared for LFS, but the committed content is not a pointer.
    InvalidPointer,
    /// Not declared for LFS and above the applicable size threshold.
    SizeSuggestion,
    /// The file could not be checked.
    LookupError(LookupError),
}

/// Why a file could not be classified.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error("could not validate pointer: {0}")]
    Pointer(#[source] crate::Error),
}

/// Findings of one commit, in the order files were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    pub invalid_pointers: Vec<String>,
    pub size_candidates: Vec<String>,
}

impl CommitOutcome {
    /// Fold per-file verdicts into an outcome, keeping order and
    /// duplicates.
    pub fn from_verdicts<'a, I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Verdict)>,
    {
        let mut outcome = CommitOutcome::default();
        for (path, verdict) in verdicts {
            match verdict {
                Verdict::InvalidPointer => outcome.invalid_pointers.push(path.to_string()),
                Verdict::SizeSuggestion => outcome.size_candidates.push(path.to_string()),
                Verdict::Ok | Verdict::LookupError(_) => {}
            }
        }
        outcome
    }

    pub fn is_empty(&self) -> bool {
        self.invalid_pointers.is_empty() && self.size_candidates.is_empty()
    }
}

/// Result of checking one distinct commit.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub sha: String,
    pub outcome: CommitOutcome,
    /// Whether a notice was handed to the reporter successfully.
    pub published: bool,
}

/// Checks commits of one repository.
///
/// Repository reads go through a [`CachedStore`], so files sharing a
/// directory list it once.
pub struct Classifier<S, R> {
    store: CachedStore<S>,
    reporter: R,
}

impl<S: ContentStore, R: Reporter> Classifier<S, R> {
    pub fn new(store: S, reporter: R) -> Self {
        Classifier {
            store: CachedStore::new(store),
            reporter,
        }
    }

    /// Get the underlying (uncached) store.
    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Classify one file at `rev`.
    pub fn classify_file(
        &self,
        rev: &str,
        path: &str,
        config: &PolicyConfig,
        lfs: Option<&AttributeFilter>,
    ) -> Verdict {
        let size = match resolve_size(&self.store, rev, path) {
            Ok(size) => size,
            Err(e) => return Verdict::LookupError(e.into()),
        };
        debug!(rev, path, size, "resolved size");

        if lfs.is_some_and(|filter| filter.is_tracked(path)) {
            return match validate_pointer(&self.store, rev, path, size) {
                Ok(_) => Verdict::Ok,
                Err(ValidationError::InvalidStructure(reason)) => {
                    debug!(rev, path, %reason, "invalid LFS pointer");
                    Verdict::InvalidPointer
                }
                Err(ValidationError::Fetch(e)) => Verdict::LookupError(LookupError::Pointer(e)),
            };
        }

        if config.suggests_lfs(path, size) {
            Verdict::SizeSuggestion
        } else {
            Verdict::Ok
        }
    }

    /// Classify every changed file of a commit against a loaded policy.
    pub fn classify_commit(
        &self,
        commit: &Commit,
        config: &PolicyConfig,
        lfs: Option<&AttributeFilter>,
    ) -> CommitOutcome {
        let sha = commit.id.as_str();
        let verdicts: Vec<(&str, Verdict)> = commit
            .changed_files()
            .map(|path| (path, self.classify_file(sha, path, config, lfs)))
            .collect();

        for (path, verdict) in &verdicts {
            if let Verdict::LookupError(e) = verdict {
                log_lookup_error(sha, path, e);
            }
        }

        CommitOutcome::from_verdicts(verdicts.iter().map(|(p, v)| (*p, v)))
    }

    /// Check a commit end to end: load its policy and LFS declarations,
    /// classify its files and report the findings.
    ///
    /// Returns `None` for commits that are not distinct; those were
    /// delivered by an earlier push and are never checked twice.
    pub fn check_commit(&self, commit: &Commit) -> Option<CommitReport> {
        if !commit.distinct {
            debug!(sha = %commit.id, "skipping non-distinct commit");
            return None;
        }
        let sha = commit.id.as_str();

        let (config, config_err) = PolicyConfig::load(&self.store, sha);
        if let Some(e) = config_err {
            warn!(sha, error = %e, "using default watchdog config");
        }

        let lfs = match AttributeFilter::load(&self.store, sha) {
            Ok(lfs) => lfs,
            Err(e) => {
                warn!(sha, error = %e, "could not load LFS attributes");
                None
            }
        };

        if config.status_enabled {
            self.set_status(sha, CommitState::Pending, "Checking files for Git LFS problems");
        }

        let outcome = self.classify_commit(commit, &config, lfs.as_ref());

        let mut published = false;
        if !outcome.is_empty() {
            let notice = Notice {
                invalid_pointers: &outcome.invalid_pointers,
                size_candidates: &outcome.size_candidates,
                help_contact: &config.help_contact,
                size_threshold: config.size_threshold,
            };
            match self.reporter.publish(sha, &notice) {
                Ok(()) => published = true,
                Err(e) => error!(sha, error = %e, "could not publish notice"),
            }
        }

        if config.status_enabled {
            let (state, description) = status_for(&outcome);
            self.set_status(sha, state, &description);
        }

        info!(
            sha = commit.short_id(),
            invalid_pointers = outcome.invalid_pointers.len(),
            size_candidates = outcome.size_candidates.len(),
            "checked commit"
        );

        Some(CommitReport {
            sha: commit.id.clone(),
            outcome,
            published,
        })
    }

    fn set_status(&self, sha: &str, state: CommitState, description: &str) {
        if let Err(e) = self.reporter.set_status(sha, state, description) {
            error!(sha, ?state, error = %e, "could not set commit status");
        }
    }
}

/// Invalid pointers fail the commit; size suggestions are advisory.
fn status_for(outcome: &CommitOutcome) -> (CommitState, String) {
    match (outcome.invalid_pointers.len(), outcome.size_candidates.len()) {
        (0, 0) => (CommitState::Success, "No Git LFS problems found".to_string()),
        (0, n) => (
            CommitState::Success,
            format!("{} file(s) may need to be tracked with Git LFS", n),
        ),
        (n, _) => (
            CommitState::Failure,
            format!("{} file(s) not properly added to Git LFS", n),
        ),
    }
}

fn log_lookup_error(sha: &str, path: &str, err: &LookupError) {
    match err {
        LookupError::Size(SizeError::WrongEntryKind { .. })
        | LookupError::Size(SizeError::MissingExpectedFile { .. }) => {
            error!(sha, path, error = %err, "push payload does not match repository content");
        }
        LookupError::Size(SizeError::ListingTruncated { .. }) => {
            warn!(sha, path, error = %err, "size unknown, skipping file");
        }
        LookupError::Size(SizeError::Transport(_)) | LookupError::Pointer(_) => {
            warn!(sha, path, error = %err, "lookup failed, skipping file");
        }
    }
}
