//! Push-level entry point.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::classifier::{Classifier, CommitReport};
use crate::push::{Commit, PushEvent};
use crate::report::Reporter;
use crate::store::ContentStore;

/// Default number of commits checked at the same time per push.
pub const DEFAULT_MAX_CONCURRENT_COMMITS: usize = 4;

/// Checks every distinct commit of a push.
///
/// Commits are independent units of work and run on a thread pool capped at
/// `max_concurrent_commits`, so a push with many commits cannot flood the
/// API with parallel requests.
pub struct Watchdog<S, R> {
    classifier: Classifier<S, R>,
    max_concurrent_commits: usize,
}

impl<S: ContentStore, R: Reporter> Watchdog<S, R> {
    pub fn new(store: S, reporter: R) -> Self {
        Watchdog {
            classifier: Classifier::new(store, reporter),
            max_concurrent_commits: DEFAULT_MAX_CONCURRENT_COMMITS,
        }
    }

    /// Limit the number of commits checked at the same time (at least 1).
    pub fn with_max_concurrent_commits(mut self, max: usize) -> Self {
        self.max_concurrent_commits = max.max(1);
        self
    }

    pub fn classifier(&self) -> &Classifier<S, R> {
        &self.classifier
    }

    /// Check all distinct commits of a push and wait for them to finish.
    ///
    /// Reports come back in no particular order.
    pub fn check(&self, push: &PushEvent) -> Vec<CommitReport> {
        let commits: Vec<&Commit> = push.distinct_commits().collect();
        info!(
            repo = %push.repository.full_name,
            git_ref = %push.git_ref,
            commits = push.commits.len(),
            distinct = commits.len(),
            "checking push"
        );

        if commits.is_empty() {
            return Vec::new();
        }

        let threads = self.max_concurrent_commits.min(commits.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("watchdog-{}", i))
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                commits
                    .par_iter()
                    .filter_map(|commit| self.classifier.check_commit(commit))
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "could not start worker pool, checking commits sequentially");
                commits
                    .iter()
                    .filter_map(|commit| self.classifier.check_commit(commit))
                    .collect()
            }
        }
    }
}
