//! # lfs-watchdog
//!
//! Checks the files of a GitHub push for Git LFS problems.
//!
//! For every distinct commit of a push this crate:
//! - resolves the size of each added or modified file from its directory
//!   listing,
//! - verifies that files declared with `filter=lfs` in `.gitattributes` were
//!   committed as valid LFS pointers,
//! - suggests LFS for undeclared files above a configurable size threshold,
//! - reports the findings as a commit comment and, optionally, a commit
//!   status.
//!
//! Policy comes from `.github/watchdog.yml` at the commit being checked.
//! Repository reads are cached per commit sha for the life of a
//! [`Watchdog`].
//!
//! ## Example
//!
//! ```no_run
//! use lfs_watchdog::{GitHubClient, PushEvent, Watchdog};
//!
//! let payload = std::fs::read_to_string("push.json").unwrap();
//! let push = PushEvent::from_json(&payload).unwrap();
//!
//! let client = GitHubClient::for_push(&push).unwrap().with_token("your-token");
//! let watchdog = Watchdog::new(client.clone(), client);
//!
//! for report in watchdog.check(&push) {
//!     println!("{}: {:?}", report.sha, report.outcome);
//! }
//! ```

mod error;
mod pointer;

pub mod attributes;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod github;
pub mod pathfilter;
pub mod push;
pub mod report;
pub mod resolver;
pub mod store;
pub mod validator;
pub mod watchdog;

pub use attributes::AttributeFilter;
pub use cache::CachedStore;
pub use classifier::{Classifier, CommitOutcome, CommitReport, LookupError, Verdict};
pub use config::PolicyConfig;
pub use error::{ConfigError, Error, Result, SizeError, ValidationError};
pub use github::GitHubClient;
pub use pathfilter::PathFilter;
pub use pointer::{Oid, ParseError, Pointer};
pub use push::{Commit, PushEvent};
pub use report::{CommitState, LogReporter, Notice, Reporter};
pub use resolver::resolve_size;
pub use store::{ContentStore, DirectoryEntry, EntryKind, Listing};
pub use validator::validate_pointer;
pub use watchdog::Watchdog;
