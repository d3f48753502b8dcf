//! GitHub push webhook payload.
//!
//! Only the fields the watchdog reads are modelled; everything else in the
//! payload is ignored.
//! See: https://docs.github.com/en/webhooks/webhook-events-and-payloads#push

use std::io::Read;

use serde::Deserialize;

use crate::{Error, Result};

/// A push event.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// The pushed ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    /// Head sha after the push.
    #[serde(default)]
    pub after: String,
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

/// Repository the push went to.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Web URL of the repository, used to find the API endpoint.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
}

/// One commit of a push.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Commit {
    pub id: String,
    /// False when the commit was already delivered by an earlier push.
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl Commit {
    /// Paths to classify: added then modified, in payload order and not
    /// deduplicated. Removed paths are never classified.
    pub fn changed_files(&self) -> impl Iterator<Item = &str> {
        self.added.iter().chain(self.modified.iter()).map(String::as_str)
    }

    /// Abbreviated sha for log and status messages.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

impl Repository {
    /// Owner login, falling back to the first half of `full_name`.
    pub fn owner_name(&self) -> Result<&str> {
        if let Some(owner) = &self.owner {
            if let Some(name) = owner.login.as_deref().or(owner.name.as_deref()) {
                return Ok(name);
            }
        }
        self.full_name
            .split_once('/')
            .map(|(owner, _)| owner)
            .ok_or_else(|| Error::UnexpectedResponse(format!("no owner in '{}'", self.full_name)))
    }
}

impl PushEvent {
    /// Parse a push payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a push payload from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Commits not seen in an earlier push.
    pub fn distinct_commits(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter().filter(|c| c.distinct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "ref": "refs/heads/main",
        "before": "0000000000000000000000000000000000000000",
        "after": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
        "repository": {
            "id": 35129377,
            "name": "public-repo",
            "full_name": "baxterthehacker/public-repo",
            "url": "https://github.com/baxterthehacker/public-repo",
            "owner": { "name": "baxterthehacker", "email": "baxter@example.com" }
        },
        "commits": [
            {
                "id": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
                "distinct": true,
                "message": "Update README.md",
                "added": ["big.bin"],
                "removed": ["old.bin"],
                "modified": ["README.md", "big.bin"]
            },
            {
                "id": "1111111111111111111111111111111111111111",
                "distinct": false,
                "message": "Rebased",
                "added": [],
                "removed": [],
                "modified": ["README.md"]
            }
        ]
    }"#;

    #[test]
    fn test_parse_push() {
        let push = PushEvent::from_json(PAYLOAD).unwrap();
        assert_eq!(push.git_ref, "refs/heads/main");
        assert_eq!(push.repository.full_name, "baxterthehacker/public-repo");
        assert_eq!(push.repository.owner_name().unwrap(), "baxterthehacker");
        assert_eq!(push.commits.len(), 2);
        assert_eq!(push.distinct_commits().count(), 1);
    }

    #[test]
    fn test_changed_files_order_and_duplicates() {
        let push = PushEvent::from_json(PAYLOAD).unwrap();
        let files: Vec<&str> = push.commits[0].changed_files().collect();
        assert_eq!(files, vec!["big.bin", "README.md", "big.bin"]);
        assert_eq!(push.commits[0].short_id(), "0d1a26e");
    }

    #[test]
    fn test_owner_from_full_name() {
        let repo = Repository {
            name: "repo".into(),
            full_name: "org/repo".into(),
            url: String::new(),
            owner: None,
        };
        assert_eq!(repo.owner_name().unwrap(), "org");
    }

    #[test]
    fn test_missing_distinct_defaults_to_false() {
        let json = r#"{ "repository": { "name": "r", "full_name": "o/r" },
                        "commits": [ { "id": "abc" } ] }"#;
        let push = PushEvent::from_json(json).unwrap();
        assert!(!push.commits[0].distinct);
    }
}
