//! GitHub REST v3 client for repository contents, commit comments and
//! commit statuses.

use std::sync::Arc;

use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::push::PushEvent;
use crate::report::{CommitState, Notice, Reporter};
use crate::resolver::LISTING_CEILING;
use crate::store::{ContentStore, DirectoryEntry, EntryKind, Listing};
use crate::{Error, Result};

/// Context name of the commit status set by the watchdog.
pub const STATUS_CONTEXT: &str = "lfs-watchdog";

const USER_AGENT: &str = "lfs-watchdog/0.1";

/// GitHub API client bound to one repository.
///
/// This type is cheaply cloneable - multiple clones share the same underlying
/// HTTP agent and configuration.
#[derive(Clone)]
pub struct GitHubClient {
    inner: Arc<GitHubClientInner>,
}

struct GitHubClientInner {
    /// API root, e.g. `https://api.github.com/`.
    api_url: Url,
    owner: String,
    repo: String,
    /// Optional bearer token.
    token: Option<String>,
    /// HTTP agent for making requests.
    agent: ureq::Agent,
}

/// Response of the contents API: a directory listing or a single object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Contents {
    Dir(Vec<DirectoryEntry>),
    Object(ContentObject),
}

#[derive(Deserialize)]
struct ContentObject {
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    path: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct CreatedComment {
    #[serde(default)]
    html_url: Option<String>,
}

impl GitHubClient {
    /// Create a client for `owner/repo`, deriving the API endpoint from the
    /// repository's web URL.
    pub fn new(repo_url: &str, owner: &str, repo: &str) -> Result<Self> {
        Ok(Self::with_api_url(derive_api_url(repo_url)?, owner, repo))
    }

    /// Create a client with a specific API root URL.
    pub fn with_api_url(api_url: Url, owner: &str, repo: &str) -> Self {
        GitHubClient {
            inner: Arc::new(GitHubClientInner {
                api_url,
                owner: owner.to_string(),
                repo: repo.to_string(),
                token: None,
                agent: ureq::Agent::new(),
            }),
        }
    }

    /// Create a client for the repository a push went to.
    pub fn for_push(push: &PushEvent) -> Result<Self> {
        let repo = &push.repository;
        Self::new(&repo.url, repo.owner_name()?, &repo.name)
    }

    /// Set authentication from a bearer token.
    pub fn with_token(self, token: &str) -> Self {
        GitHubClient {
            inner: Arc::new(GitHubClientInner {
                api_url: self.inner.api_url.clone(),
                owner: self.inner.owner.clone(),
                repo: self.inner.repo.clone(),
                token: Some(token.to_string()),
                agent: self.inner.agent.clone(),
            }),
        }
    }

    /// Get the API root URL.
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    /// `owner/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.inner.owner, self.inner.repo)
    }

    /// Build `repos/{owner}/{repo}/{segments...}` below the API root.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.inner.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.inner.api_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", self.inner.owner.as_str(), self.inner.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let req = self
            .inner
            .agent
            .request_url(method, url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT);

        match &self.inner.token {
            Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Fetch `repos/{owner}/{repo}/contents/{path}` at `rev`.
    fn contents(&self, rev: &str, path: &str) -> Result<Contents> {
        let mut url = self.endpoint(["contents"])?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(self.inner.api_url.to_string()))?;
            if path.is_empty() {
                segments.push("");
            } else {
                segments.extend(path.split('/'));
            }
        }
        url.query_pairs_mut().append_pair("ref", rev);

        debug!(%url, "fetching contents");
        let body = self.request("GET", &url).call()?.into_string()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn post_json(&self, url: &Url, body: serde_json::Value) -> Result<String> {
        let response = self
            .request("POST", url)
            .set("Content-Type", "application/json")
            .send_json(body)?;
        Ok(response.into_string()?)
    }
}

impl ContentStore for GitHubClient {
    // Files over 1MB come back without inline content, so only small files
    // such as pointers and config can be fetched this way.
    fn file_content(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        let object = match self.contents(rev, path)? {
            Contents::Object(object) => object,
            Contents::Dir(_) => {
                return Err(Error::UnexpectedResponse(format!("'{}' is a directory", path)))
            }
        };

        if object.kind != EntryKind::File {
            return Err(Error::UnexpectedResponse(format!(
                "'{}' is a {}, not a file",
                object.path, object.kind
            )));
        }

        match (object.encoding.as_deref(), object.content) {
            (Some("base64"), Some(content)) => {
                // The API wraps base64 at 60 columns.
                let compact: String = content.split_whitespace().collect();
                Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
            }
            (Some("utf-8"), Some(content)) => Ok(content.into_bytes()),
            (encoding, _) => Err(Error::UnexpectedResponse(format!(
                "no inline content for '{}' (encoding: {})",
                path,
                encoding.unwrap_or("none")
            ))),
        }
    }

    fn list_directory(&self, rev: &str, dir: &str) -> Result<Listing> {
        match self.contents(rev, dir)? {
            Contents::Dir(entries) => {
                let truncated = entries.len() >= LISTING_CEILING;
                Ok(Listing { entries, truncated })
            }
            Contents::Object(object) => Err(Error::UnexpectedResponse(format!(
                "'{}' is a {}, not a directory",
                dir, object.kind
            ))),
        }
    }
}

impl Reporter for GitHubClient {
    fn publish(&self, sha: &str, notice: &Notice<'_>) -> Result<()> {
        let url = self.endpoint(["commits", sha, "comments"])?;
        let body = self.post_json(&url, serde_json::json!({ "body": notice.render() }))?;

        let created: CreatedComment =
            serde_json::from_str(&body).unwrap_or(CreatedComment { html_url: None });
        info!(
            repo = %self.full_name(),
            sha,
            url = created.html_url.as_deref().unwrap_or("-"),
            "posted comment"
        );
        Ok(())
    }

    fn set_status(&self, sha: &str, state: CommitState, description: &str) -> Result<()> {
        let url = self.endpoint(["statuses", sha])?;
        self.post_json(
            &url,
            serde_json::json!({
                "state": state,
                "description": description,
                "context": STATUS_CONTEXT,
            }),
        )?;
        debug!(sha, ?state, "status set");
        Ok(())
    }
}

/// Derive the REST API root from a repository web URL.
///
/// `github.com` repositories use `https://api.github.com/`; GitHub
/// Enterprise hosts serve the API under `/api/v3/`.
pub fn derive_api_url(repo_url: &str) -> Result<Url> {
    let mut url = Url::parse(repo_url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", repo_url, e)))?;
    url.set_query(None);
    url.set_fragment(None);

    if url.host_str() == Some("github.com") {
        return Ok(Url::parse("https://api.github.com/")?);
    }

    url.set_path("/api/v3/");
    Ok(url)
}
