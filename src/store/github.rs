//! store::github
//!
//! GitHub store implementation using the REST contents API.
//!
//! # Design
//!
//! - `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}` reads a file
//!   together with its blob sha, which serves as the revision marker
//! - `PUT /repos/{owner}/{repo}/contents/{path}` writes a file as a new
//!   commit; GitHub applies it only if the supplied `sha` is still current
//! - Files above the contents API size limit come back with
//!   `encoding: "none"`; their bytes are read from
//!   `GET /repos/{owner}/{repo}/git/blobs/{sha}` instead
//!
//! A push without `sha` is create-only: GitHub rejects it with 422 when the
//! path already exists, which maps to [`StoreError::Conflict`].
//!
//! # Rate Limiting
//!
//! Rate limits surface as `StoreError::RateLimited`. Retrying is the
//! caller's decision; this module never sleeps.
//!
//! # Example
//!
//! ```ignore
//! use tabledit::core::types::StorePath;
//! use tabledit::store::github::GitHubStore;
//! use tabledit::store::RemoteStore;
//!
//! let store = GitHubStore::new("acme", "datasets")
//!     .with_token("ghp_xxx")
//!     .with_branch("main");
//! let fetched = store.fetch(&StorePath::new("data/prices.csv")?).await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::traits::{CommitInfo, FetchedBlob, PushReceipt, PushRequest, RemoteStore, StoreError};
use crate::core::codec::{self, EncodedBlob};
use crate::core::types::{RevisionMarker, StorePath};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "tabledit";

/// GitHub store.
pub struct GitHubStore {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token; reads of public repositories work without one
    token: Option<String>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Branch to read and commit to; `None` uses the default branch
    branch: Option<String>,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubStore {
    /// Create a store for `owner/repo` on github.com, without credentials.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: None,
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Authenticate requests with a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read from and commit to `branch` instead of the default branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Use a custom API base URL (e.g., `https://github.example.com/api/v3`).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Get the configured branch.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                StoreError::AuthFailed("token contains characters not allowed in a header".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint from path segments.
    fn repo_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            StoreError::Network(format!("invalid API base '{}': {}", self.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Network(format!("API base '{}' cannot hold a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, path: &StorePath) -> Result<Url, StoreError> {
        self.repo_url(std::iter::once("contents").chain(path.as_str().split('/')))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| StoreError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Map an error response from the API.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> StoreError {
        let headers = response.headers();
        let rate_exhausted = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false);
        let required_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => StoreError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_exhausted => StoreError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = message;
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                StoreError::PermissionDenied(err_msg)
            }
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::CONFLICT => StoreError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => {
                StoreError::Conflict(message)
            }
            StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
            _ if status.is_server_error() => StoreError::Api {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => StoreError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Read a blob by sha through the git data API.
    async fn fetch_blob(&self, sha: &str) -> Result<EncodedBlob, StoreError> {
        let url = self.repo_url(["git", "blobs", sha])?;
        tracing::debug!(%url, "GET blob");

        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let blob: GitHubBlob = self.handle_response(response).await?;
        match blob.encoding.as_str() {
            "base64" => Ok(EncodedBlob::new(blob.content)),
            "utf-8" => Ok(codec::encode(blob.content.as_bytes())),
            other => Err(StoreError::Api {
                status: 200,
                message: format!("unsupported blob encoding '{}'", other),
            }),
        }
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self, path: &StorePath) -> Result<FetchedBlob, StoreError> {
        let mut url = self.contents_url(path)?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        tracing::debug!(%url, "GET contents");

        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let file: GitHubContent = self.handle_response(response).await?;
        if file.kind != "file" {
            return Err(StoreError::NotFound(format!(
                "{} is a {}, not a file",
                path, file.kind
            )));
        }

        let content = match (file.encoding.as_deref(), file.content) {
            (Some("base64"), Some(content)) => EncodedBlob::new(content),
            _ => self.fetch_blob(&file.sha).await?,
        };

        Ok(FetchedBlob {
            content,
            marker: RevisionMarker::new(file.sha),
        })
    }

    async fn push(&self, request: PushRequest) -> Result<PushReceipt, StoreError> {
        if self.token.is_none() {
            return Err(StoreError::AuthRequired);
        }

        let url = self.contents_url(&request.path)?;
        let body = PutContentsBody {
            message: &request.message,
            content: request.content.as_str(),
            sha: request.expected.as_ref().map(|m| m.as_str()),
            branch: self.branch.as_deref(),
        };
        tracing::debug!(
            %url,
            expected = request.expected.as_ref().map(|m| m.short()).unwrap_or("none"),
            "PUT contents"
        );

        let response = self
            .client
            .put(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let written: PutContentsResponse = self.handle_response(response).await?;
        Ok(written.into())
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating or updating a file.
#[derive(Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Contents API response for a single file.
#[derive(Deserialize)]
struct GitHubContent {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

/// Git data API blob.
#[derive(Deserialize)]
struct GitHubBlob {
    content: String,
    encoding: String,
}

/// Contents API response for a write.
#[derive(Deserialize)]
struct PutContentsResponse {
    content: GitHubContentRef,
    commit: GitHubCommit,
}

#[derive(Deserialize)]
struct GitHubContentRef {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    html_url: Option<String>,
}

impl From<PutContentsResponse> for PushReceipt {
    fn from(resp: PutContentsResponse) -> Self {
        PushReceipt {
            marker: RevisionMarker::new(resp.content.sha),
            commit: Some(CommitInfo {
                id: resp.commit.sha,
                url: resp.commit.html_url,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod github_store {
        use super::*;

        #[test]
        fn new_creates_store() {
            let store = GitHubStore::new("owner", "repo");
            assert_eq!(store.name(), "github");
            assert_eq!(store.owner(), "owner");
            assert_eq!(store.repo(), "repo");
            assert!(store.branch().is_none());
            assert!(!store.has_token());
        }

        #[test]
        fn builder_sets_fields() {
            let store = GitHubStore::new("owner", "repo")
                .with_token("t")
                .with_branch("staging")
                .with_api_base("https://github.example.com/api/v3/");
            assert!(store.has_token());
            assert_eq!(store.branch(), Some("staging"));
            assert_eq!(store.api_base, "https://github.example.com/api/v3");
        }

        #[test]
        fn contents_url_format() {
            let store = GitHubStore::new("octocat", "hello-world");
            let path = StorePath::new("data/prices 2024.csv").unwrap();
            assert_eq!(
                store.contents_url(&path).unwrap().as_str(),
                "https://api.github.com/repos/octocat/hello-world/contents/data/prices%202024.csv"
            );
        }

        #[test]
        fn contents_url_keeps_enterprise_prefix() {
            let store = GitHubStore::new("o", "r").with_api_base("https://ghe.local/api/v3");
            let path = StorePath::new("a.csv").unwrap();
            assert_eq!(
                store.contents_url(&path).unwrap().as_str(),
                "https://ghe.local/api/v3/repos/o/r/contents/a.csv"
            );
        }

        #[test]
        fn invalid_api_base_is_an_error() {
            let store = GitHubStore::new("o", "r").with_api_base("not a url");
            let path = StorePath::new("a.csv").unwrap();
            assert!(store.contents_url(&path).is_err());
        }

        #[test]
        fn debug_redacts_token() {
            let store = GitHubStore::new("owner", "repo").with_token("secret_token_abc123");
            let debug_output = format!("{:?}", store);
            assert!(!debug_output.contains("secret_token_abc123"));
            assert!(debug_output.contains("has_token"));
            assert!(debug_output.contains("owner"));
        }

        #[test]
        fn headers_include_api_version() {
            let store = GitHubStore::new("o", "r").with_token("abc");
            let headers = store.headers().unwrap();
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
            assert_eq!(headers.get("X-GitHub-Api-Version").unwrap(), "2022-11-28");
        }

        #[test]
        fn headers_without_token_skip_authorization() {
            let store = GitHubStore::new("o", "r");
            assert!(store.headers().unwrap().get(AUTHORIZATION).is_none());
        }

        #[test]
        fn headers_reject_invalid_token() {
            let store = GitHubStore::new("o", "r").with_token("bad\ntoken");
            assert!(matches!(store.headers(), Err(StoreError::AuthFailed(_))));
        }

        #[tokio::test]
        async fn push_without_token_requires_auth() {
            let store = GitHubStore::new("o", "r");
            let result = store
                .push(PushRequest {
                    path: StorePath::new("a.csv").unwrap(),
                    content: codec::encode(b"x"),
                    expected: None,
                    message: "m".into(),
                })
                .await;
            assert_eq!(result, Err(StoreError::AuthRequired));
        }
    }

    mod wire_types {
        use super::*;

        #[test]
        fn put_body_omits_absent_sha() {
            let body = PutContentsBody {
                message: "m",
                content: "eA==",
                sha: None,
                branch: None,
            };
            let json = serde_json::to_value(&body).unwrap();
            assert_eq!(json, serde_json::json!({"message": "m", "content": "eA=="}));
        }

        #[test]
        fn put_response_into_receipt() {
            let resp: PutContentsResponse = serde_json::from_value(serde_json::json!({
                "content": {"sha": "blob2", "path": "a.csv"},
                "commit": {"sha": "c0ffee", "html_url": "https://github.com/o/r/commit/c0ffee"}
            }))
            .unwrap();
            let receipt: PushReceipt = resp.into();
            assert_eq!(receipt.marker.as_str(), "blob2");
            let commit = receipt.commit.unwrap();
            assert_eq!(commit.id, "c0ffee");
            assert!(commit.url.unwrap().ends_with("c0ffee"));
        }
    }
}
