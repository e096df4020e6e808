//! CI provider client (Travis CI REST API v3).
//!
//! - Token auth via `Authorization: token ...`
//! - Connect and total request timeouts on every call
//! - Bounded retry with exponential backoff for transport errors, 5xx and 429

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::CiSettings;

/// Base delay before the first retry; doubled on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// API version header required by Travis v3 endpoints.
const TRAVIS_API_VERSION: &str = "3";

/// Errors from the CI provider.
#[derive(Debug, thiserror::Error)]
pub enum CiError {
    #[error("CI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CI API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to build CI client: {0}")]
    Client(String),
}

impl CiError {
    /// Whether another attempt could plausibly succeed.
    fn is_transient(&self) -> bool {
        match self {
            CiError::Transport(_) => true,
            CiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            CiError::Client(_) => false,
        }
    }
}

/// A build as listed by the provider, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildDescriptor {
    pub id: i64,
    pub commit: CommitDescriptor,
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

impl BuildDescriptor {
    pub fn job_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.jobs.iter().map(|j| j.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitDescriptor {
    pub sha: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct JobRef {
    pub id: i64,
}

#[derive(Deserialize)]
struct BuildsResponse {
    #[serde(default)]
    builds: Vec<BuildDescriptor>,
}

/// Source of builds and job logs.
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// Most recent builds of `branch` triggered by `event_type`, newest first.
    async fn list_recent_builds(
        &self,
        branch: &str,
        event_type: &str,
        limit: usize,
    ) -> Result<Vec<BuildDescriptor>, CiError>;

    /// Raw log body of one job.
    async fn fetch_job_log(&self, job_id: i64) -> Result<Vec<u8>, CiError>;
}

/// Travis CI v3 client.
#[derive(Clone)]
pub struct TravisClient {
    base_url: String,
    repo_slug: String,
    token: Option<SecretString>,
    max_retries: u32,
    http_client: reqwest::Client,
}

impl TravisClient {
    /// Create a client from settings.
    pub fn new(settings: &CiSettings) -> Result<Self, CiError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| CiError::Client(e.to_string()))?;

        if settings.token.is_none() {
            warn!("CI_API_TOKEN is not set; CI API requests are unauthenticated");
        }

        info!(
            "CI client initialized (base_url={}, repo={}, timeout={}s, retries={})",
            settings.base_url,
            settings.repo_slug,
            settings.request_timeout_secs,
            settings.max_retries
        );

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            repo_slug: settings.repo_slug.clone(),
            token: settings.token.clone(),
            max_retries: settings.max_retries,
            http_client,
        })
    }

    fn builds_url(&self, branch: &str, event_type: &str, limit: usize) -> String {
        format!(
            "{}/repo/{}/builds?build.event_type={}&branch.name={}&limit={}",
            self.base_url,
            urlencoding::encode(&self.repo_slug),
            urlencoding::encode(event_type),
            urlencoding::encode(branch),
            limit
        )
    }

    fn job_log_url(&self, job_id: i64) -> String {
        format!("{}/job/{}/log.txt", self.base_url, job_id)
    }

    /// Single GET with provider headers. Non-success statuses become errors.
    async fn get_once(&self, url: &str) -> Result<reqwest::Response, CiError> {
        let mut request = self
            .http_client
            .get(url)
            .header("Travis-API-Version", TRAVIS_API_VERSION);
        if let Some(ref token) = self.token {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", token.expose_secret()),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// GET with retry on transient failures.
    async fn get(&self, url: &str) -> Result<reqwest::Response, CiError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    debug!(
                        "Retrying {} in {:?} (attempt {}/{}): {}",
                        url,
                        delay,
                        attempt + 1,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before retry number `attempt` (0-based).
fn backoff_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt))
}

#[async_trait]
impl CiProvider for TravisClient {
    async fn list_recent_builds(
        &self,
        branch: &str,
        event_type: &str,
        limit: usize,
    ) -> Result<Vec<BuildDescriptor>, CiError> {
        let url = self.builds_url(branch, event_type, limit);
        let response: BuildsResponse = self.get(&url).await?.json().await?;
        debug!("Listed {} builds from {}", response.builds.len(), url);
        Ok(response.builds)
    }

    async fn fetch_job_log(&self, job_id: i64) -> Result<Vec<u8>, CiError> {
        let url = self.job_log_url(job_id);
        let body = self.get(&url).await?.bytes().await?;
        Ok(body.to_vec())
    }
}
