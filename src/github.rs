use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::http::{self, HttpFailure};
use crate::target::RepositoryTarget;

/// The most recent commit of a repository, as fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSnapshot {
    pub sha: String,
    pub message: String,
    pub author: String,
    /// Author timestamp as reported by the API
    pub date: String,
    pub url: String,
    /// Changed files, when the detail request was made
    pub changed_files: Option<Vec<String>>,
}

impl CommitSnapshot {
    /// First seven characters of the sha
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// Result of asking a source for a repository's latest commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(CommitSnapshot),
    /// The repository has no commits
    Empty,
    /// Nothing usable this round; the next round tries again
    Failed(HttpFailure),
}

/// Source of latest-commit snapshots
///
/// Per-repository problems are reported through [`FetchOutcome`]. An `Err`
/// means the round itself cannot continue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn latest_commit(&self, target: &RepositoryTarget) -> Result<FetchOutcome>;
}

#[derive(Debug, Deserialize)]
struct CommitListEntry {
    sha: String,
    html_url: String,
    commit: CommitBody,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    message: String,
    author: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    name: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
}

/// Unauthenticated client for the GitHub REST commits endpoints
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
    fetch_changed_files: bool,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = http::api_client(&config.github.user_agent, config.github_timeout()?)?;

        Ok(Self {
            http,
            api_base: config.github.api_base.trim_end_matches('/').to_string(),
            fetch_changed_files: config.github.fetch_changed_files,
        })
    }

    fn commits_url(&self, target: &RepositoryTarget) -> Result<Url> {
        let url = format!("{}/repos/{}/{}/commits", self.api_base, target.owner, target.repo);
        Url::parse(&url).with_context(|| format!("Invalid commits url: {}", url))
    }

    fn commit_url(&self, target: &RepositoryTarget, sha: &str) -> Result<Url> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, target.owner, target.repo, sha
        );
        Url::parse(&url).with_context(|| format!("Invalid commit url: {}", url))
    }

    /// GET a JSON document, mapping every failure to an [`HttpFailure`]
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, HttpFailure> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HttpFailure::from_transport(&e))?;

        if response.status() != StatusCode::OK {
            return Err(HttpFailure::from_status(response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| HttpFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn latest_commit(&self, target: &RepositoryTarget) -> Result<FetchOutcome> {
        let commits: Vec<CommitListEntry> = match self.get_json(self.commits_url(target)?).await {
            Ok(commits) => commits,
            Err(failure) => {
                error!("Failed to fetch commits for {}: {}", target.full_name(), failure);
                return Ok(FetchOutcome::Failed(failure));
            }
        };

        let Some(latest) = commits.into_iter().next() else {
            warn!("Repository {} has no commits", target.full_name());
            return Ok(FetchOutcome::Empty);
        };

        let changed_files = if self.fetch_changed_files {
            let url = self.commit_url(target, &latest.sha)?;
            match self.get_json::<CommitDetail>(url).await {
                Ok(detail) => Some(detail.files.into_iter().map(|f| f.filename).collect()),
                Err(failure) => {
                    error!(
                        "Failed to fetch commit {} for {}: {}",
                        latest.sha,
                        target.full_name(),
                        failure
                    );
                    return Ok(FetchOutcome::Failed(failure));
                }
            }
        } else {
            None
        };

        let (author, date) = match latest.commit.author {
            Some(actor) => (actor.name, actor.date),
            None => ("unknown".to_string(), String::new()),
        };

        Ok(FetchOutcome::Found(CommitSnapshot {
            sha: latest.sha,
            message: latest.commit.message,
            author,
            date,
            url: latest.html_url,
            changed_files,
        }))
    }
}
