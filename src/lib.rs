//! commitwatch - Commit watcher with webhook notifications
//!
//! commitwatch polls a short list of GitHub repositories on a fixed interval,
//! detects new commits since the previous round and posts one aggregated
//! text report to a webhook.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration with environment overrides
//! - [`target`]: Repository identifier parsing
//! - [`github`]: Latest-commit fetching over the REST API
//! - [`state`]: In-memory last-seen sha tracking
//! - [`message`]: Report rendering
//! - [`notify`]: Webhook delivery
//! - [`daemon`]: The polling loop

pub mod config;
pub mod daemon;
pub mod github;
pub mod http;
pub mod message;
pub mod notify;
pub mod state;
pub mod target;

pub use config::Config;
pub use daemon::{Clock, Delivery, Monitor, MonitorStatus, RoundReport, Ticker};
pub use github::{CommitSnapshot, CommitSource, FetchOutcome, GitHubClient};
pub use http::HttpFailure;
pub use message::{build_message, NewCommits, ReportContext};
pub use notify::{Notifier, NotifyOutcome, WebhookNotifier};
pub use state::{Change, ObservationState};
pub use target::{parse_repo_identifier, RepoIdentifier, RepositoryTarget};
