//! Common test utilities and helpers for commitwatch tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use commitwatch::config::RepositoryEntry;
use commitwatch::{Clock, Config, Ticker};

/// Temporary directory holding a config file
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yml")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let config_path = self.config_path();
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    pub fn save_config(&self, config: &Config) -> PathBuf {
        let config_path = self.config_path();
        config.save(&config_path).expect("Failed to save test config");
        config_path
    }
}

/// Config pointing both the commits API and the webhook at a mock server
pub fn config_for(server: &MockServer, repos: &[(&str, &str)]) -> Config {
    let mut config = Config::default();
    config.github.api_base = server.uri();
    config.webhook.url = format!("{}/hook", server.uri());
    config.schedule.interval = "1h".to_string();
    config.schedule.error_delay = "5s".to_string();
    config.repositories = repos
        .iter()
        .map(|(name, source)| RepositoryEntry {
            name: Some(name.to_string()),
            source: source.to_string(),
        })
        .collect();
    config
}

pub fn commit_json(owner: &str, repo: &str, sha: &str, author: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/{}/{}/commit/{}", owner, repo, sha),
        "commit": {
            "message": message,
            "author": { "name": author, "date": "2024-05-01T10:00:00Z" }
        }
    })
}

/// Serve `sha` as the latest commit of owner/repo, with a one-file detail
pub async fn mount_latest_commit(server: &MockServer, owner: &str, repo: &str, sha: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits", owner, repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([commit_json(
            owner,
            repo,
            sha,
            "Ada Lovelace",
            "Add analytical engine notes"
        )])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits/{}", owner, repo, sha)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": sha,
            "files": [{ "filename": "notes/engine.md" }]
        })))
        .mount(server)
        .await;
}

pub async fn mount_webhook(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Text content of every webhook POST the server received
pub async fn webhook_messages(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.to_string() == "POST")
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).expect("webhook body is JSON");
            assert_eq!(body["msgtype"], "text");
            body["text"]["content"]
                .as_str()
                .expect("content is a string")
                .to_string()
        })
        .collect()
}

/// Ticker that records requested sleeps instead of waiting
#[derive(Default)]
pub struct RecordingTicker {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingTicker {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ticker for RecordingTicker {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_noon() -> Self {
        FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
