use anyhow::{anyhow, bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::target::{parse_repo_identifier, RepositoryTarget};

/// Main configuration structure for commitwatch
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Name shown in the report header
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Hours added to UTC when rendering report timestamps
    #[serde(default)]
    pub time_offset_hours: i32,

    /// Repositories to watch
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,

    /// Polling cadence and state policy
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Commits API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Webhook delivery settings
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Report rendering options
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A single watched repository as written in the config file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    /// Display name (defaults to the repo segment of `source`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// URL, "@"-prefixed URL or owner/repo shorthand
    pub source: String,
}

/// Scheduling configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    /// Time between rounds
    #[serde(default = "default_interval")]
    pub interval: String, // "8h"

    /// Delay before the next round after a round aborted with an error
    #[serde(default = "default_error_delay")]
    pub error_delay: String, // "5s"

    /// Random pause between repositories within a round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<JitterConfig>,

    /// When new commit hashes are committed to the in-memory state
    #[serde(default)]
    pub state_update: StateUpdatePolicy,
}

/// Uniform random delay range, in seconds
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct JitterConfig {
    pub min_secs: u64,
    pub max_secs: u64,
}

/// Policy for recording newly detected commits
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StateUpdatePolicy {
    /// Record as soon as a new commit is detected; failed deliveries are not re-sent
    #[default]
    OnDetect,
    /// Record only after the webhook accepted the report
    OnDelivery,
}

/// Commits API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// User-Agent header sent with every API request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Issue a second request per new commit to list its changed files
    #[serde(default = "default_true")]
    pub fetch_changed_files: bool,
}

/// Webhook configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    /// Destination URL (supports ${VAR} expansion)
    #[serde(default)]
    pub url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Optional HTTP proxy for webhook traffic
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Proxy configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_proxy_url")]
    pub url: String,
}

/// Report rendering configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    /// Include the next scheduled check time in the header
    #[serde(default = "default_true")]
    pub show_next_check: bool,

    /// List changed files under each commit when they were fetched
    #[serde(default = "default_true")]
    pub show_changed_files: bool,

    /// Maximum number of files listed per commit
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact" or "full"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_app_name() -> String {
    "GitHub Monitor".to_string()
}
fn default_true() -> bool {
    true
}
fn default_interval() -> String {
    "8h".to_string()
}
fn default_error_delay() -> String {
    "5s".to_string()
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_timeout() -> String {
    "30s".to_string()
}
fn default_proxy_url() -> String {
    "http://localhost:7890".to_string()
}
fn default_max_files() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

// Default implementations
impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            error_delay: default_error_delay(),
            jitter: None,
            state_update: StateUpdatePolicy::default(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            fetch_changed_files: default_true(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: default_timeout(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_proxy_url(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_next_check: default_true(),
            show_changed_files: default_true(),
            max_files: default_max_files(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            time_offset_hours: 0,
            repositories: Vec::new(),
            schedule: ScheduleConfig::default(),
            github: GitHubConfig::default(),
            webhook: WebhookConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Longest accepted interval or error delay
pub const MAX_SCHEDULE_DELAY: Duration = Duration::from_secs(365 * 86400);

/// Parse duration strings like "30s", "15m", "8h", "1d" or bare seconds
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_str = duration_str.trim().to_lowercase();

    let (value, unit, label) = if let Some(value) = duration_str.strip_suffix('s') {
        (value, 1, "seconds")
    } else if let Some(value) = duration_str.strip_suffix('m') {
        (value, 60, "minutes")
    } else if let Some(value) = duration_str.strip_suffix('h') {
        (value, 3600, "hours")
    } else if let Some(value) = duration_str.strip_suffix('d') {
        (value, 86400, "days")
    } else {
        (duration_str.as_str(), 1, "duration")
    };

    let secs = value
        .trim()
        .parse::<u64>()
        .with_context(|| {
            format!(
                "Invalid {} value. Use format like '30s', '15m', '8h', '1d'",
                label
            )
        })?
        .checked_mul(unit)
        .with_context(|| format!("Duration too large: {}", duration_str))?;

    Ok(Duration::from_secs(secs))
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("commitwatch").join("config.yml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup, then expand ${VAR} in URLs
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("WEBHOOK_URL") {
            self.webhook.url = url;
        }
        if let Some(interval) = lookup("COMMITWATCH_INTERVAL") {
            self.schedule.interval = interval;
        }
        if let Some(proxy) = lookup("COMMITWATCH_PROXY_URL") {
            self.webhook.proxy.url = proxy;
            self.webhook.proxy.enabled = true;
        }
        if let Some(offset) = lookup("COMMITWATCH_TIME_OFFSET") {
            self.time_offset_hours = offset
                .trim()
                .parse()
                .with_context(|| format!("Invalid COMMITWATCH_TIME_OFFSET: {}", offset))?;
        }

        self.webhook.url = expand_vars(&self.webhook.url, &lookup)
            .context("Failed to expand webhook url")?;
        self.webhook.proxy.url = expand_vars(&self.webhook.proxy.url, &lookup)
            .context("Failed to expand proxy url")?;

        Ok(())
    }

    /// Check everything the monitor needs before it starts
    pub fn validate(&self) -> Result<()> {
        self.validate_webhook()?;
        self.validate_monitoring()
    }

    /// Webhook destination and proxy settings
    pub fn validate_webhook(&self) -> Result<()> {
        if self.webhook.url.trim().is_empty() {
            bail!("No webhook url configured. Set webhook.url or the WEBHOOK_URL environment variable");
        }
        reqwest::Url::parse(&self.webhook.url)
            .with_context(|| format!("Invalid webhook url: {}", self.webhook.url))?;

        if self.webhook.proxy.enabled {
            reqwest::Url::parse(&self.webhook.proxy.url)
                .with_context(|| format!("Invalid proxy url: {}", self.webhook.proxy.url))?;
        }

        self.webhook_timeout()?;
        Ok(())
    }

    /// Repositories, schedule, API and report settings
    pub fn validate_monitoring(&self) -> Result<()> {
        reqwest::Url::parse(&self.github.api_base)
            .with_context(|| format!("Invalid api_base: {}", self.github.api_base))?;

        if self.repositories.is_empty() {
            bail!("No repositories configured");
        }
        self.targets()?;

        let interval = self.interval()?;
        if interval.is_zero() {
            bail!("schedule.interval must be greater than zero");
        }
        if interval > MAX_SCHEDULE_DELAY {
            bail!("schedule.interval must be at most 365d, got {}", self.schedule.interval);
        }
        if self.error_delay()? > MAX_SCHEDULE_DELAY {
            bail!(
                "schedule.error_delay must be at most 365d, got {}",
                self.schedule.error_delay
            );
        }
        self.github_timeout()?;

        if !(-23..=23).contains(&self.time_offset_hours) {
            bail!(
                "time_offset_hours must be between -23 and 23, got {}",
                self.time_offset_hours
            );
        }

        if let Some(jitter) = &self.schedule.jitter {
            if jitter.min_secs > jitter.max_secs {
                bail!(
                    "schedule.jitter.min_secs ({}) is greater than max_secs ({})",
                    jitter.min_secs,
                    jitter.max_secs
                );
            }
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            other => bail!("Unknown logging format: {}", other),
        }

        Ok(())
    }

    /// Resolve configured repository entries into watch targets
    pub fn targets(&self) -> Result<Vec<RepositoryTarget>> {
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(self.repositories.len());

        for entry in &self.repositories {
            let ident = parse_repo_identifier(&entry.source)
                .ok_or_else(|| anyhow!("Unrecognized repository identifier: {}", entry.source))?;
            if !ident.has_safe_segments() {
                bail!(
                    "Unsupported characters in repository identifier: {} (owner and repo may only contain letters, digits, '.', '_' and '-')",
                    entry.source
                );
            }

            let name = entry
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| ident.repo.clone());

            if !seen.insert(name.clone()) {
                bail!("Duplicate repository name: {}", name);
            }

            targets.push(RepositoryTarget::new(name, ident));
        }

        Ok(targets)
    }

    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.schedule.interval).context("Failed to parse schedule.interval")
    }

    pub fn error_delay(&self) -> Result<Duration> {
        parse_duration(&self.schedule.error_delay).context("Failed to parse schedule.error_delay")
    }

    pub fn github_timeout(&self) -> Result<Duration> {
        parse_duration(&self.github.timeout).context("Failed to parse github.timeout")
    }

    pub fn webhook_timeout(&self) -> Result<Duration> {
        parse_duration(&self.webhook.timeout).context("Failed to parse webhook.timeout")
    }

    /// Proxy URL for webhook traffic, if enabled
    pub fn webhook_proxy(&self) -> Option<&str> {
        self.webhook
            .proxy
            .enabled
            .then_some(self.webhook.proxy.url.as_str())
    }
}

fn expand_vars<F>(value: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let expanded = shellexpand::env_with_context_no_errors(value, |key: &str| lookup(key));
    if expanded.contains("${") {
        bail!("Unresolved variable in {}", value);
    }
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::env;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.webhook.url = "https://hooks.example.com/send?key=abc".to_string();
        config.repositories = vec![RepositoryEntry {
            name: Some("gradient-bot".to_string()),
            source: "@https://github.com/fanyilun0/github-monitor-bot".to_string(),
        }];
        config
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.app_name, "GitHub Monitor");
        assert_eq!(config.time_offset_hours, 0);
        assert_eq!(config.interval().unwrap(), Duration::from_secs(28800));
        assert_eq!(config.error_delay().unwrap(), Duration::from_secs(5));
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert!(config.github.fetch_changed_files);
        assert!(!config.webhook.proxy.enabled);
        assert_eq!(config.webhook.proxy.url, "http://localhost:7890");
        assert_eq!(config.schedule.state_update, StateUpdatePolicy::OnDetect);
        assert!(config.schedule.jitter.is_none());
        assert!(config.webhook_proxy().is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("8h").unwrap(), Duration::from_secs(28800));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration(" 45 ").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("2H").unwrap(), Duration::from_secs(7200));

        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-5m").is_err());
    }

    #[test]
    fn test_targets_resolve_names_and_identifiers() {
        let mut config = valid_config();
        config.repositories.push(RepositoryEntry {
            name: None,
            source: "rust-lang/cargo".to_string(),
        });

        let targets = config.targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "gradient-bot");
        assert_eq!(targets[0].owner, "fanyilun0");
        assert_eq!(targets[0].repo, "github-monitor-bot");
        assert_eq!(targets[1].name, "cargo");
        assert_eq!(targets[1].owner, "rust-lang");
    }

    #[test]
    fn test_targets_reject_bad_identifier() {
        let mut config = valid_config();
        config.repositories.push(RepositoryEntry {
            name: Some("broken".to_string()),
            source: "not-a-repo".to_string(),
        });

        let err = config.targets().unwrap_err();
        assert!(err.to_string().contains("not-a-repo"));
    }

    #[test]
    fn test_targets_reject_duplicate_names() {
        let mut config = valid_config();
        config.repositories.push(RepositoryEntry {
            name: Some("gradient-bot".to_string()),
            source: "other/repo".to_string(),
        });

        let err = config.targets().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        valid_config().validate().expect("config should be valid");
    }

    #[test]
    fn test_validate_requires_webhook_and_repositories() {
        let mut config = valid_config();
        config.webhook.url = String::new();
        assert!(config.validate().is_err());
        assert!(config.validate_monitoring().is_ok());

        let mut config = valid_config();
        config.repositories.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = valid_config();
        config.schedule.interval = "0s".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.time_offset_hours = 30;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.schedule.jitter = Some(JitterConfig {
            min_secs: 10,
            max_secs: 2,
        });
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.webhook.proxy.enabled = true;
        config.webhook.proxy.url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.logging.format = "json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_duration_overflow_is_an_error() {
        let err = parse_duration("300000000000000d").unwrap_err();
        assert!(err.to_string().contains("Duration too large"));
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_validate_rejects_oversized_schedule() {
        let mut config = valid_config();
        config.schedule.interval = "100000000d".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("schedule.interval"));

        let mut config = valid_config();
        config.schedule.error_delay = "366d".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.schedule.interval = "365d".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_targets_reject_unsafe_segments() {
        for source in ["octo/alpha?x", "octo/alpha#readme", "oc to/alpha", "octo/al%70ha"] {
            let mut config = valid_config();
            config.repositories = vec![RepositoryEntry {
                name: None,
                source: source.to_string(),
            }];
            let err = config.targets().unwrap_err();
            assert!(
                err.to_string().contains("Unsupported characters"),
                "{} should be rejected, got: {}",
                source,
                err
            );
        }

        let mut config = valid_config();
        config.repositories = vec![RepositoryEntry {
            name: None,
            source: "rust-lang/rust.vim".to_string(),
        }];
        assert_eq!(config.targets().unwrap()[0].repo, "rust.vim");
    }

    #[test]
    fn test_overrides_from_lookup() {
        let mut config = valid_config();
        let lookup = lookup_from(&[
            ("WEBHOOK_URL", "https://hooks.example.com/other"),
            ("COMMITWATCH_INTERVAL", "10m"),
            ("COMMITWATCH_PROXY_URL", "http://proxy.local:3128"),
            ("COMMITWATCH_TIME_OFFSET", "8"),
        ]);

        config.apply_overrides_from(lookup).unwrap();

        assert_eq!(config.webhook.url, "https://hooks.example.com/other");
        assert_eq!(config.interval().unwrap(), Duration::from_secs(600));
        assert_eq!(config.webhook_proxy(), Some("http://proxy.local:3128"));
        assert_eq!(config.time_offset_hours, 8);
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = valid_config();
        config
            .apply_overrides_from(lookup_from(&[("WEBHOOK_URL", "  ")]))
            .unwrap();
        assert_eq!(config.webhook.url, "https://hooks.example.com/send?key=abc");
    }

    #[test]
    fn test_invalid_time_offset_override() {
        let mut config = valid_config();
        let result = config.apply_overrides_from(lookup_from(&[("COMMITWATCH_TIME_OFFSET", "east")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_webhook_url_expansion() {
        let mut config = valid_config();
        config.webhook.url = "https://hooks.example.com/send?key=${HOOK_KEY}".to_string();

        config
            .apply_overrides_from(lookup_from(&[("HOOK_KEY", "s3cret")]))
            .unwrap();
        assert_eq!(config.webhook.url, "https://hooks.example.com/send?key=s3cret");

        let mut config = valid_config();
        config.webhook.url = "https://hooks.example.com/send?key=${MISSING_KEY}".to_string();
        assert!(config.apply_overrides_from(lookup_from(&[])).is_err());
    }

    #[test]
    #[serial]
    fn test_env_override_from_process() {
        env::set_var("WEBHOOK_URL", "https://hooks.example.com/from-env");

        let mut config = valid_config();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.webhook.url, "https://hooks.example.com/from-env");

        env::remove_var("WEBHOOK_URL");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");

        let mut config = valid_config();
        config.app_name = "Release Watch".to_string();
        config.schedule.jitter = Some(JitterConfig {
            min_secs: 1,
            max_secs: 3,
        });
        config.schedule.state_update = StateUpdatePolicy::OnDelivery;

        config.save(&config_path).expect("Failed to save config");
        let loaded = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded.app_name, "Release Watch");
        assert_eq!(loaded.repositories, config.repositories);
        assert_eq!(loaded.schedule.jitter, config.schedule.jitter);
        assert_eq!(loaded.schedule.state_update, StateUpdatePolicy::OnDelivery);
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("commitwatch"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
app_name: "Team Watch"
time_offset_hours: 8
repositories:
  - name: gradient-bot
    source: "@https://github.com/fanyilun0/github-monitor-bot"
  - source: "https://github.com/tokio-rs/tokio"
schedule:
  interval: "1h"
  error_delay: "10s"
  jitter:
    min_secs: 1
    max_secs: 4
  state_update: on-delivery
github:
  api_base: "https://ghe.example.com/api/v3"
  fetch_changed_files: false
webhook:
  url: "https://hooks.example.com/send"
  proxy:
    enabled: true
    url: "http://127.0.0.1:8080"
report:
  show_next_check: false
  max_files: 3
logging:
  level: "debug"
  format: "full"
  color: false
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.app_name, "Team Watch");
        assert_eq!(config.time_offset_hours, 8);
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[1].name, None);
        assert_eq!(config.interval().unwrap(), Duration::from_secs(3600));
        assert_eq!(config.error_delay().unwrap(), Duration::from_secs(10));
        assert_eq!(
            config.schedule.jitter,
            Some(JitterConfig {
                min_secs: 1,
                max_secs: 4
            })
        );
        assert_eq!(config.schedule.state_update, StateUpdatePolicy::OnDelivery);
        assert_eq!(config.github.api_base, "https://ghe.example.com/api/v3");
        assert!(!config.github.fetch_changed_files);
        assert_eq!(config.webhook_proxy(), Some("http://127.0.0.1:8080"));
        assert!(!config.report.show_next_check);
        assert!(config.report.show_changed_files);
        assert_eq!(config.report.max_files, 3);
        assert_eq!(config.logging.format, "full");
        assert!(!config.logging.color);

        let targets = config.targets().unwrap();
        assert_eq!(targets[1].name, "tokio");
        assert_eq!(targets[1].owner, "tokio-rs");
    }
}
