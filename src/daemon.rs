//! Monitor loop - polls watched repositories and reports new commits
//!
//! Each round checks every target sequentially, compares the latest sha
//! against the observation state, sends one aggregated report when anything
//! changed and then sleeps for the configured interval. A round that fails
//! outright is logged and followed by the shorter error delay; the loop
//! itself never exits.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::{Config, StateUpdatePolicy};
use crate::github::{CommitSource, FetchOutcome, GitHubClient};
use crate::http::HttpFailure;
use crate::message::{build_message, display_time, NewCommits, ReportContext};
use crate::notify::{Notifier, NotifyOutcome, WebhookNotifier};
use crate::state::{Change, ObservationState};
use crate::target::RepositoryTarget;

/// Suspends the loop between repositories and between rounds
#[async_trait]
pub trait Ticker: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock ticker backed by tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTicker;

#[async_trait]
impl Ticker for TokioTicker {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Source of the current time for report headers
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Loop settings resolved from [`Config`]
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub app_name: String,
    pub interval: Duration,
    pub error_delay: Duration,
    pub jitter: Option<(Duration, Duration)>,
    pub state_update: StateUpdatePolicy,
    pub time_offset_hours: i32,
    pub show_next_check: bool,
    pub show_changed_files: bool,
    pub max_files: usize,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            app_name: config.app_name.clone(),
            interval: config.interval()?,
            error_delay: config.error_delay()?,
            jitter: config.schedule.jitter.map(|j| {
                (
                    Duration::from_secs(j.min_secs),
                    Duration::from_secs(j.max_secs),
                )
            }),
            state_update: config.schedule.state_update,
            time_offset_hours: config.time_offset_hours,
            show_next_check: config.report.show_next_check,
            show_changed_files: config.report.show_changed_files,
            max_files: config.report.max_files,
        })
    }
}

/// What happened to the report at the end of a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing new, nothing sent
    NotNeeded,
    Delivered,
    Failed(HttpFailure),
}

/// Summary of one completed round
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: u64,
    pub checked: usize,
    pub new_commits: NewCommits,
    /// Repositories whose fetch produced nothing usable
    pub failed: Vec<String>,
    pub delivery: Delivery,
    pub duration: Duration,
}

/// Counters across the lifetime of the monitor
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub started_at: DateTime<Utc>,
    pub rounds_started: u64,
    pub rounds_completed: u64,
    /// Rounds aborted by an error and followed by the error delay
    pub rounds_recovered: u64,
    pub notifications_delivered: u64,
    pub notifications_failed: u64,
    pub last_round_at: Option<DateTime<Utc>>,
}

impl MonitorStatus {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            rounds_started: 0,
            rounds_completed: 0,
            rounds_recovered: 0,
            notifications_delivered: 0,
            notifications_failed: 0,
            last_round_at: None,
        }
    }
}

/// The polling loop and its state
pub struct Monitor {
    settings: MonitorSettings,
    targets: Vec<RepositoryTarget>,
    source: Arc<dyn CommitSource>,
    notifier: Arc<dyn Notifier>,
    ticker: Arc<dyn Ticker>,
    clock: Arc<dyn Clock>,
    state: ObservationState,
    status: MonitorStatus,
}

impl Monitor {
    /// Create a monitor talking to the configured API and webhook
    pub fn new(config: &Config) -> Result<Self> {
        let source = Arc::new(GitHubClient::new(config)?);
        let notifier = Arc::new(WebhookNotifier::new(config)?);
        Self::with_parts(config, source, notifier)
    }

    /// Create a monitor with explicit collaborators
    pub fn with_parts(
        config: &Config,
        source: Arc<dyn CommitSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let settings = MonitorSettings::from_config(config)?;
        let targets = config.targets()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        for target in &targets {
            info!("Watching repository: {}", target);
        }

        Ok(Self {
            settings,
            targets,
            source,
            notifier,
            ticker: Arc::new(TokioTicker),
            status: MonitorStatus::new(clock.now()),
            clock,
            state: ObservationState::new(),
        })
    }

    pub fn with_ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.status.started_at = clock.now();
        self.clock = clock;
        self
    }

    /// Start from previously known shas instead of an empty state
    pub fn with_state(mut self, state: ObservationState) -> Self {
        self.state = state;
        self
    }

    pub fn targets(&self) -> &[RepositoryTarget] {
        &self.targets
    }

    pub fn state(&self) -> &ObservationState {
        &self.state
    }

    pub fn status(&self) -> &MonitorStatus {
        &self.status
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Run rounds until the process is stopped
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Monitor started: {} repositories, interval {:?}",
            self.targets.len(),
            self.settings.interval
        );

        loop {
            // Errors are logged and recovered inside cycle()
            let _ = self.cycle().await;
        }
    }

    /// One round followed by the sleep before the next.
    ///
    /// A completed round is followed by the normal interval, whatever it
    /// found or delivered. A round that returned an error is followed by the
    /// error delay; the error is returned for inspection but has already
    /// been logged.
    pub async fn cycle(&mut self) -> Result<RoundReport> {
        match self.run_round().await {
            Ok(report) => {
                self.status.rounds_completed += 1;
                self.status.last_round_at = Some(self.clock.now());
                debug!("Sleeping {:?} until the next round", self.settings.interval);
                self.ticker.sleep(self.settings.interval).await;
                Ok(report)
            }
            Err(e) => {
                self.status.rounds_recovered += 1;
                error!("Round failed: {:?}", e);
                self.ticker.sleep(self.settings.error_delay).await;
                Err(e)
            }
        }
    }

    /// Check every target once and send a report if anything is new
    pub async fn run_round(&mut self) -> Result<RoundReport> {
        self.status.rounds_started += 1;
        let round = self.status.rounds_started;
        let round_start = Instant::now();

        info!("Starting round {}", round);

        let mut new_commits = NewCommits::new();
        let mut failed = Vec::new();

        for (index, target) in self.targets.iter().enumerate() {
            if index > 0 {
                if let Some(delay) = self.jitter_delay() {
                    debug!("Pausing {:?} before {}", delay, target.name);
                    self.ticker.sleep(delay).await;
                }
            }

            debug!("Checking repository: {}", target);

            match self.source.latest_commit(target).await? {
                FetchOutcome::Found(snapshot) => {
                    match self.state.detect(&target.name, &snapshot.sha) {
                        Change::New { previous } => {
                            info!(
                                "New commit for {}: {} (previous: {})",
                                target.name,
                                snapshot.short_sha(),
                                previous.as_deref().unwrap_or("none")
                            );
                            new_commits.insert(target.name.clone(), snapshot);
                        }
                        Change::Unchanged => {
                            info!("No new commits for {}", target.name);
                        }
                    }
                }
                FetchOutcome::Empty => {}
                FetchOutcome::Failed(_) => failed.push(target.name.clone()),
            }
        }

        if self.settings.state_update == StateUpdatePolicy::OnDetect {
            self.record(&new_commits);
        }

        let delivery = if new_commits.is_empty() {
            Delivery::NotNeeded
        } else {
            let message = build_message(&self.report_context(), &new_commits);

            match self.notifier.send(&message).await? {
                NotifyOutcome::Delivered => {
                    self.status.notifications_delivered += 1;
                    if self.settings.state_update == StateUpdatePolicy::OnDelivery {
                        self.record(&new_commits);
                    }
                    Delivery::Delivered
                }
                NotifyOutcome::Failed(failure) => {
                    self.status.notifications_failed += 1;
                    Delivery::Failed(failure)
                }
            }
        };

        let duration = round_start.elapsed();
        info!(
            "Round {} completed in {:.2}s: {} checked, {} new, {} failed",
            round,
            duration.as_secs_f64(),
            self.targets.len(),
            new_commits.len(),
            failed.len()
        );

        Ok(RoundReport {
            round,
            checked: self.targets.len(),
            new_commits,
            failed,
            delivery,
            duration,
        })
    }

    /// Header data for a report rendered now
    pub fn report_context(&self) -> ReportContext {
        let now = self.clock.now();
        let offset = self.settings.time_offset_hours;

        let next_check = if self.settings.show_next_check {
            chrono::Duration::from_std(self.settings.interval)
                .ok()
                .and_then(|interval| now.checked_add_signed(interval))
                .map(|next| display_time(next, offset))
        } else {
            None
        };

        ReportContext {
            app_name: self.settings.app_name.clone(),
            generated_at: display_time(now, offset),
            next_check,
            show_changed_files: self.settings.show_changed_files,
            max_files: self.settings.max_files,
        }
    }

    fn record(&mut self, commits: &NewCommits) {
        for (name, snapshot) in commits.iter() {
            self.state.record(name, &snapshot.sha);
        }
    }

    fn jitter_delay(&self) -> Option<Duration> {
        let (min, max) = self.settings.jitter?;
        if max.is_zero() {
            return None;
        }

        let max_ms = max.as_millis() as u64;
        let min_ms = (min.as_millis() as u64).min(max_ms);
        let millis = rand::rng().random_range(min_ms..=max_ms);
        Some(Duration::from_millis(millis))
    }
}
