use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commitwatch::config::{LoggingConfig, RepositoryEntry};
use commitwatch::{Config, Delivery, GitHubClient, Monitor, Notifier, NotifyOutcome, RoundReport};

#[derive(Parser)]
#[command(name = "commitwatch")]
#[command(about = "Watch GitHub repositories and post new commits to a webhook")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll repositories until stopped (default)
    Run,

    /// Run a single round and exit
    Once {
        /// Print the report instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration and list watched repositories
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Init { force } => cmd_init(cli.config, force),
        Commands::Run => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            cmd_run(&config).await
        }
        Commands::Once { dry_run } => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            cmd_once(&config, dry_run).await
        }
        Commands::CheckConfig => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            cmd_check_config(&config)
        }
    }
}

/// Load configuration and install the log subscriber
fn setup(config_path: Option<&Path>, verbose: bool) -> Result<Config> {
    let (config, created) = load_config(config_path)?;
    init_logging(verbose, &config.logging)?;
    info!("Starting commitwatch v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = created {
        info!("Created default configuration at: {}", path.display());
    }
    Ok(config)
}

/// Initialize logging based on verbosity and configuration
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log level: {}", default_level))?;

    let layer = fmt::layer().with_ansi(logging.color);

    if logging.format == "full" {
        tracing_subscriber::registry().with(layer).with(filter).init();
    } else {
        tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init();
    }

    Ok(())
}

/// Load configuration from specified path or default location.
///
/// Also returns the default path when the file had to be created.
fn load_config(config_path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    match config_path {
        Some(path) => Ok((Config::load(path)?, None)),
        None => {
            let default_path = Config::default_config_path()?;
            let created = (!default_path.exists()).then_some(default_path);
            Ok((Config::load_or_default()?, created))
        }
    }
}

/// Write a starter configuration
fn cmd_init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if path.exists() && !force {
        println!("⚠️  Configuration already exists: {}", path.display());
        println!("   Use --force to overwrite it");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let mut config = Config::default();
    config.repositories.push(RepositoryEntry {
        name: Some("github-monitor-bot".to_string()),
        source: "https://github.com/fanyilun0/github-monitor-bot".to_string(),
    });
    config.save(&path)?;

    println!("✅ Configuration written to: {}", path.display());
    println!("   Next: edit the repository list and set WEBHOOK_URL, then run 'commitwatch'");
    Ok(())
}

/// Poll until Ctrl+C
async fn cmd_run(config: &Config) -> Result<()> {
    config.validate()?;

    let mut monitor = Monitor::new(config)?;

    tokio::select! {
        result = monitor.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping monitor");
        }
    }

    let status = monitor.status();
    info!(
        "Monitor stopped after {} rounds ({} recovered), {} notifications delivered, {} failed",
        status.rounds_completed,
        status.rounds_recovered,
        status.notifications_delivered,
        status.notifications_failed
    );
    Ok(())
}

/// Prints the report to stdout instead of delivering it
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, content: &str) -> Result<NotifyOutcome> {
        println!("{}", content);
        Ok(NotifyOutcome::Delivered)
    }
}

/// Run one round
async fn cmd_once(config: &Config, dry_run: bool) -> Result<()> {
    let mut monitor = if dry_run {
        config.validate_monitoring()?;
        let source = Arc::new(GitHubClient::new(config)?);
        Monitor::with_parts(config, source, Arc::new(ConsoleNotifier))?
    } else {
        config.validate()?;
        Monitor::new(config)?
    };

    let report = monitor.run_round().await?;
    print_round_report(&report);
    Ok(())
}

fn print_round_report(report: &RoundReport) {
    println!();
    println!("📊 Round {} ({:.2}s)", report.round, report.duration.as_secs_f64());
    println!("   🔍 Repositories checked: {}", report.checked);
    println!("   🆕 New commits: {}", report.new_commits.len());
    for (name, commit) in report.new_commits.iter() {
        println!("      📦 {} @ {}", name, commit.short_sha());
    }
    if !report.failed.is_empty() {
        println!("   ❌ Failed: {}", report.failed.join(", "));
    }
    match &report.delivery {
        Delivery::NotNeeded => println!("   ⏭️  Nothing to report"),
        Delivery::Delivered => println!("   ✅ Report delivered"),
        Delivery::Failed(failure) => println!("   ❌ Report not delivered: {}", failure),
    }
}

/// Validate configuration and list targets
fn cmd_check_config(config: &Config) -> Result<()> {
    config.validate()?;

    let targets = config.targets()?;
    println!("✅ Configuration is valid");
    println!("   Interval: {}", config.schedule.interval);
    println!("   Webhook proxy: {}", config.webhook_proxy().unwrap_or("disabled"));
    println!("Repositories ({}):", targets.len());
    for target in targets {
        println!("  📁 {} → {}", target.name, target.full_name());
    }
    Ok(())
}
