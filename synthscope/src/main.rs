//! synthscope - synthetic-data generation activity monitor
//!
//! Reads the backend's telemetry frames, classifies them into an activity log
//! and shows filtered views of it alongside backend health.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/synthscope/synthscope.log (~/.local/state/synthscope/synthscope.log)
//! - Config: $XDG_CONFIG_HOME/synthscope/config.toml (~/.config/synthscope/config.toml)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use synthscope_core::activity::patterns::match_line;
use synthscope_core::activity::projection::agents;
use synthscope_core::activity::{
    classify, normalize, ActivityFilter, ActivityMonitor, AgentFilter, LevelFilter, RawEvent,
};
use synthscope_core::format::{format_progress_bar, format_record_line, format_status_line};
use synthscope_core::status::{HttpHealthProbe, StatusPoller, TransportState};
use synthscope_core::{ActivityRecord, Config};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "synthscope")]
#[command(about = "Monitor synthetic-data generation activity")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read frames from stdin and print activity as it arrives
    Watch {
        /// Buffer capacity (overrides monitor.capacity)
        #[arg(long)]
        capacity: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Ingest a file of frames and print the resulting activity log
    Replay {
        /// File with one frame per line
        file: PathBuf,

        /// Buffer capacity (overrides monitor.capacity)
        #[arg(long)]
        capacity: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Print the log as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe backend health once
    Status {
        /// Backend base URL (overrides status.base_url)
        #[arg(long)]
        url: Option<String>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a single free-text line is normalized and classified
    Classify {
        /// The line to classify
        line: String,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only show records at this level (info, success, warning, error, all)
    #[arg(long, default_value = "all")]
    level: LevelFilter,

    /// Only show records from this agent
    #[arg(long, default_value = "all")]
    agent: AgentFilter,

    /// Case-insensitive search over message and agent
    #[arg(long, default_value = "")]
    search: String,
}

impl FilterArgs {
    fn into_filter(self) -> ActivityFilter {
        ActivityFilter {
            level: self.level,
            agent: self.agent,
            search: self.search,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, stdout carries the activity log)
    let _log_guard =
        synthscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("synthscope starting");

    match cli.command {
        Command::Watch {
            capacity,
            filter,
            json,
        } => {
            let config = with_capacity(config, capacity)?;
            run_watch(&config, &filter.into_filter(), json).await
        }
        Command::Replay {
            file,
            capacity,
            filter,
            json,
        } => {
            let config = with_capacity(config, capacity)?;
            run_replay(&config, &file, &filter.into_filter(), json)
        }
        Command::Status { url, json } => run_status(config, url, json).await,
        Command::Classify { line } => run_classify(&line),
    }
}

fn with_capacity(mut config: Config, capacity: Option<usize>) -> Result<Config> {
    if let Some(capacity) = capacity {
        config.monitor.capacity = capacity;
        config.validate().context("invalid --capacity")?;
    }
    Ok(config)
}

async fn run_watch(config: &Config, filter: &ActivityFilter, json: bool) -> Result<()> {
    let mut monitor = ActivityMonitor::new(&config.monitor);
    let transport = TransportState::new();
    transport.set_connected(true);

    if config.status.is_ready() {
        let probe =
            HttpHealthProbe::new(&config.status).context("failed to create health probe")?;
        tracing::info!(url = %probe.url(), "Polling backend health");
        monitor.attach_poller(StatusPoller::new(probe, transport.clone(), &config.status).spawn());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(frame) = line.context("failed to read stdin")? else {
                    tracing::info!("Transport closed");
                    break;
                };
                if frame.trim().is_empty() {
                    continue;
                }
                if let Some(record) = monitor.append_frame(&frame) {
                    if filter.matches(record) {
                        print_record(record, json)?;
                    }
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    transport.set_connected(false);
    monitor.shutdown();

    if !json {
        print_summary(&monitor, config.status.is_ready());
    }
    Ok(())
}

fn run_replay(config: &Config, file: &Path, filter: &ActivityFilter, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mut monitor = ActivityMonitor::new(&config.monitor);
    let mut frames = 0usize;
    for frame in content.lines().filter(|l| !l.trim().is_empty()) {
        monitor.append_frame(frame);
        frames += 1;
    }
    tracing::info!(frames, path = %file.display(), "Replay complete");

    let records = monitor.filter(filter);
    if json {
        let out = serde_json::json!({
            "progress": monitor.current_progress(),
            "summary": monitor.summary(),
            "records": records,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record_line(record));
    }
    println!();
    print_summary(&monitor, false);
    Ok(())
}

async fn run_status(config: Config, url: Option<String>, json: bool) -> Result<()> {
    let mut status_config = config.status;
    if let Some(url) = url {
        status_config.base_url = Some(url);
    }
    if !status_config.is_ready() {
        bail!("no backend configured: pass --url or set status.base_url in the config file");
    }

    let probe = HttpHealthProbe::new(&status_config).context("failed to create health probe")?;
    let mut poller = StatusPoller::new(probe, TransportState::new(), &status_config);
    let status = poller.tick().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", format_status_line(&status));
    }
    Ok(())
}

fn run_classify(line: &str) -> Result<()> {
    let pattern = match_line(line).map(|(name, _)| name);
    let fields = normalize(&RawEvent::text(line));
    let draft = classify(&fields);

    let out = serde_json::json!({
        "pattern": pattern,
        "normalized": fields,
        "activity": draft,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_record(record: &ActivityRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
    } else {
        println!("{}", format_record_line(record));
    }
    Ok(())
}

fn print_summary(monitor: &ActivityMonitor, with_status: bool) {
    let summary = monitor.summary();
    println!(
        "Records: {} ({} info, {} success, {} warning, {} error)",
        summary.total, summary.info, summary.success, summary.warning, summary.error
    );
    println!("Progress: {}", format_progress_bar(monitor.current_progress()));

    let seen = agents(monitor.records());
    if !seen.is_empty() {
        println!("Agents: {}", seen.join(", "));
    }
    if with_status {
        println!("Status: {}", format_status_line(&monitor.current_status()));
    }
}
