use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use timetable_flow::config::ScheduleSettings;
use timetable_flow::ops::{telemetry, RunStatsCollector};
use timetable_flow::refinery::{Refinery, RefineryError, RefineryOutcome};
use timetable_flow::RawEmailMessage;

#[derive(Parser)]
#[command(name = "timetable-flow", about = "Extract class schedules from timetable emails")]
struct Cli {
    /// Settings file (JSON); ALLOWED_SEMESTERS / DEFAULT_CAMPUS override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print snapshot JSON
    #[arg(long)]
    pretty: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Message files ({message_id, subject, received_at, body, body_is_html})
    #[arg(required = true)]
    messages: Vec<PathBuf>,
}

fn load_message(path: &Path) -> anyhow::Result<RawEmailMessage> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading message {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing message {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing_with_level(&cli.log_level);

    let settings = match &cli.config {
        Some(path) => ScheduleSettings::from_file(path)?,
        None => ScheduleSettings::default(),
    };
    let config = Arc::new(
        settings
            .with_env_overrides()
            .compile()
            .context("invalid schedule settings")?,
    );
    let refinery = Refinery::new(config);
    let stats = Arc::new(RunStatsCollector::new());

    // * One blocking task per message; the config is shared read-only
    let mut handles = Vec::with_capacity(cli.messages.len());
    for path in cli.messages.clone() {
        let refinery = refinery.clone();
        let stats = Arc::clone(&stats);
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<RefineryOutcome> {
            let message = load_message(&path)?;
            match refinery.process(&message) {
                Ok(outcome) => {
                    stats.record_run(&outcome.diagnostics);
                    Ok(outcome)
                }
                Err(err @ RefineryError::MalformedMessageBody { .. }) => {
                    stats.record_malformed();
                    Err(anyhow::Error::new(err).context(format!("refining {}", path.display())))
                }
            }
        }));
    }

    let mut failures = 0usize;
    for (path, handle) in cli.messages.iter().zip(handles) {
        match handle.await? {
            Ok(outcome) => {
                let json = if cli.pretty {
                    outcome.snapshot.to_json_pretty()
                } else {
                    outcome.snapshot.to_json()
                };
                println!("{}", json);
            }
            Err(err) => {
                failures += 1;
                tracing::error!(path = %path.display(), error = %format!("{:#}", err), "Message skipped");
            }
        }
    }

    stats.log_totals();

    if failures > 0 {
        anyhow::bail!("{} of {} messages could not be refined", failures, cli.messages.len());
    }
    Ok(())
}
