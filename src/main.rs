//! Glycorisk: Diabetes risk scoring
//!
//! Reads one patient record as JSON (file argument or stdin), scores it and
//! prints the result as JSON on stdout.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycorisk::adapters::sanitize::SanitizingMakeWriter;
use glycorisk::config::{AppConfig, LogTarget};
use glycorisk::application::read_patient;
use glycorisk::{GlycoriskError, ScoringContext};

const USAGE: &str = "Usage: glycorisk [<patient.json> | -]\n\nReads a patient record as JSON and prints the diabetes risk assessment.\nConfiguration is read from GLYCORISK_* environment variables.";

fn main() -> Result<()> {
    let path = match std::env::args().nth(1) {
        Some(arg) if arg == "-h" || arg == "--help" => {
            println!("{USAGE}");
            return Ok(());
        }
        other => other,
    };

    let config = AppConfig::from_env()?;

    // stdout carries the result; logs go to stderr or a file.
    let (writer, guard) = match &config.log_target {
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogTarget::File(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: a missing directory is reported by the open below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("Failed to open log file {log_file:?}"))?;
            tracing_appender::non_blocking(file)
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Glycorisk...");

    let context = ScoringContext::initialize(&config)?;

    let patient = match path.as_deref() {
        None | Some("-") => read_patient(std::io::stdin().lock()),
        Some(p) => std::fs::File::open(p)
            .map_err(GlycoriskError::from)
            .and_then(read_patient),
    };

    match patient.and_then(|patient| context.score(&patient)) {
        Ok(result) => {
            tracing::info!("{result}");
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) if e.is_user_correctable() => {
            tracing::warn!("Rejected input: {e}");
            eprintln!("{e}");
            // Flush buffered logs; exit() skips destructors.
            drop(guard);
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}
