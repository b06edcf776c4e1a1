use anyhow::Context;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, Layer, Registry};

/// Target for events that must land in the audit file
pub const AUDIT_TARGET: &str = "audit_log";

const DEFAULT_FILTER: &str = "veritrust_api=info,tower_http=info";

pub fn setup_logging(log_dir: &str, json_logs: bool) -> Result<(), anyhow::Error> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create logs directory {log_dir}"))?;

    // Daily rotating file appender
    let file_appender = rolling::daily(log_dir, "audit.log");

    // Only audit events go to the file
    let target_filter = Targets::new().with_target(AUDIT_TARGET, LevelFilter::TRACE);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(target_filter);

    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer: Box<dyn Layer<Registry> + Send + Sync> = if json_logs {
        fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_filter(env_filter())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_filter(env_filter())
            .boxed()
    };

    let subscriber = Registry::default().with(stdout_layer).with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    Ok(())
}

/// Records a state-changing action in the audit log
pub fn audit(actor: &str, action: &str, subject: &str, details: Option<&Value>) {
    let timestamp = Utc::now().to_rfc3339();

    match details {
        Some(d) => {
            info!(
                target: AUDIT_TARGET,
                actor = actor,
                action = action,
                subject = subject,
                details = %d,
                "{} {} {} {} {}", timestamp, actor, action, subject, d
            );
        }
        None => {
            info!(
                target: AUDIT_TARGET,
                actor = actor,
                action = action,
                subject = subject,
                "{} {} {} {}", timestamp, actor, action, subject
            );
        }
    }
}
