use anyhow::{Context, Result};
use loadcheck::config::{load_config, LoadcheckConfig};
use loadcheck::simulate::run_self_check;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadcheck=info".into()),
        )
        .init();

    info!("Loadcheck starting...");

    let config_path =
        std::env::var("LOADCHECK_CONFIG").unwrap_or_else(|_| "loadcheck.toml".to_string());

    let mut config = if Path::new(&config_path).exists() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?
    } else {
        info!(path = %config_path, "Config file not found, using defaults");
        LoadcheckConfig::default()
    };
    config.simulation = config.simulation.apply_env();

    info!(
        path = %config_path,
        entities = config.simulation.entities,
        validators = config.simulation.validators,
        condition_limit = config.verify.condition_limit,
        "Configuration loaded"
    );

    let report = run_self_check(Arc::new(config)).await?;

    if !report.failures.is_empty() {
        for failure in &report.failures {
            error!(kind = ?failure.kind(), "{}", failure);
        }
        anyhow::bail!(
            "{} of {} checks failed",
            report.failures.len(),
            report.checks
        );
    }

    info!(
        writes = report.writes,
        checks = report.checks,
        "All checks passed"
    );
    Ok(())
}
