//! trapcast - SNMP audit trap forwarder
//!
//! The plugin normally runs embedded in the host data pipeline. This binary
//! is the standalone harness: it replays a JSON file of readings through
//! one full send cycle, so configurations, bindings, and manager
//! reachability can be exercised without a host instance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trapcast::{
    cli::Cli,
    config::PluginConfig,
    core::{Reading, TrapNotification, TrapSender},
    plugin::SnmpAuditPlugin,
    transport::{build_args, redacted_args, SendError, SnmptrapSender},
};

/// Prints what would have been invoked instead of spawning the transport.
struct DryRunSender;

#[async_trait]
impl TrapSender for DryRunSender {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&self, notification: &TrapNotification) -> Result<(), SendError> {
        println!(
            "snmptrap {}",
            redacted_args(&build_args(notification)).join(" ")
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = PluginConfig::load(&cli).unwrap_or_else(|err| {
        // Logging is not up yet; this still has to reach the operator.
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("trapcast starting up...");

    // Log the loaded configuration settings for visibility
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("SNMP Version: {}", config.snmp_version);
    info!("Main Destination: {}", config.main_destination);
    info!(
        "Backup Destination: {}",
        if config.backup_destination.is_empty() {
            "Disabled"
        } else {
            &config.backup_destination
        }
    );
    if config.snmp_version == trapcast::core::SnmpVersion::V3 {
        info!("Security Level: {}", config.security);
        info!("User: {}", config.user);
    } else {
        info!("Community: {}", config.community);
    }
    if !config.oid_bindings.trim().is_empty() {
        info!("OID Bindings: inline");
    } else if let Some(path) = &config.bindings_file {
        info!("OID Bindings: {}", path.display());
    } else {
        info!("OID Bindings: Not configured");
    }
    info!("Dry Run: {}", cli.dry_run);
    info!("-------------------------------------------------------");

    let raw = std::fs::read_to_string(&cli.readings)
        .with_context(|| format!("failed to read readings file {}", cli.readings.display()))?;
    let mut readings: Vec<Reading> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse readings file {}", cli.readings.display()))?;

    // Fixture files may leave timestamps out; stamp them like the host would.
    for reading in &mut readings {
        if reading.user_ts.is_empty() {
            reading.user_ts = chrono::Utc::now().to_rfc3339();
        }
    }
    info!("Loaded {} readings", readings.len());

    let sender: Arc<dyn TrapSender> = if cli.dry_run {
        Arc::new(DryRunSender)
    } else {
        Arc::new(SnmptrapSender::new())
    };

    let plugin = SnmpAuditPlugin::with_sender(config, sender)?;
    let result = plugin.send(&readings, cli.stream_id).await;
    let (any_sent, last_id, sent_count) = result.as_tuple();
    info!(any_sent, last_id, sent_count, "batch complete");
    println!("({any_sent}, {last_id}, {sent_count})");
    plugin.shutdown();

    Ok(())
}
