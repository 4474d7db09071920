//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the standalone
//! harness using the `clap` crate. These arguments are parsed at startup
//! and then merged with the configuration from the TOML file and
//! environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Replays a file of readings through the SNMP trap forwarder.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file holding the batch of readings to forward.
    #[arg(short, long, value_name = "FILE")]
    pub readings: PathBuf,

    /// Override the main trap destination (host:port).
    #[arg(long, value_name = "HOST:PORT")]
    pub destination: Option<String>,

    /// Override the OID bindings file.
    #[arg(long, value_name = "FILE")]
    pub bindings_file: Option<PathBuf>,

    /// Print each transport invocation instead of running snmptrap.
    #[arg(long)]
    pub dry_run: bool,

    /// Stream id to report, mirroring the host's send call.
    #[arg(long, default_value_t = 1)]
    pub stream_id: i32,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(destination) = &self.destination {
            dict.insert("main_destination".into(), Value::from(destination.clone()));
        }

        if let Some(path) = &self.bindings_file {
            dict.insert(
                "bindings_file".into(),
                Value::from(path.display().to_string()),
            );
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
