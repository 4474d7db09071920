//! OID binding table: asset name to trap OID.
//!
//! Bindings are loaded once when a plugin handle is built and never change
//! for the life of the handle. Loading is fail-soft: a malformed document or
//! an unreadable file logs the problem and yields an empty table, so the
//! host pipeline keeps draining readings (they just resolve to nothing).

use crate::config::PluginConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Immutable name -> OID map, resolved once per reading.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    oids: HashMap<String, String>,
}

/// One entry of the bindings document.
#[derive(Debug, Deserialize)]
struct BindingEntry {
    name: String,
    #[serde(rename = "oidValue")]
    oid_value: String,
}

/// The on-disk document wraps its entries in a `bindings` key; inline blobs
/// are often written as a bare list. Both shapes are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BindingDocument {
    Wrapped { bindings: Vec<BindingEntry> },
    Bare(Vec<BindingEntry>),
}

impl BindingDocument {
    fn into_entries(self) -> Vec<BindingEntry> {
        match self {
            BindingDocument::Wrapped { bindings } => bindings,
            BindingDocument::Bare(entries) => entries,
        }
    }
}

impl BindingTable {
    /// Builds the table from whichever binding source the configuration
    /// names: the inline blob wins over the file, and neither being set is
    /// a valid (if useless) configuration.
    pub fn from_config(config: &PluginConfig) -> Self {
        // The host sends an empty string for an unset file option.
        let file = config
            .bindings_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty());
        if !config.oid_bindings.trim().is_empty() {
            Self::from_json(&config.oid_bindings)
        } else if let Some(path) = file {
            Self::from_file(path)
        } else {
            debug!("no OID bindings configured, starting with an empty table");
            Self::default()
        }
    }

    /// Parses a bindings JSON blob. Malformed input yields an empty table
    /// rather than an error.
    pub fn from_json(blob: &str) -> Self {
        match serde_json::from_str::<BindingDocument>(blob) {
            Ok(document) => Self::from_entries(document.into_entries()),
            Err(e) => {
                error!(error = %e, "failed to parse OID bindings, starting with an empty table");
                Self::default()
            }
        }
    }

    /// Reads and parses the bindings document at `path`. A missing or
    /// unreadable file yields an empty table rather than an error.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "failed to read OID bindings file, starting with an empty table"
                );
                Self::default()
            }
        }
    }

    fn from_entries(entries: Vec<BindingEntry>) -> Self {
        let mut oids = HashMap::with_capacity(entries.len());
        for BindingEntry { name, oid_value } in entries {
            // Later entries silently win on duplicate names.
            if oids.insert(name.clone(), oid_value).is_some() {
                debug!(name = %name, "duplicate binding name, keeping the later OID");
            }
        }
        info!(bindings = oids.len(), "OID binding table loaded");
        Self { oids }
    }

    /// Exact, case-sensitive lookup. `None` means "no trap for this asset".
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.oids.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.oids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oids.is_empty()
    }
}
