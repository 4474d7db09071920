//! Host-facing plugin adapters.
//!
//! The host data pipeline drives the plugin through four entry points:
//! `info` (identity and config schema), `init` (build a handle from the
//! host's config map), `send` (one batch of readings), and `shutdown`.
//! All state lives on the handle; two instances configured differently
//! coexist without interference.

use crate::batch::BatchProcessor;
use crate::bindings::BindingTable;
use crate::config::{ConfigError, PluginConfig};
use crate::core::{BatchResult, Reading, TrapSender};
use crate::dispatch::TrapDispatcher;
use crate::payload::JsonPayloadEncoder;
use crate::transport::SnmptrapSender;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Plugin identity plus the configuration schema advertised to the host.
pub struct PluginInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub plugin_type: &'static str,
    pub interface: &'static str,
    pub config: Value,
}

/// One initialized plugin instance.
///
/// The binding table and protocol parameters are fixed for the life of the
/// handle; `reconfigure` builds a replacement handle instead of mutating
/// this one, so the host can swap atomically.
pub struct SnmpAuditPlugin {
    config: PluginConfig,
    table: Arc<BindingTable>,
    processor: BatchProcessor,
}

impl SnmpAuditPlugin {
    /// Plugin identity and default configuration schema, served once when
    /// the host enumerates its plugins.
    pub fn info() -> PluginInfo {
        PluginInfo {
            name: "trapcast",
            version: env!("CARGO_PKG_VERSION"),
            plugin_type: "north",
            interface: "1.0",
            config: Self::default_config(),
        }
    }

    /// Initializes a handle from the host's configuration map. This is the
    /// fail-closed boundary: anything wrong with the protocol settings is
    /// reported here, before a single reading is accepted.
    pub fn init(raw: &Value) -> Result<Self, ConfigError> {
        let config = PluginConfig::from_host_map(raw)?;
        Self::with_sender(config, Arc::new(SnmptrapSender::new()))
    }

    /// Wires a handle with an explicit transport. `init` uses the real
    /// `snmptrap` sender; tests and the dry-run harness substitute fakes.
    pub fn with_sender(
        config: PluginConfig,
        sender: Arc<dyn TrapSender>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Arc::new(BindingTable::from_config(&config));
        let dispatcher = TrapDispatcher::from_config(&config, sender)?;
        info!(
            version = %config.snmp_version,
            destinations = dispatcher.destinations().len(),
            bindings = table.len(),
            "snmp audit plugin initialized"
        );
        let processor = BatchProcessor::new(table.clone(), Arc::new(JsonPayloadEncoder), dispatcher);
        Ok(Self {
            config,
            table,
            processor,
        })
    }

    /// Forwards one batch of readings and reports consumption to the host.
    ///
    /// Per-destination failures are visible in logs and metrics only; the
    /// host contract is the three-field result.
    #[instrument(skip(self, readings), fields(count = readings.len()))]
    pub async fn send(&self, readings: &[Reading], stream_id: i32) -> BatchResult {
        debug!(stream_id, "processing batch");
        self.processor.process(readings).await
    }

    /// Builds a fresh handle from a new configuration map. The old handle
    /// stays usable until dropped.
    pub fn reconfigure(&self, raw: &Value) -> Result<Self, ConfigError> {
        info!("reconfiguring snmp audit plugin");
        Self::init(raw)
    }

    /// Final call from the host. Nothing to flush: delivery is
    /// fire-and-forget and all state is in memory.
    pub fn shutdown(self) {
        info!("snmp audit plugin shut down");
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.table
    }

    fn default_config() -> Value {
        json!({
            "plugin": {
                "description": "SNMP audit trap forwarder",
                "type": "string",
                "default": "trapcast",
                "readonly": "true"
            },
            "source": {
                "description": "Source of data to be sent on the stream.",
                "type": "enumeration",
                "default": "audit",
                "options": ["audit"],
                "order": "1",
                "displayName": "Source"
            },
            "mainDestination": {
                "description": "Manager that always receives the traps, as host:port.",
                "type": "string",
                "default": "127.0.0.1:162",
                "order": "2",
                "displayName": "Manager address:port"
            },
            "backupDestination": {
                "description": "Optional second manager, as host:port. Leave empty to disable.",
                "type": "string",
                "default": "",
                "order": "3",
                "displayName": "Backup manager address:port"
            },
            "OIDbindings": {
                "description": "Inline JSON list of {name, oidValue} bindings. Takes precedence over the bindings file.",
                "type": "JSON",
                "default": "",
                "order": "4",
                "displayName": "OID bindings"
            },
            "bindingsFile": {
                "description": "Path to a JSON bindings document.",
                "type": "string",
                "default": "",
                "order": "5",
                "displayName": "OID bindings file"
            },
            "snmpVersion": {
                "description": "SNMP version. Either v2c or v3.",
                "type": "enumeration",
                "default": "v2c",
                "options": ["v2c", "v3"],
                "order": "6",
                "displayName": "SNMP Version"
            },
            "community": {
                "description": "Community string for v2c traps.",
                "type": "string",
                "default": "public",
                "order": "7",
                "displayName": "Community (v2c)",
                "validity": "snmpVersion == \"v2c\""
            },
            "EngID": {
                "description": "Authoritative engine ID if using SNMPv3.",
                "type": "string",
                "default": "",
                "order": "8",
                "displayName": "Engine ID (SNMPv3)",
                "validity": "snmpVersion == \"v3\""
            },
            "Security": {
                "description": "Security level if using SNMPv3.",
                "type": "enumeration",
                "default": "noAuthNoPriv",
                "options": ["noAuthNoPriv", "authNoPriv", "authPriv"],
                "order": "9",
                "displayName": "Security level (SNMPv3)",
                "validity": "snmpVersion == \"v3\""
            },
            "User": {
                "description": "User name if using SNMPv3.",
                "type": "string",
                "default": "snmp3user",
                "order": "10",
                "displayName": "User name (SNMPv3)",
                "validity": "snmpVersion == \"v3\""
            },
            "AuthType": {
                "description": "Authentication type if using SNMPv3.",
                "type": "enumeration",
                "default": "SHA",
                "options": ["SHA", "MD5"],
                "order": "11",
                "displayName": "Authentication type (SNMPv3)",
                "validity": "snmpVersion == \"v3\" and Security != \"noAuthNoPriv\""
            },
            "pwd": {
                "description": "Authentication password if using SNMPv3.",
                "type": "password",
                "default": "",
                "order": "12",
                "displayName": "Password (SNMPv3)",
                "validity": "snmpVersion == \"v3\" and Security != \"noAuthNoPriv\""
            },
            "EncType": {
                "description": "Encryption type if using SNMPv3.",
                "type": "enumeration",
                "default": "AES",
                "options": ["AES", "DES"],
                "order": "13",
                "displayName": "Encryption type (SNMPv3)",
                "validity": "snmpVersion == \"v3\" and Security == \"authPriv\""
            },
            "EncPwd": {
                "description": "Encryption password if using SNMPv3.",
                "type": "password",
                "default": "",
                "order": "14",
                "displayName": "PrivPassword (SNMPv3)",
                "validity": "snmpVersion == \"v3\" and Security == \"authPriv\""
            }
        })
    }
}
