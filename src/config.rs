//! Configuration management for trapcast
//!
//! This module defines the `PluginConfig` struct holding all plugin
//! settings. There are two ways in: the host hands over a JSON key-value
//! map at init (camelCase keys, accepted via serde aliases), and the
//! standalone harness uses the `figment` crate to layer defaults, a TOML
//! file, environment variables, and CLI arguments.

use crate::cli::Cli;
use crate::core::{
    AuthCredentials, AuthProtocol, Destination, DestinationParseError, PrivCredentials,
    PrivProtocol, ProtocolInvocation, SecurityLevel, SecurityParams, SnmpVersion,
};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors surfaced at plugin init, before any reading is
/// accepted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The raw configuration could not be deserialized. Unknown enum
    /// spellings (e.g. an unrecognized security level) land here, so a
    /// typo can never silently downgrade the security of outgoing traps.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// A field required by the active protocol settings is absent or empty.
    #[error("configuration option '{field}' is required when {requirement}")]
    Missing {
        field: &'static str,
        requirement: &'static str,
    },
    /// A destination option did not parse as `host:port`.
    #[error("configuration option '{field}': {source}")]
    Destination {
        field: &'static str,
        #[source]
        source: DestinationParseError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// The main configuration struct for the plugin.
///
/// Canonical field names are snake_case (TOML, environment); the aliases
/// match the key spellings the host's config schema uses.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PluginConfig {
    /// The logging level for the standalone harness.
    pub log_level: String,
    /// Manager that always receives traps, as `host:port`.
    #[serde(alias = "mainDestination", alias = "destination")]
    pub main_destination: String,
    /// Optional second manager; an empty string disables it.
    #[serde(alias = "backupDestination")]
    pub backup_destination: String,
    /// Inline OID bindings JSON blob. Takes precedence over `bindings_file`
    /// when non-empty.
    #[serde(alias = "OIDbindings")]
    pub oid_bindings: String,
    /// Path to a bindings document on disk, used when no inline blob is set.
    #[serde(alias = "bindingsFile")]
    pub bindings_file: Option<PathBuf>,
    /// SNMP protocol version for outgoing notifications.
    #[serde(alias = "snmpVersion")]
    pub snmp_version: SnmpVersion,
    /// Community string for v2c traps.
    pub community: String,
    /// Authoritative engine id for v3 traps.
    #[serde(alias = "EngID", alias = "engId")]
    pub engine_id: String,
    /// SNMPv3 security level.
    #[serde(alias = "Security")]
    pub security: SecurityLevel,
    /// SNMPv3 user name.
    #[serde(alias = "User")]
    pub user: String,
    /// Digest algorithm, required from `authNoPriv` up.
    #[serde(alias = "AuthType")]
    pub auth_type: Option<AuthProtocol>,
    /// Authentication password, required from `authNoPriv` up.
    #[serde(alias = "pwd")]
    pub auth_password: Option<String>,
    /// Encryption algorithm, required at `authPriv`.
    #[serde(alias = "EncType")]
    pub priv_type: Option<PrivProtocol>,
    /// Privacy password, required at `authPriv`.
    #[serde(alias = "EncPwd")]
    pub priv_password: Option<String>,
}

// Provide a default implementation for tests and easy setup.
impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            main_destination: "127.0.0.1:162".to_string(),
            backup_destination: String::new(),
            oid_bindings: String::new(),
            bindings_file: None,
            snmp_version: SnmpVersion::V2c,
            community: "public".to_string(),
            engine_id: String::new(),
            security: SecurityLevel::NoAuthNoPriv,
            user: String::new(),
            auth_type: None,
            auth_password: None,
            priv_type: None,
            priv_password: None,
        }
    }
}

impl PluginConfig {
    /// Parses the key-value map handed over by the host at init.
    ///
    /// Unrecognized keys are ignored (the host sends its whole category,
    /// including plumbing the plugin never reads). Recognized keys with
    /// unusable values are hard errors: this runs once at init, the only
    /// point where the host will display them.
    pub fn from_host_map(raw: &serde_json::Value) -> Result<Self, ConfigError> {
        let config: PluginConfig = serde_json::from_value(raw.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the harness configuration by layering sources: defaults, the
    /// TOML file, `TRAPCAST_`-prefixed environment variables, and CLI
    /// arguments, in increasing order of precedence.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(PluginConfig::default()));
        if let Some(path) = &cli.config {
            // Toml::file silently skips missing files; an explicitly named
            // config that does not exist should be loud.
            if !path.exists() {
                return Err(ConfigError::Parse(format!(
                    "config file not found at {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: PluginConfig = figment
            // Allow overriding with environment variables, e.g. TRAPCAST_COMMUNITY=ops
            .merge(Env::prefixed("TRAPCAST_"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks destination syntax and the escalating SNMPv3 credential
    /// requirements. Called by both loading paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.main_destination.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "main_destination",
                requirement: "forwarding traps anywhere",
            });
        }
        self.main_destination
            .parse::<Destination>()
            .map_err(|source| ConfigError::Destination {
                field: "main_destination",
                source,
            })?;
        if !self.backup_destination.is_empty() {
            self.backup_destination
                .parse::<Destination>()
                .map_err(|source| ConfigError::Destination {
                    field: "backup_destination",
                    source,
                })?;
        }
        if self.snmp_version == SnmpVersion::V3 {
            self.security_params()?;
        }
        Ok(())
    }

    /// The destinations every trap goes to: always the main one, plus the
    /// backup when configured. Order is delivery order.
    pub fn destinations(&self) -> Result<Vec<Destination>, ConfigError> {
        let mut destinations = vec![self.main_destination.parse::<Destination>().map_err(
            |source| ConfigError::Destination {
                field: "main_destination",
                source,
            },
        )?];
        if !self.backup_destination.is_empty() {
            destinations.push(self.backup_destination.parse::<Destination>().map_err(
                |source| ConfigError::Destination {
                    field: "backup_destination",
                    source,
                },
            )?);
        }
        Ok(destinations)
    }

    /// Builds the SNMPv3 security parameters, enforcing that credentials
    /// escalate with the level: `authNoPriv` needs auth material on top of
    /// `noAuthNoPriv`, and `authPriv` needs privacy material on top of that.
    pub fn security_params(&self) -> Result<SecurityParams, ConfigError> {
        if self.engine_id.is_empty() {
            return Err(ConfigError::Missing {
                field: "engine_id",
                requirement: "snmp_version is v3",
            });
        }
        if self.user.is_empty() {
            return Err(ConfigError::Missing {
                field: "user",
                requirement: "snmp_version is v3",
            });
        }

        let auth = if self.security >= SecurityLevel::AuthNoPriv {
            let protocol = self.auth_type.ok_or(ConfigError::Missing {
                field: "auth_type",
                requirement: "security is authNoPriv or higher",
            })?;
            let password = self
                .auth_password
                .clone()
                .filter(|p| !p.is_empty())
                .ok_or(ConfigError::Missing {
                    field: "auth_password",
                    requirement: "security is authNoPriv or higher",
                })?;
            Some(AuthCredentials { protocol, password })
        } else {
            None
        };

        let privacy = if self.security == SecurityLevel::AuthPriv {
            let protocol = self.priv_type.ok_or(ConfigError::Missing {
                field: "priv_type",
                requirement: "security is authPriv",
            })?;
            let password = self
                .priv_password
                .clone()
                .filter(|p| !p.is_empty())
                .ok_or(ConfigError::Missing {
                    field: "priv_password",
                    requirement: "security is authPriv",
                })?;
            Some(PrivCredentials { protocol, password })
        } else {
            None
        };

        Ok(SecurityParams {
            engine_id: self.engine_id.clone(),
            user: self.user.clone(),
            level: self.security,
            auth,
            privacy,
        })
    }

    /// Protocol parameters attached to every outgoing notification.
    pub fn invocation(&self) -> Result<ProtocolInvocation, ConfigError> {
        match self.snmp_version {
            SnmpVersion::V2c => Ok(ProtocolInvocation::V2c {
                community: self.community.clone(),
            }),
            SnmpVersion::V3 => Ok(ProtocolInvocation::V3(self.security_params()?)),
        }
    }
}
