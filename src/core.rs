//! Core domain types and service traits for trapcast
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the plugin.

use crate::payload::PayloadError;
use crate::transport::SendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One audit reading handed over by the host pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Reading {
    /// Object id assigned by the host storage layer, monotonic within a batch
    pub id: u64,
    /// Asset name the reading belongs to; the key into the OID binding table
    pub asset_code: String,
    /// Timestamp recorded by the host, passed through to the trap verbatim.
    /// Defaults to empty so harness fixtures can omit it and have it stamped.
    #[serde(default)]
    pub user_ts: String,
    /// The reading content itself, opaque to the plugin
    pub reading: Value,
}

/// Aggregate outcome of one batch, returned to the host unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    /// Whether the batch was consumed and handed to the transport
    pub any_sent: bool,
    /// Id of the last reading examined, even on an aborted batch
    pub last_object_id: u64,
    /// Number of readings processed; consumption accounting, not deliveries
    pub sent_count: u64,
}

impl BatchResult {
    /// The `(anySent, lastObjectId, sentCount)` shape the host contract uses.
    pub fn as_tuple(&self) -> (bool, u64, u64) {
        (self.any_sent, self.last_object_id, self.sent_count)
    }
}

/// A trap receiver address in `host:port` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

/// Why a destination string could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationParseError {
    #[error("destination '{0}' is not in host:port form")]
    MissingPort(String),
    #[error("destination '{0}' has an invalid port number")]
    InvalidPort(String),
    #[error("destination '{0}' has an empty host")]
    EmptyHost(String),
}

impl FromStr for Destination {
    type Err = DestinationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| DestinationParseError::MissingPort(s.to_string()))?;
        if host.is_empty() {
            return Err(DestinationParseError::EmptyHost(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| DestinationParseError::InvalidPort(s.to_string()))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// SNMP protocol version used for outgoing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SnmpVersion {
    #[default]
    #[serde(rename = "v2c")]
    V2c,
    #[serde(rename = "v3")]
    V3,
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V2c => write!(f, "v2c"),
            SnmpVersion::V3 => write!(f, "v3"),
        }
    }
}

/// SNMPv3 security level. The variants are ordered: each level requires
/// everything the previous one does plus one more set of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum SecurityLevel {
    #[default]
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    #[serde(rename = "authPriv")]
    AuthPriv,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SecurityLevel::NoAuthNoPriv => "noAuthNoPriv",
            SecurityLevel::AuthNoPriv => "authNoPriv",
            SecurityLevel::AuthPriv => "authPriv",
        };
        write!(f, "{s}")
    }
}

/// Authentication digest algorithm for SNMPv3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthProtocol {
    #[default]
    #[serde(rename = "SHA")]
    Sha,
    #[serde(rename = "MD5")]
    Md5,
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthProtocol::Sha => write!(f, "SHA"),
            AuthProtocol::Md5 => write!(f, "MD5"),
        }
    }
}

/// Privacy (encryption) algorithm for SNMPv3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PrivProtocol {
    #[default]
    #[serde(rename = "AES")]
    Aes,
    #[serde(rename = "DES")]
    Des,
}

impl fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivProtocol::Aes => write!(f, "AES"),
            PrivProtocol::Des => write!(f, "DES"),
        }
    }
}

/// Authentication credentials for `authNoPriv` and above.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub protocol: AuthProtocol,
    pub password: String,
}

// Passwords never appear in debug output; they would otherwise leak
// through structured logging of the surrounding types.
impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("protocol", &self.protocol)
            .field("password", &"***")
            .finish()
    }
}

/// Privacy credentials for `authPriv`.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivCredentials {
    pub protocol: PrivProtocol,
    pub password: String,
}

impl fmt::Debug for PrivCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivCredentials")
            .field("protocol", &self.protocol)
            .field("password", &"***")
            .finish()
    }
}

/// Validated SNMPv3 security parameters.
///
/// Construction goes through `PluginConfig::security_params`, which enforces
/// that credentials are present for the chosen level, so holders of this
/// struct never need to re-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityParams {
    /// Authoritative engine id, as configured
    pub engine_id: String,
    /// SNMPv3 user name
    pub user: String,
    pub level: SecurityLevel,
    /// Present iff `level >= AuthNoPriv`
    pub auth: Option<AuthCredentials>,
    /// Present iff `level == AuthPriv`
    pub privacy: Option<PrivCredentials>,
}

/// Protocol parameters attached to every outgoing notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolInvocation {
    V2c { community: String },
    V3(SecurityParams),
}

/// A fully resolved trap, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapNotification {
    pub destination: Destination,
    /// Trap OID resolved from the binding table
    pub oid: String,
    /// Encoded payload carried as the single string varbind
    pub payload: String,
    pub invocation: ProtocolInvocation,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Sends a single trap notification to its destination.
///
/// Implementations are fire-and-forget: `Ok` means the invocation was made,
/// not that any manager received the trap.
#[async_trait]
pub trait TrapSender: Send + Sync {
    /// A short, descriptive name for the transport (e.g. "snmptrap").
    /// Used for logging.
    fn name(&self) -> &str;

    /// Delivers one notification.
    ///
    /// # Returns
    /// * `Ok(())` if the transport invocation completed successfully
    /// * `Err` if the invocation could not be made or reported failure
    async fn send(&self, notification: &TrapNotification) -> Result<(), SendError>;
}

/// Renders a reading's timestamp and content into the single string value a
/// trap can carry.
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, ts: &str, content: &Value) -> Result<String, PayloadError>;
}
