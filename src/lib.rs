//! trapcast - forwards pipeline audit readings to SNMP managers as traps.
//!
//! This library implements a north-bound plugin for a host data pipeline:
//! `plugin::SnmpAuditPlugin` covers the host's info/init/send/shutdown
//! contract, built from the binding table, payload encoder, trap
//! dispatcher, and subprocess transport in the modules below.

pub mod batch;
pub mod bindings;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod payload;
pub mod plugin;
pub mod transport;

// Re-export core types for convenience
pub use crate::core::*;
