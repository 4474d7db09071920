//! The trap transport: spawning the net-snmp `snmptrap` command.
//!
//! Each notification becomes one subprocess invocation with a structured
//! argument list. Nothing is ever routed through a shell, so payload
//! content cannot be reinterpreted as shell syntax no matter what it
//! contains. Delivery is fire-and-forget: a zero exit status is the
//! strongest success signal the protocol offers.

#[cfg(feature = "test-utils")]
pub mod test_utils;

use crate::core::{ProtocolInvocation, TrapNotification, TrapSender};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Transport failures for a single notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The transport binary could not be started at all.
    #[error("failed to spawn trap transport '{program}': {reason}")]
    Spawn { program: String, reason: String },
    /// The transport ran and reported failure.
    #[error("trap transport '{program}' failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Builds the argv for one notification, mirroring the net-snmp CLI forms.
///
/// The varbind is always OID `.1` with type tag `s`, carrying the encoded
/// payload; the empty element before the trap OID leaves the uptime field
/// for the agent to fill in.
pub fn build_args(notification: &TrapNotification) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    match &notification.invocation {
        ProtocolInvocation::V2c { community } => {
            args.extend(["-v2c".into(), "-c".into(), community.clone()]);
        }
        ProtocolInvocation::V3(params) => {
            args.extend([
                "-v3".into(),
                "-e".into(),
                params.engine_id.clone(),
                "-u".into(),
                params.user.clone(),
            ]);
            if let Some(auth) = &params.auth {
                args.extend([
                    "-a".into(),
                    auth.protocol.to_string(),
                    "-A".into(),
                    auth.password.clone(),
                ]);
            }
            if let Some(privacy) = &params.privacy {
                args.extend([
                    "-x".into(),
                    privacy.protocol.to_string(),
                    "-X".into(),
                    privacy.password.clone(),
                ]);
            }
            args.extend(["-l".into(), params.level.to_string()]);
        }
    }
    args.push(notification.destination.to_string());
    args.push(String::new());
    args.push(notification.oid.clone());
    args.extend([".1".into(), "s".into(), notification.payload.clone()]);
    args
}

/// Copy of an argv that is safe to log: the values following the `-A` and
/// `-X` flags are masked.
pub fn redacted_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("***".to_string());
            mask_next = false;
            continue;
        }
        mask_next = matches!(arg.as_str(), "-A" | "-X");
        redacted.push(arg.clone());
    }
    redacted
}

/// Sends traps by invoking `snmptrap` once per notification.
pub struct SnmptrapSender {
    program: PathBuf,
}

impl SnmptrapSender {
    /// The binary resolved from `PATH` in normal operation.
    pub const DEFAULT_PROGRAM: &'static str = "snmptrap";

    pub fn new() -> Self {
        Self {
            program: Self::DEFAULT_PROGRAM.into(),
        }
    }

    /// Overrides the binary to invoke, mainly so tests can point at a
    /// recorder script instead of a real net-snmp installation.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SnmptrapSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrapSender for SnmptrapSender {
    fn name(&self) -> &str {
        "snmptrap"
    }

    /// Runs the transport to completion and maps a non-zero exit status to
    /// an error. No timeout is applied; a hung binary stalls the batch.
    async fn send(&self, notification: &TrapNotification) -> Result<(), SendError> {
        let args = build_args(notification);
        debug!(
            destination = %notification.destination,
            args = ?redacted_args(&args),
            "invoking trap transport"
        );
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| SendError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(SendError::CommandFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
