//! Trap dispatch: fans one resolved trap out to every configured manager.
//!
//! Destinations are attempted strictly in order (main first, then backup)
//! and independently: a failure is logged and recorded in the report, and
//! never prevents the remaining attempts. The report tells callers what
//! actually happened per destination; the protocol itself acknowledges
//! nothing.

use crate::config::{ConfigError, PluginConfig};
use crate::core::{Destination, ProtocolInvocation, TrapNotification, TrapSender};
use crate::transport::SendError;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Outcome of one destination's send attempt.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub destination: Destination,
    pub result: Result<(), SendError>,
}

/// Everything that happened while dispatching one notification.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// One outcome per configured destination, in delivery order
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    /// True when at least one transport invocation was made. Delivery is
    /// unacknowledged, so this is the strongest claim the protocol allows.
    pub fn attempted(&self) -> bool {
        !self.outcomes.is_empty()
    }

    /// The destinations whose invocation failed outright.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Fans one trap out to the configured destinations through a transport.
pub struct TrapDispatcher {
    destinations: Vec<Destination>,
    invocation: ProtocolInvocation,
    sender: Arc<dyn TrapSender>,
}

impl TrapDispatcher {
    /// Resolves destinations and protocol parameters once, up front.
    /// Credential requirements are checked here, so dispatching can never
    /// fail on missing configuration later.
    pub fn from_config(
        config: &PluginConfig,
        sender: Arc<dyn TrapSender>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            destinations: config.destinations()?,
            invocation: config.invocation()?,
            sender,
        })
    }

    /// The resolved destinations, in delivery order.
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Sends `payload` under `oid` to every destination, one transport
    /// invocation each.
    #[instrument(skip(self, payload), fields(transport = self.sender.name()))]
    pub async fn dispatch(&self, oid: &str, payload: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        for destination in &self.destinations {
            let notification = TrapNotification {
                destination: destination.clone(),
                oid: oid.to_string(),
                payload: payload.to_string(),
                invocation: self.invocation.clone(),
            };
            let result = self.sender.send(&notification).await;
            match &result {
                Ok(()) => {
                    debug!(destination = %destination, "trap handed to transport");
                    metrics::counter!("traps_sent_total").increment(1);
                }
                Err(e) => {
                    error!(destination = %destination, error = %e, "trap transport invocation failed");
                    metrics::counter!(
                        "trap_send_failures_total",
                        "destination" => destination.to_string()
                    )
                    .increment(1);
                }
            }
            report.outcomes.push(DispatchOutcome {
                destination: destination.clone(),
                result,
            });
        }
        report
    }
}
