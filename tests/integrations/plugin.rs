//! End-to-end tests of the host contract: init from a configuration map,
//! send a batch, inspect what reached the transport.

use serde_json::json;
use std::sync::Arc;
use trapcast::config::PluginConfig;
use trapcast::core::{ProtocolInvocation, SecurityLevel};
use trapcast::plugin::SnmpAuditPlugin;
use trapcast::transport::{build_args, test_utils::command_failed, test_utils::FakeTrapSender};

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{reading, start_binding, v2c_host_map, v3_auth_priv_host_map};

fn plugin_with_fake(raw: &serde_json::Value) -> (SnmpAuditPlugin, Arc<FakeTrapSender>) {
    let sender = Arc::new(FakeTrapSender::new());
    let config = PluginConfig::from_host_map(raw).unwrap();
    let plugin = SnmpAuditPlugin::with_sender(config, sender.clone()).unwrap();
    (plugin, sender)
}

#[tokio::test]
async fn test_single_bound_reading_produces_one_trap() {
    // Arrange
    let (plugin, sender) =
        plugin_with_fake(&v2c_host_map("10.0.0.1:162", start_binding()));
    let batch = vec![reading(1, "START", json!({"k": 1}))];

    // Act
    let result = plugin.send(&batch, 1).await;

    // Assert: consumption report, one invocation, exact payload.
    assert_eq!(result.as_tuple(), (true, 1, 1));
    let sent = sender.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination.to_string(), "10.0.0.1:162");
    assert_eq!(sent[0].oid, "1.3.6.1.4.1.9999.1");
    assert_eq!(
        sent[0].payload,
        r#"{"ts":"2024-01-01T00:00:00Z","content":{"k":1}}"#
    );
    assert_eq!(
        sent[0].invocation,
        ProtocolInvocation::V2c {
            community: "public".to_string()
        }
    );
}

#[tokio::test]
async fn test_unbound_readings_are_consumed_without_traps() {
    let (plugin, sender) =
        plugin_with_fake(&v2c_host_map("10.0.0.1:162", start_binding()));
    let batch = vec![
        reading(10, "START", json!({"k": 1})),
        reading(11, "NO_SUCH_ASSET", json!({"k": 2})),
        reading(12, "START", json!({"k": 3})),
    ];

    let result = plugin.send(&batch, 1).await;

    assert_eq!(result.as_tuple(), (true, 12, 3));
    assert_eq!(sender.call_count(), 2);
}

#[tokio::test]
async fn test_backup_destination_failure_leaves_result_unchanged() {
    // Arrange
    let raw = json!({
        "mainDestination": "10.0.0.1:162",
        "backupDestination": "10.0.0.2:162",
        "OIDbindings": start_binding()
    });
    let (plugin, sender) = plugin_with_fake(&raw);
    sender.add_failure("10.0.0.2:162", command_failed("unreachable"));
    let batch = vec![reading(1, "START", json!({"k": 1}))];

    // Act
    let result = plugin.send(&batch, 1).await;

    // Assert: both destinations were attempted, and the host-facing
    // numbers reflect consumption, not per-destination outcomes.
    assert_eq!(result.as_tuple(), (true, 1, 1));
    let sent = sender.notifications();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].destination.to_string(), "10.0.0.1:162");
    assert_eq!(sent[1].destination.to_string(), "10.0.0.2:162");
}

#[tokio::test]
async fn test_primary_destination_failure_still_reaches_backup() {
    let raw = json!({
        "mainDestination": "10.0.0.1:162",
        "backupDestination": "10.0.0.2:162",
        "OIDbindings": start_binding()
    });
    let (plugin, sender) = plugin_with_fake(&raw);
    sender.add_failure("10.0.0.1:162", command_failed("connection refused"));

    let result = plugin
        .send(&[reading(1, "START", json!({"k": 1}))], 1)
        .await;

    assert_eq!(result.as_tuple(), (true, 1, 1));
    assert_eq!(sender.call_count(), 2);
}

#[tokio::test]
async fn test_v3_auth_priv_invocation_carries_full_credentials() {
    // Arrange
    let (plugin, sender) =
        plugin_with_fake(&v3_auth_priv_host_map("10.0.0.1:162", start_binding()));

    // Act
    plugin
        .send(&[reading(1, "START", json!({"k": 1}))], 1)
        .await;

    // Assert: the notification carries validated v3 parameters, and the
    // derived argv has the full escalation chain.
    let sent = sender.notifications();
    let params = match &sent[0].invocation {
        ProtocolInvocation::V3(params) => params,
        other => panic!("expected v3 invocation, got {other:?}"),
    };
    assert_eq!(params.level, SecurityLevel::AuthPriv);
    assert_eq!(params.engine_id, "8000000001020304");
    assert!(params.auth.is_some());
    assert!(params.privacy.is_some());

    let args = build_args(&sent[0]);
    let rendered = args.join(" ");
    assert!(rendered.starts_with("-v3 -e 8000000001020304 -u snmp3user"));
    assert!(rendered.contains("-a SHA -A authpass"));
    assert!(rendered.contains("-x AES -X privpass"));
    assert!(rendered.contains("-l authPriv"));
}

#[tokio::test]
async fn test_malformed_bindings_leave_plugin_operational() {
    // Arrange: truncated bindings blob.
    let raw = json!({
        "mainDestination": "10.0.0.1:162",
        "OIDbindings": "{\"bindings\": ["
    });
    let (plugin, sender) = plugin_with_fake(&raw);

    // Act
    let result = plugin
        .send(&[reading(1, "START", json!({"k": 1}))], 1)
        .await;

    // Assert: the batch is consumed, nothing is sent.
    assert_eq!(result.as_tuple(), (true, 1, 1));
    assert_eq!(sender.call_count(), 0);
}

#[tokio::test]
async fn test_duplicate_binding_resolves_to_the_later_oid() {
    let raw = v2c_host_map(
        "10.0.0.1:162",
        r#"[{"name": "A", "oidValue": "1"}, {"name": "A", "oidValue": "2"}]"#,
    );
    let (plugin, sender) = plugin_with_fake(&raw);

    plugin.send(&[reading(1, "A", json!({}))], 1).await;

    assert_eq!(sender.notifications()[0].oid, "2");
}

#[tokio::test]
async fn test_empty_batch_reports_zero_progress() {
    let (plugin, sender) =
        plugin_with_fake(&v2c_host_map("10.0.0.1:162", start_binding()));
    let result = plugin.send(&[], 1).await;
    assert_eq!(result.as_tuple(), (true, 0, 0));
    assert_eq!(sender.call_count(), 0);
}
