//! Integration tests for harness configuration loading: TOML file,
//! environment variables, and CLI arguments layered over the defaults.
//!
//! Every test is `#[serial]`: each load reads `TRAPCAST_`-prefixed
//! environment variables, and one test mutates them process-wide.

use clap::Parser;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use trapcast::cli::Cli;
use trapcast::config::PluginConfig;
use trapcast::core::{AuthProtocol, PrivProtocol, SecurityLevel, SnmpVersion};

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    let path = file.path().to_path_buf();
    test_fn(path);
}

fn cli_with_config(path: &std::path::Path) -> Cli {
    Cli::try_parse_from([
        "trapcast",
        "--readings",
        "readings.json",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap()
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        main_destination = "manager-a:162"
        backup_destination = "manager-b:10162"
        oid_bindings = '[{"name": "A", "oidValue": "1.2.3"}]'
        snmp_version = "v3"
        engine_id = "8000000001020304"
        security = "authPriv"
        user = "snmp3user"
        auth_type = "MD5"
        auth_password = "authpass"
        priv_type = "DES"
        priv_password = "privpass"
    "#;

    with_config_file(toml_content, |path| {
        let config = PluginConfig::load(&cli_with_config(&path)).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.main_destination, "manager-a:162");
        assert_eq!(config.backup_destination, "manager-b:10162");
        assert_eq!(config.snmp_version, SnmpVersion::V3);
        assert_eq!(config.security, SecurityLevel::AuthPriv);

        let params = config.security_params().unwrap();
        assert_eq!(params.engine_id, "8000000001020304");
        assert_eq!(params.auth.as_ref().unwrap().protocol, AuthProtocol::Md5);
        assert_eq!(params.privacy.as_ref().unwrap().protocol, PrivProtocol::Des);
    });
}

#[test]
#[serial]
fn test_load_partial_config_uses_defaults() {
    let toml_content = r#"
        main_destination = "manager:162"
    "#;

    with_config_file(toml_content, |path| {
        let config = PluginConfig::load(&cli_with_config(&path)).unwrap();

        // Value from file
        assert_eq!(config.main_destination, "manager:162");

        // Values from Default
        assert_eq!(config.log_level, "info");
        assert_eq!(config.snmp_version, SnmpVersion::V2c);
        assert_eq!(config.community, "public");
        assert!(config.backup_destination.is_empty());
        assert!(config.bindings_file.is_none());
    });
}

#[test]
#[serial]
fn test_no_config_file_means_pure_defaults() {
    let cli = Cli::try_parse_from(["trapcast", "--readings", "readings.json"]).unwrap();
    let config = PluginConfig::load(&cli).unwrap();
    assert_eq!(config.main_destination, "127.0.0.1:162");
    assert_eq!(config.snmp_version, SnmpVersion::V2c);
}

#[test]
#[serial]
fn test_invalid_value_type_is_reported() {
    let toml_content = r#"
        snmp_version = "v4"
    "#;

    with_config_file(toml_content, |path| {
        let result = PluginConfig::load(&cli_with_config(&path));
        assert!(result.is_err());
        let error_string = result.unwrap_err().to_string();
        assert!(
            error_string.contains("snmp_version"),
            "unexpected error: {error_string}"
        );
    });
}

#[test]
#[serial]
fn test_incomplete_v3_credentials_are_rejected_at_load() {
    let toml_content = r#"
        main_destination = "manager:162"
        snmp_version = "v3"
        engine_id = "8000000001020304"
        security = "authNoPriv"
        user = "snmp3user"
    "#;

    with_config_file(toml_content, |path| {
        let result = PluginConfig::load(&cli_with_config(&path));
        let error_string = result.unwrap_err().to_string();
        assert!(
            error_string.contains("auth_type"),
            "unexpected error: {error_string}"
        );
    });
}

#[test]
#[serial]
fn test_non_existent_config_file_is_an_error() {
    let cli = Cli::try_parse_from([
        "trapcast",
        "--readings",
        "readings.json",
        "--config",
        "/path/to/non/existent/config.toml",
    ])
    .unwrap();
    let result = PluginConfig::load(&cli);
    assert!(result.is_err());
    let error_string = result.unwrap_err().to_string();
    assert!(error_string.contains("config file not found"));
}

#[test]
#[serial]
fn test_cli_destination_override_wins_over_file() {
    let toml_content = r#"
        main_destination = "from-file:162"
    "#;

    with_config_file(toml_content, |path| {
        let cli = Cli::try_parse_from([
            "trapcast",
            "--readings",
            "readings.json",
            "--config",
            path.to_str().unwrap(),
            "--destination",
            "from-cli:162",
        ])
        .unwrap();
        let config = PluginConfig::load(&cli).unwrap();
        assert_eq!(config.main_destination, "from-cli:162");
    });
}

#[test]
#[serial]
fn test_environment_overrides_file_but_not_cli() {
    let toml_content = r#"
        community = "from-file"
        main_destination = "from-file:162"
    "#;

    with_config_file(toml_content, |path| {
        std::env::set_var("TRAPCAST_COMMUNITY", "from-env");
        std::env::set_var("TRAPCAST_MAIN_DESTINATION", "from-env:162");

        let cli = Cli::try_parse_from([
            "trapcast",
            "--readings",
            "readings.json",
            "--config",
            path.to_str().unwrap(),
            "--destination",
            "from-cli:162",
        ])
        .unwrap();
        let config = PluginConfig::load(&cli);

        std::env::remove_var("TRAPCAST_COMMUNITY");
        std::env::remove_var("TRAPCAST_MAIN_DESTINATION");

        let config = config.unwrap();
        assert_eq!(config.community, "from-env");
        assert_eq!(config.main_destination, "from-cli:162");
    });
}
