//! Config file resolution tests
//!
//! Uses serial_test to prevent ENV variable race conditions: these tests
//! point XDG_CONFIG_HOME at a temporary directory.

use auscult_common::config::{load_or_default, resolve_config_path, TomlConfig};
use serial_test::serial;
use std::env;
use std::fs;

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_default_location_file_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("auscult");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "port = 7001\n").unwrap();

    let previous = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let resolved = resolve_config_path(None);
    let config = load_or_default(None).unwrap();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(resolved, Some(config_dir.join("config.toml")));
    assert_eq!(config.port, Some(7001));
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_no_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let previous = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let resolved = resolve_config_path(None);
    let config = load_or_default(None);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    // A system-wide /etc/auscult/config.toml would legitimately take over here
    if resolved.is_none() {
        assert_eq!(config.unwrap(), TomlConfig::default());
    }
}
