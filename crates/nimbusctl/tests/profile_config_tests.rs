//! Profile management round-trips against a temporary config file.
//!
//! Every test pins the config location with `--config-file`, so a real
//! config on the developer's machine is never read or written.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nimbusctl() -> Command {
    Command::cargo_bin("nimbusctl").unwrap()
}

/// Temp dir plus the config path inside it. Keep the dir alive for the
/// duration of the test.
fn temp_config() -> (TempDir, String) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir
        .path()
        .join("config.toml")
        .to_str()
        .expect("utf-8 temp path")
        .to_string();
    (dir, path)
}

fn set_profile(config: &str, name: &str, extra: &[&str]) {
    let mut args = vec![
        "--config-file",
        config,
        "profile",
        "set",
        name,
        "--endpoint",
        "https://prism.example.com:9440",
        "--username",
        "admin",
        "--password",
        "hunter2",
    ];
    args.extend_from_slice(extra);
    nimbusctl().args(&args).assert().success();
}

#[test]
fn test_profile_set_and_list() {
    let (_dir, config) = temp_config();

    nimbusctl()
        .args([
            "--config-file",
            &config,
            "profile",
            "set",
            "dev",
            "--endpoint",
            "https://prism.example.com:9440",
            "--username",
            "admin",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'dev' saved"));

    nimbusctl()
        .args(["--config-file", &config, "profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("https://prism.example.com:9440"));
}

#[test]
fn test_profile_list_empty() {
    let (_dir, config) = temp_config();

    nimbusctl()
        .args(["--config-file", &config, "profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_profile_show_masks_password() {
    let (_dir, config) = temp_config();
    set_profile(&config, "dev", &[]);

    nimbusctl()
        .args(["--config-file", &config, "profile", "show", "dev", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_profile_set_proxied_roundtrip() {
    let (_dir, config) = temp_config();
    set_profile(
        &config,
        "fleet",
        &[
            "--dialect",
            "proxied",
            "--cluster-uuid",
            "0005a2b4-89fa-4be3-a1c2-0de7f3c8a9b1",
        ],
    );

    nimbusctl()
        .args(["--config-file", &config, "profile", "show", "fleet", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proxied"))
        .stdout(predicate::str::contains("0005a2b4-89fa-4be3-a1c2-0de7f3c8a9b1"));
}

#[test]
fn test_profile_overwrite_updates_endpoint() {
    let (_dir, config) = temp_config();
    set_profile(&config, "dev", &[]);

    nimbusctl()
        .args([
            "--config-file",
            &config,
            "profile",
            "set",
            "dev",
            "--endpoint",
            "https://prism2.example.com:9440",
            "--username",
            "admin",
        ])
        .assert()
        .success();

    nimbusctl()
        .args(["--config-file", &config, "profile", "show", "dev", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prism2.example.com"));
}

#[test]
fn test_profile_default_selection() {
    let (_dir, config) = temp_config();
    set_profile(&config, "dev", &[]);
    set_profile(&config, "staging", &[]);

    nimbusctl()
        .args(["--config-file", &config, "profile", "default", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default profile set to 'staging'"));

    nimbusctl()
        .args(["--config-file", &config, "profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default\": true"));
}

#[test]
fn test_profile_default_unknown_fails() {
    let (_dir, config) = temp_config();

    nimbusctl()
        .args(["--config-file", &config, "profile", "default", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_profile_remove() {
    let (_dir, config) = temp_config();
    set_profile(&config, "dev", &[]);

    nimbusctl()
        .args(["--config-file", &config, "profile", "remove", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'dev' removed"));

    nimbusctl()
        .args(["--config-file", &config, "profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"dev\"").not());

    nimbusctl()
        .args(["--config-file", &config, "profile", "remove", "dev"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_profile_path_flag() {
    let (_dir, config) = temp_config();

    nimbusctl()
        .args(["--config-file", &config, "profile", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&config));
}

#[test]
fn test_unknown_profile_fails_resolution() {
    let (_dir, config) = temp_config();
    set_profile(&config, "dev", &[]);

    nimbusctl()
        .args(["--config-file", &config, "-p", "ghost", "vm", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

// ====== Wait Flag Validation ======

// These use environment credentials so the client builds without a
// profile; the validation fails before any request is made.

#[test]
fn test_vm_create_power_on_requires_wait() {
    nimbusctl()
        .env("NIMBUS_ENDPOINT", "https://127.0.0.1:9440")
        .env("NIMBUS_USERNAME", "admin")
        .env("NIMBUS_PASSWORD", "pw")
        .args(["vm", "create", "web-01", "--power-on"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("require --wait"));
}

#[test]
fn test_vm_create_volume_group_requires_wait() {
    nimbusctl()
        .env("NIMBUS_ENDPOINT", "https://127.0.0.1:9440")
        .env("NIMBUS_USERNAME", "admin")
        .env("NIMBUS_PASSWORD", "pw")
        .args(["vm", "create", "web-01", "--volume-group", "data-vg"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("require --wait"));
}
