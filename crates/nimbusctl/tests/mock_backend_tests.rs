//! End-to-end tests running the real binary against a wiremock backend.
//!
//! Credentials come in through `NIMBUS_*` environment variables, so no
//! config file is involved and the child process talks straight to the
//! mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn nimbusctl_against(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("nimbusctl").unwrap();
    cmd.env("NIMBUS_ENDPOINT", server.uri())
        .env("NIMBUS_USERNAME", "admin")
        .env("NIMBUS_PASSWORD", "pw");
    cmd
}

#[test]
fn test_vm_list_json_output() {
    // The server task lives on this runtime's workers while the child
    // process runs; keep the runtime alive until the assertion is done.
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [
                    {"uuid": "9f1e5c2d-0001", "name": "web-01", "power_state": "on",
                     "num_vcpus": 2, "memory_mb": 4096},
                    {"uuid": "9f1e5c2d-0002", "name": "db-01", "power_state": "off"}
                ]
            })))
            .mount(&server)
            .await;
        server
    });

    let output = nimbusctl_against(&server)
        .args(["vm", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web-01"))
        .stdout(predicate::str::contains("db-01"))
        .get_output()
        .stdout
        .clone();

    // Output must be clean JSON, parseable by scripts
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("vm list -o json emits valid JSON");
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    assert_eq!(parsed[0]["name"], "web-01");
}

#[test]
fn test_vm_list_table_output() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [
                    {"uuid": "9f1e5c2d-0001", "name": "web-01", "power_state": "on"}
                ]
            })))
            .mount(&server)
            .await;
        server
    });

    // Table is the default for list commands
    nimbusctl_against(&server)
        .args(["vm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web-01"))
        .stdout(predicate::str::contains("uuid"));
}

#[test]
fn test_vm_list_query_filters_output() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [
                    {"uuid": "9f1e5c2d-0001", "name": "web-01", "power_state": "on"},
                    {"uuid": "9f1e5c2d-0002", "name": "db-01", "power_state": "off"}
                ]
            })))
            .mount(&server)
            .await;
        server
    });

    nimbusctl_against(&server)
        .args(["vm", "list", "-o", "json", "-q", "[?power_state=='on'].name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web-01"))
        .stdout(predicate::str::contains("db-01").not());
}

#[test]
fn test_api_get_adds_version_prefix() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [{"uuid": "c-1", "name": "east-lab"}]
            })))
            .mount(&server)
            .await;
        server
    });

    // Bare resource paths get the /v2 prefix
    nimbusctl_against(&server)
        .args(["api", "get", "/clusters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("east-lab"));
}

#[test]
fn test_api_error_is_reported_with_status() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "vm not found"})),
            )
            .mount(&server)
            .await;
        server
    });

    nimbusctl_against(&server)
        .args(["api", "get", "/vms/missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}
