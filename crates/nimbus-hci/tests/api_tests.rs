//! Integration tests for the HCI client against a mock server

use nimbus_hci::{
    Dialect, HciClient, ImageCreateRequest, PowerTransition, RestError, SubnetCreateRequest,
    VmCreateRequest, VolumeGroupCreateRequest,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct_client(server: &MockServer) -> HciClient {
    HciClient::builder()
        .base_url(server.uri())
        .username("admin")
        .password("secret")
        .dialect(Dialect::Direct)
        .build()
        .expect("client builds")
}

fn proxied_client(server: &MockServer, cluster_uuid: &str) -> HciClient {
    HciClient::builder()
        .base_url(server.uri())
        .username("admin")
        .password("secret")
        .dialect(Dialect::Proxied {
            cluster_uuid: cluster_uuid.to_string(),
        })
        .build()
        .expect("client builds")
}

// ============================================================================
// List and detail endpoints
// ============================================================================

#[tokio::test]
async fn test_vm_list_parses_entity_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/vms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "total_entities": 2 },
            "entities": [
                { "uuid": "vm-1", "name": "web", "power_state": "on", "num_vcpus": 2 },
                { "uuid": "vm-2", "name": "db", "power_state": "off" }
            ]
        })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let vms = client.vms().list().await.unwrap();

    assert_eq!(vms.len(), 2);
    assert_eq!(vms[0].uuid, "vm-1");
    assert_eq!(vms[0].num_vcpus, Some(2));
    assert_eq!(vms[1].power_state.as_deref(), Some("off"));
}

#[tokio::test]
async fn test_task_get_returns_raw_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/tasks/t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "t-123",
            "status": "running",
            "percentage_complete": 40
        })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let task = client.tasks().get("t-123").await.unwrap();

    assert_eq!(task["status"], "running");
    assert_eq!(task["percentage_complete"], 40);
}

// ============================================================================
// Mutating endpoints return task references
// ============================================================================

#[tokio::test]
async fn test_vm_create_returns_task_ref() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/vms"))
        .and(body_partial_json(json!({ "name": "web-1", "num_vcpus": 2 })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "task_uuid": "t-create-1" })),
        )
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let request = VmCreateRequest {
        name: "web-1".into(),
        num_vcpus: 2,
        memory_mb: 4096,
        ..Default::default()
    };
    let task = client.vms().create(&request).await.unwrap();

    assert_eq!(task.task_uuid, "t-create-1");
}

#[tokio::test]
async fn test_vm_power_state_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/vms/vm-1/set_power_state"))
        .and(body_partial_json(json!({ "transition": "ON" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_uuid": "t-pwr" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let task = client
        .vms()
        .set_power_state("vm-1", PowerTransition::On)
        .await
        .unwrap();
    assert_eq!(task.task_uuid, "t-pwr");
}

#[tokio::test]
async fn test_volume_group_attach() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/volume_groups/vg-1/attach"))
        .and(body_partial_json(json!({ "vm_uuid": "vm-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_uuid": "t-att" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let task = client.volume_groups().attach("vg-1", "vm-1").await.unwrap();
    assert_eq!(task.task_uuid, "t-att");
}

#[tokio::test]
async fn test_volume_group_create_alternate_task_field() {
    let server = MockServer::start().await;

    // Older backends spell the field taskUuid
    Mock::given(method("POST"))
        .and(path("/v2/volume_groups"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "taskUuid": "t-vg" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let request = VolumeGroupCreateRequest {
        name: "data".into(),
        ..Default::default()
    };
    let task = client.volume_groups().create(&request).await.unwrap();
    assert_eq!(task.task_uuid, "t-vg");
}

#[tokio::test]
async fn test_subnet_create_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/subnets"))
        .and(body_partial_json(json!({ "name": "vlan100", "vlan_id": 100 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "task_uuid": "t-net-c" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/subnets/net-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_uuid": "t-net-d" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let request = SubnetCreateRequest {
        name: "vlan100".into(),
        vlan_id: Some(100),
        ..Default::default()
    };
    assert_eq!(
        client.subnets().create(&request).await.unwrap().task_uuid,
        "t-net-c"
    );
    assert_eq!(
        client.subnets().delete("net-1").await.unwrap().task_uuid,
        "t-net-d"
    );
}

#[tokio::test]
async fn test_image_create_from_source_uri() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/images"))
        .and(body_partial_json(
            json!({ "name": "ubuntu", "source_uri": "http://mirror/u.qcow2" }),
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "task_uuid": "t-img" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let request = ImageCreateRequest {
        name: "ubuntu".into(),
        source_uri: Some("http://mirror/u.qcow2".into()),
        ..Default::default()
    };
    let task = client.images().create(&request).await.unwrap();
    assert_eq!(task.task_uuid, "t-img");
}

#[tokio::test]
async fn test_image_upload_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v2/images/img-1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_uuid": "t-up" })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let task = client
        .images()
        .upload("img-1", "disk.qcow2", vec![0u8; 64])
        .await
        .unwrap();
    assert_eq!(task.task_uuid, "t-up");
}

// ============================================================================
// Proxied dialect routing
// ============================================================================

#[tokio::test]
async fn test_proxied_dialect_sends_cluster_param() {
    let server = MockServer::start().await;

    // The mock only matches when the proxy parameter is present
    Mock::given(method("GET"))
        .and(path("/v2/tasks/t-9"))
        .and(query_param("proxyClusterUuid", "cl-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "progress_status": "none" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = proxied_client(&server, "cl-42");
    let task = client.tasks().get("t-9").await.unwrap();
    assert_eq!(task["progress_status"], "none");
}

#[tokio::test]
async fn test_direct_dialect_sends_no_cluster_param() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [ { "uuid": "cl-1", "name": "east", "version": "6.8" } ]
        })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let clusters = client.clusters().list().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].name, "east");
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_not_found_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/vms/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "vm does not exist"
        })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let err = client.vms().get("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_auth_failure_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/vms"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let err = client.vms().list().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/vms"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "message": "upgrade in progress"
        })))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let err = client.vms().list().await.unwrap_err();
    assert!(err.is_server_error());
    assert!(err.is_retryable());
    assert!(err.to_string().contains("upgrade in progress"));
}

#[tokio::test]
async fn test_connection_refused_maps_to_connection_failed() {
    // Nothing listens on this port
    let client = HciClient::builder()
        .base_url("http://127.0.0.1:1")
        .username("admin")
        .password("secret")
        .build()
        .unwrap();

    let err = client.vms().list().await.unwrap_err();
    assert!(
        matches!(err, RestError::ConnectionFailed(_)) || err.is_retryable(),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_empty_body_decodes_to_null() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/vms/vm-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = direct_client(&server);
    let body = client.vms().get("vm-1").await.unwrap();
    assert!(body.is_null());
}
