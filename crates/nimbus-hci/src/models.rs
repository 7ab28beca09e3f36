//! Request and response models for the HCI management API
//!
//! List endpoints wrap their results in an `{"entities": [...]}` envelope;
//! mutating endpoints reply immediately with a task reference instead of
//! the final resource. Detail payloads stay as raw JSON because their
//! shape varies between backend versions.

use crate::error::{RestError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to an asynchronously executing task, as returned by every
/// mutating endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub task_uuid: String,
}

impl TaskRef {
    /// Extract the task reference from a mutating call's response body.
    ///
    /// Field naming drifted across backend versions, so probe the known
    /// spellings before giving up.
    pub fn from_response(body: &Value) -> Result<Self> {
        for key in ["task_uuid", "taskUuid", "uuid"] {
            if let Some(uuid) = body.get(key).and_then(Value::as_str) {
                return Ok(TaskRef {
                    task_uuid: uuid.to_string(),
                });
            }
        }
        Err(RestError::InvalidResponse(format!(
            "response carries no task identifier: {}",
            body
        )))
    }
}

/// Parse the `entities` array out of a list response envelope
pub(crate) fn entities<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>> {
    let list = body
        .get("entities")
        .and_then(Value::as_array)
        .ok_or_else(|| RestError::InvalidResponse("missing entities array".to_string()))?;
    list.iter()
        .map(|e| {
            serde_json::from_value(e.clone())
                .map_err(|err| RestError::InvalidResponse(err.to_string()))
        })
        .collect()
}

// ====== Virtual Machines ======

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_vcpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmCreateRequest {
    pub name: String,
    pub num_vcpus: u32,
    pub memory_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<DiskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nics: Vec<NicSpec>,
}

/// Disk to create or attach. Either a blank disk of `size_mb` or a clone
/// of an existing image when `image_uuid` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_container: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NicSpec {
    pub subnet_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmCloneRequest {
    pub name: String,
}

/// Power state transition accepted by the set-power-state endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerTransition {
    On,
    Off,
}

impl PowerTransition {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerTransition::On => "ON",
            PowerTransition::Off => "OFF",
        }
    }
}

// ====== Volume Groups ======

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeGroupSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeGroupCreateRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<DiskSpec>,
}

// ====== Images ======

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageCreateRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// `DISK_IMAGE` or `ISO_IMAGE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// When set, the backend fetches the image content from this URL;
    /// otherwise content is supplied later via the upload endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

// ====== Subnets ======

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetCreateRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

// ====== Clusters ======

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_nodes: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_ref_field_spellings() {
        let body = json!({"task_uuid": "t-1"});
        assert_eq!(TaskRef::from_response(&body).unwrap().task_uuid, "t-1");

        let body = json!({"taskUuid": "t-2"});
        assert_eq!(TaskRef::from_response(&body).unwrap().task_uuid, "t-2");

        let body = json!({"uuid": "t-3"});
        assert_eq!(TaskRef::from_response(&body).unwrap().task_uuid, "t-3");

        let body = json!({"value": true});
        assert!(TaskRef::from_response(&body).is_err());
    }

    #[test]
    fn test_entities_envelope() {
        let body = json!({
            "metadata": {"total_entities": 2},
            "entities": [
                {"uuid": "vm-1", "name": "web", "power_state": "on"},
                {"uuid": "vm-2", "name": "db"}
            ]
        });
        let vms: Vec<VmSummary> = entities(&body).unwrap();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[0].name, "web");
        assert_eq!(vms[0].power_state.as_deref(), Some("on"));
        assert_eq!(vms[1].power_state, None);

        let missing = json!({"metadata": {}});
        assert!(entities::<VmSummary>(&missing).is_err());
    }

    #[test]
    fn test_create_request_skips_empty_fields() {
        let req = VmCreateRequest {
            name: "web-1".into(),
            num_vcpus: 2,
            memory_mb: 4096,
            ..Default::default()
        };
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("disks").is_none());
        assert!(body.get("nics").is_none());
        assert!(body.get("description").is_none());
        assert_eq!(body["num_vcpus"], 2);
    }

    #[test]
    fn test_power_transition_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(PowerTransition::On).unwrap(),
            json!("ON")
        );
        assert_eq!(PowerTransition::Off.as_str(), "OFF");
    }
}
