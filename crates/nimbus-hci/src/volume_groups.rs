//! Volume group endpoints

use crate::client::HciClient;
use crate::error::Result;
use crate::models::{TaskRef, VolumeGroupCreateRequest, VolumeGroupSummary, entities};
use serde_json::{Value, json};

/// Handler for volume group operations
pub struct VolumeGroupHandler {
    client: HciClient,
}

impl VolumeGroupHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<VolumeGroupSummary>> {
        let body = self.client.get("/v2/volume_groups").await?;
        entities(&body)
    }

    pub async fn get(&self, uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/volume_groups/{}", uuid)).await
    }

    pub async fn create(&self, request: &VolumeGroupCreateRequest) -> Result<TaskRef> {
        let body = self.client.post("/v2/volume_groups", request).await?;
        TaskRef::from_response(&body)
    }

    pub async fn delete(&self, uuid: &str) -> Result<TaskRef> {
        let body = self
            .client
            .delete(&format!("/v2/volume_groups/{}", uuid))
            .await?;
        TaskRef::from_response(&body)
    }

    /// Attach the volume group to a VM
    pub async fn attach(&self, uuid: &str, vm_uuid: &str) -> Result<TaskRef> {
        let body = self
            .client
            .post(
                &format!("/v2/volume_groups/{}/attach", uuid),
                &json!({ "vm_uuid": vm_uuid }),
            )
            .await?;
        TaskRef::from_response(&body)
    }

    /// Detach the volume group from a VM
    pub async fn detach(&self, uuid: &str, vm_uuid: &str) -> Result<TaskRef> {
        let body = self
            .client
            .post(
                &format!("/v2/volume_groups/{}/detach", uuid),
                &json!({ "vm_uuid": vm_uuid }),
            )
            .await?;
        TaskRef::from_response(&body)
    }
}
