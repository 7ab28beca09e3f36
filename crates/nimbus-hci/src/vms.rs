//! Virtual machine endpoints

use crate::client::HciClient;
use crate::error::Result;
use crate::models::{
    DiskSpec, NicSpec, PowerTransition, TaskRef, VmCloneRequest, VmCreateRequest, VmSummary,
    entities,
};
use serde_json::{Value, json};

/// Handler for VM operations
pub struct VmHandler {
    client: HciClient,
}

impl VmHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    /// List all VMs visible to the session
    pub async fn list(&self) -> Result<Vec<VmSummary>> {
        let body = self.client.get("/v2/vms").await?;
        entities(&body)
    }

    /// Full VM detail payload
    pub async fn get(&self, uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/vms/{}", uuid)).await
    }

    /// Create a VM. Returns the creation task.
    pub async fn create(&self, request: &VmCreateRequest) -> Result<TaskRef> {
        let body = self.client.post("/v2/vms", request).await?;
        TaskRef::from_response(&body)
    }

    /// Delete a VM and everything attached to it. Returns the deletion task.
    pub async fn delete(&self, uuid: &str) -> Result<TaskRef> {
        let body = self.client.delete(&format!("/v2/vms/{}", uuid)).await?;
        TaskRef::from_response(&body)
    }

    /// Clone an existing VM under a new name
    pub async fn clone_vm(&self, uuid: &str, request: &VmCloneRequest) -> Result<TaskRef> {
        let body = self
            .client
            .post(&format!("/v2/vms/{}/clone", uuid), request)
            .await?;
        TaskRef::from_response(&body)
    }

    /// Request a power state transition
    pub async fn set_power_state(
        &self,
        uuid: &str,
        transition: PowerTransition,
    ) -> Result<TaskRef> {
        let body = self
            .client
            .post(
                &format!("/v2/vms/{}/set_power_state", uuid),
                &json!({ "transition": transition }),
            )
            .await?;
        TaskRef::from_response(&body)
    }

    /// Attach a disk to an existing VM
    pub async fn attach_disk(&self, uuid: &str, disk: &DiskSpec) -> Result<TaskRef> {
        let body = self
            .client
            .post(
                &format!("/v2/vms/{}/disks/attach", uuid),
                &json!({ "disks": [disk] }),
            )
            .await?;
        TaskRef::from_response(&body)
    }

    /// Attach a network interface to an existing VM
    pub async fn attach_nic(&self, uuid: &str, nic: &NicSpec) -> Result<TaskRef> {
        let body = self
            .client
            .post(&format!("/v2/vms/{}/nics", uuid), &json!({ "nics": [nic] }))
            .await?;
        TaskRef::from_response(&body)
    }
}
