//! Subnet (virtual network) endpoints

use crate::client::HciClient;
use crate::error::Result;
use crate::models::{SubnetCreateRequest, SubnetSummary, TaskRef, entities};
use serde_json::Value;

/// Handler for subnet operations
pub struct SubnetHandler {
    client: HciClient,
}

impl SubnetHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<SubnetSummary>> {
        let body = self.client.get("/v2/subnets").await?;
        entities(&body)
    }

    pub async fn get(&self, uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/subnets/{}", uuid)).await
    }

    pub async fn create(&self, request: &SubnetCreateRequest) -> Result<TaskRef> {
        let body = self.client.post("/v2/subnets", request).await?;
        TaskRef::from_response(&body)
    }

    pub async fn delete(&self, uuid: &str) -> Result<TaskRef> {
        let body = self.client.delete(&format!("/v2/subnets/{}", uuid)).await?;
        TaskRef::from_response(&body)
    }
}
