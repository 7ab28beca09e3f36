//! Cluster inventory endpoints
//!
//! In the proxied dialect the fleet manager fronts several clusters; this
//! handler lists them so callers can pick a `cluster_uuid` for
//! [`Dialect::Proxied`](crate::Dialect::Proxied).

use crate::client::HciClient;
use crate::error::Result;
use crate::models::{ClusterSummary, entities};
use serde_json::Value;

/// Handler for cluster inventory
pub struct ClusterHandler {
    client: HciClient,
}

impl ClusterHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ClusterSummary>> {
        let body = self.client.get("/v2/clusters").await?;
        entities(&body)
    }

    pub async fn get(&self, uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/clusters/{}", uuid)).await
    }
}
