//! Task status endpoints
//!
//! Mutating calls return a task reference; this handler fetches the task's
//! current status payload. Interpretation of the payload (which field holds
//! the status, which values mean "still running") belongs to
//! [`Dialect`](crate::Dialect).

use crate::client::HciClient;
use crate::error::Result;
use serde_json::Value;

/// Handler for task status lookups
pub struct TaskHandler {
    client: HciClient,
}

impl TaskHandler {
    pub fn new(client: HciClient) -> Self {
        Self { client }
    }

    /// Fetch the current status payload for a task
    pub async fn get(&self, task_uuid: &str) -> Result<Value> {
        self.client.get(&format!("/v2/tasks/{}", task_uuid)).await
    }
}
