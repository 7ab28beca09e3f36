//! Subnet workflows.

use serde_json::Value;

use nimbus_hci::{SubnetCreateRequest, TaskRef};

use super::{created_entity_uuid, require_success};
use crate::error::Result;
use crate::progress::ProgressCallback;
use crate::session::Session;
use crate::watch::WatchOptions;

/// Submit a subnet create request and return the task to watch.
pub async fn create_subnet(session: &Session, request: &SubnetCreateRequest) -> Result<TaskRef> {
    let task = session.client().subnets().create(request).await?;
    session.invalidate_subnets().await;
    Ok(task)
}

/// Create a subnet and wait for the task, returning the created
/// subnet.
pub async fn create_subnet_and_wait(
    session: &Session,
    request: &SubnetCreateRequest,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = create_subnet(session, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;

    let uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_subnet(&request.name).await?,
    };
    Ok(session.client().subnets().get(&uuid).await?)
}

/// Submit a subnet delete request and return the task to watch.
pub async fn delete_subnet(session: &Session, subnet_uuid: &str) -> Result<TaskRef> {
    let task = session.client().subnets().delete(subnet_uuid).await?;
    session.invalidate_subnets().await;
    Ok(task)
}

/// Delete a subnet and wait for the task.
pub async fn delete_subnet_and_wait(
    session: &Session,
    subnet_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = delete_subnet(session, subnet_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}
