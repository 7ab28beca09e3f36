//! Volume group lifecycle workflows.

use serde_json::Value;

use nimbus_hci::{TaskRef, VolumeGroupCreateRequest};

use super::{created_entity_uuid, require_success};
use crate::error::Result;
use crate::progress::ProgressCallback;
use crate::session::Session;
use crate::watch::WatchOptions;

/// Submit a volume group create request and return the task to watch.
pub async fn create_volume_group(
    session: &Session,
    request: &VolumeGroupCreateRequest,
) -> Result<TaskRef> {
    let task = session.client().volume_groups().create(request).await?;
    session.invalidate_volume_groups().await;
    Ok(task)
}

/// Create a volume group and wait for the task, returning the created
/// group.
pub async fn create_volume_group_and_wait(
    session: &Session,
    request: &VolumeGroupCreateRequest,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = create_volume_group(session, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;

    let uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_volume_group(&request.name).await?,
    };
    Ok(session.client().volume_groups().get(&uuid).await?)
}

/// Submit a volume group delete request and return the task to watch.
pub async fn delete_volume_group(session: &Session, vg_uuid: &str) -> Result<TaskRef> {
    let task = session.client().volume_groups().delete(vg_uuid).await?;
    session.invalidate_volume_groups().await;
    Ok(task)
}

/// Delete a volume group and wait for the task.
pub async fn delete_volume_group_and_wait(
    session: &Session,
    vg_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = delete_volume_group(session, vg_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}

/// Submit a volume group attach and return the task to watch.
pub async fn attach_volume_group(
    session: &Session,
    vg_uuid: &str,
    vm_uuid: &str,
) -> Result<TaskRef> {
    let task = session
        .client()
        .volume_groups()
        .attach(vg_uuid, vm_uuid)
        .await?;
    session.invalidate_volume_groups().await;
    Ok(task)
}

/// Attach a volume group to a vm and wait for the task.
pub async fn attach_volume_group_and_wait(
    session: &Session,
    vg_uuid: &str,
    vm_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = attach_volume_group(session, vg_uuid, vm_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}

/// Submit a volume group detach and return the task to watch.
pub async fn detach_volume_group(
    session: &Session,
    vg_uuid: &str,
    vm_uuid: &str,
) -> Result<TaskRef> {
    let task = session
        .client()
        .volume_groups()
        .detach(vg_uuid, vm_uuid)
        .await?;
    session.invalidate_volume_groups().await;
    Ok(task)
}

/// Detach a volume group from a vm and wait for the task.
pub async fn detach_volume_group_and_wait(
    session: &Session,
    vg_uuid: &str,
    vm_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = detach_volume_group(session, vg_uuid, vm_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}
