//! Vm lifecycle workflows.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use nimbus_hci::{DiskSpec, NicSpec, PowerTransition, TaskRef, VmCloneRequest, VmCreateRequest};

use super::{created_entity_uuid, fork_progress, require_success, volume_group};
use crate::error::{CoreError, Result, RollbackOutcome};
use crate::progress::ProgressCallback;
use crate::session::Session;
use crate::watch::WatchOptions;

/// Submit a vm create request and return the task to watch.
pub async fn create_vm(session: &Session, request: &VmCreateRequest) -> Result<TaskRef> {
    let task = session.client().vms().create(request).await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Create a vm and wait for the task, returning the created vm.
///
/// The created vm is located through the task payload when it names
/// the new entity, falling back to a lookup by the requested name.
pub async fn create_vm_and_wait(
    session: &Session,
    request: &VmCreateRequest,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = create_vm(session, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;

    let uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_vm(&request.name).await?,
    };
    Ok(session.client().vms().get(&uuid).await?)
}

/// Submit a vm delete request and return the task to watch.
pub async fn delete_vm(session: &Session, vm_uuid: &str) -> Result<TaskRef> {
    let task = session.client().vms().delete(vm_uuid).await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Delete a vm and wait for the task.
pub async fn delete_vm_and_wait(
    session: &Session,
    vm_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = delete_vm(session, vm_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}

/// Submit a vm clone request and return the task to watch.
pub async fn clone_vm(
    session: &Session,
    source_uuid: &str,
    request: &VmCloneRequest,
) -> Result<TaskRef> {
    let task = session.client().vms().clone_vm(source_uuid, request).await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Clone a vm and wait for the task, returning the new vm.
pub async fn clone_vm_and_wait(
    session: &Session,
    source_uuid: &str,
    request: &VmCloneRequest,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = clone_vm(session, source_uuid, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;

    let uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_vm(&request.name).await?,
    };
    Ok(session.client().vms().get(&uuid).await?)
}

/// Submit a power state change and return the task to watch.
pub async fn set_power_state(
    session: &Session,
    vm_uuid: &str,
    transition: PowerTransition,
) -> Result<TaskRef> {
    let task = session
        .client()
        .vms()
        .set_power_state(vm_uuid, transition)
        .await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Change a vm's power state and wait for the task, returning the
/// refreshed vm.
pub async fn set_power_state_and_wait(
    session: &Session,
    vm_uuid: &str,
    transition: PowerTransition,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = set_power_state(session, vm_uuid, transition).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;
    Ok(session.client().vms().get(vm_uuid).await?)
}

/// Submit a disk attach and return the task to watch.
pub async fn attach_disk(session: &Session, vm_uuid: &str, disk: &DiskSpec) -> Result<TaskRef> {
    let task = session.client().vms().attach_disk(vm_uuid, disk).await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Attach a disk to a vm and wait for the task, returning the
/// refreshed vm.
pub async fn attach_disk_and_wait(
    session: &Session,
    vm_uuid: &str,
    disk: &DiskSpec,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = attach_disk(session, vm_uuid, disk).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;
    Ok(session.client().vms().get(vm_uuid).await?)
}

/// Submit a nic attach and return the task to watch.
pub async fn attach_nic(session: &Session, vm_uuid: &str, nic: &NicSpec) -> Result<TaskRef> {
    let task = session.client().vms().attach_nic(vm_uuid, nic).await?;
    session.invalidate_vms().await;
    Ok(task)
}

/// Attach a nic to a vm and wait for the task, returning the refreshed
/// vm.
pub async fn attach_nic_and_wait(
    session: &Session,
    vm_uuid: &str,
    nic: &NicSpec,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = attach_nic(session, vm_uuid, nic).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;
    Ok(session.client().vms().get(vm_uuid).await?)
}

/// Create a vm, attach volume groups, and optionally power it on.
///
/// This workflow:
/// 1. Submits the create request and waits for its task
/// 2. Attaches each volume group in order, waiting for each task
/// 3. Powers the vm on when asked to
/// 4. Returns the finished vm
///
/// When a stage fails after the vm exists, the vm (with whatever was
/// attached so far) is deleted again before the error is returned.
/// That compensating delete is awaited, retried once when its failure
/// looks transient, and its result travels in the returned
/// [`CoreError::Provision`] so callers can tell a clean rollback from
/// one that needs manual cleanup.
///
/// # Arguments
///
/// * `session` - The connection session
/// * `request` - The vm create request
/// * `volume_groups` - Uuids of volume groups to attach
/// * `power_on` - Whether to power the vm on at the end
/// * `options` - Watch options applied to every task in the workflow
/// * `on_progress` - Optional callback, shared by every stage
pub async fn provision_vm_and_wait(
    session: &Session,
    request: &VmCreateRequest,
    volume_groups: &[String],
    power_on: bool,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let progress = on_progress.map(Arc::new);

    let task = create_vm(session, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), fork_progress(&progress))
        .await;
    if let Err(cause) = require_success(&outcome) {
        // A failed create can still leave a partial vm behind; the
        // task payload names it when it does.
        if let Some(uuid) = created_entity_uuid(&outcome.detail) {
            let rollback = compensate_delete_vm(session, &uuid, options).await;
            return Err(provision_error(&request.name, cause, rollback));
        }
        return Err(cause);
    }

    let vm_uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_vm(&request.name).await?,
    };

    for vg_uuid in volume_groups {
        if let Err(cause) = volume_group::attach_volume_group_and_wait(
            session,
            vg_uuid,
            &vm_uuid,
            options,
            fork_progress(&progress),
        )
        .await
        {
            let rollback = compensate_delete_vm(session, &vm_uuid, options).await;
            return Err(provision_error(&request.name, cause, rollback));
        }
    }

    if power_on
        && let Err(cause) = set_power_state_and_wait(
            session,
            &vm_uuid,
            PowerTransition::On,
            options,
            fork_progress(&progress),
        )
        .await
    {
        let rollback = compensate_delete_vm(session, &vm_uuid, options).await;
        return Err(provision_error(&request.name, cause, rollback));
    }

    Ok(session.client().vms().get(&vm_uuid).await?)
}

fn provision_error(vm_name: &str, cause: CoreError, rollback: RollbackOutcome) -> CoreError {
    CoreError::Provision {
        resource: format!("vm '{vm_name}'"),
        cause: Box::new(cause),
        rollback,
    }
}

/// Delete a partially provisioned vm, awaiting the delete task.
///
/// Retried once when the first attempt fails for a reason worth
/// retrying. A vm that is already gone counts as a clean rollback.
async fn compensate_delete_vm(
    session: &Session,
    vm_uuid: &str,
    options: &WatchOptions,
) -> RollbackOutcome {
    match delete_vm_and_wait(session, vm_uuid, options, None).await {
        Ok(()) => RollbackOutcome::Completed,
        Err(err) if err.is_not_found() => RollbackOutcome::Completed,
        Err(err) if err.is_retryable() => {
            warn!(vm_uuid, error = %err, "compensating delete failed, retrying once");
            match delete_vm_and_wait(session, vm_uuid, options, None).await {
                Ok(()) => RollbackOutcome::Completed,
                Err(retry) if retry.is_not_found() => RollbackOutcome::Completed,
                Err(retry) => RollbackOutcome::Failed {
                    reason: retry.to_string(),
                },
            }
        }
        Err(err) => RollbackOutcome::Failed {
            reason: err.to_string(),
        },
    }
}
