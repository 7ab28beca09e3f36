//! Higher-level workflows that compose client calls with task watches.
//!
//! Each mutation comes in two forms: an issue form that fires the
//! request and hands back the [`TaskRef`](nimbus_hci::TaskRef), and an
//! `_and_wait` form that watches the task to completion and turns a
//! non-success outcome into the matching error. Composite workflows
//! (see [`vm::provision_vm_and_wait`]) roll back what they created
//! when a later stage fails.

pub mod image;
pub mod subnet;
pub mod vm;
pub mod volume_group;

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::progress::ProgressCallback;
use crate::registry::TaskOutcome;

/// Fail with the outcome's error unless the task succeeded.
pub(crate) fn require_success(outcome: &TaskOutcome) -> Result<()> {
    match outcome.to_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Uuid of the entity a task created, when the task payload names one.
pub(crate) fn created_entity_uuid(detail: &Value) -> Option<String> {
    for key in ["entity_uuid", "entityUuid", "entity_id"] {
        if let Some(uuid) = detail.get(key).and_then(Value::as_str) {
            return Some(uuid.to_string());
        }
    }
    detail
        .get("entity_list")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(|entity| {
            for key in ["entity_uuid", "entity_id", "uuid"] {
                if let Some(uuid) = entity.get(key).and_then(Value::as_str) {
                    return Some(uuid.to_string());
                }
            }
            None
        })
}

/// Re-issue a shared progress callback for one stage of a composite
/// workflow. The plain callback type is single-owner; composites wrap
/// theirs in an `Arc` and hand each watch a forwarding closure.
pub(crate) fn fork_progress(
    progress: &Option<Arc<ProgressCallback>>,
) -> Option<ProgressCallback> {
    progress.as_ref().map(|shared| {
        let shared = shared.clone();
        Box::new(move |event| (*shared)(event)) as ProgressCallback
    })
}
