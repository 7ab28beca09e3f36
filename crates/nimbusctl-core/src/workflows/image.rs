//! Image catalog workflows.

use serde_json::Value;

use nimbus_hci::{ImageCreateRequest, TaskRef};

use super::{created_entity_uuid, require_success};
use crate::error::{CoreError, Result};
use crate::progress::ProgressCallback;
use crate::session::Session;
use crate::watch::WatchOptions;

/// Submit an image create request and return the task to watch.
pub async fn create_image(session: &Session, request: &ImageCreateRequest) -> Result<TaskRef> {
    let task = session.client().images().create(request).await?;
    session.invalidate_images().await;
    Ok(task)
}

/// Create an image and wait for the task, returning the created image.
///
/// With `source_uri` set in the request the backend fetches the
/// content itself and this is the whole job. Without it the image is
/// a placeholder; follow up with [`upload_image_and_wait`].
pub async fn create_image_and_wait(
    session: &Session,
    request: &ImageCreateRequest,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = create_image(session, request).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;

    let uuid = match created_entity_uuid(&outcome.detail) {
        Some(uuid) => uuid,
        None => session.resolve_image(&request.name).await?,
    };
    Ok(session.client().images().get(&uuid).await?)
}

/// Submit an image content upload and return the import task to watch.
///
/// `content` is the raw image bytes; reading them from disk is the
/// caller's problem so this stays usable from tests and servers alike.
pub async fn upload_image(
    session: &Session,
    image_uuid: &str,
    file_name: &str,
    content: Vec<u8>,
) -> Result<TaskRef> {
    if content.is_empty() {
        return Err(CoreError::Validation(format!(
            "refusing to upload empty content as image '{file_name}'"
        )));
    }
    let task = session
        .client()
        .images()
        .upload(image_uuid, file_name, content)
        .await?;
    session.invalidate_images().await;
    Ok(task)
}

/// Upload image content and wait for the import task, returning the
/// refreshed image.
pub async fn upload_image_and_wait(
    session: &Session,
    image_uuid: &str,
    file_name: &str,
    content: Vec<u8>,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let task = upload_image(session, image_uuid, file_name, content).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)?;
    Ok(session.client().images().get(image_uuid).await?)
}

/// Submit an image delete request and return the task to watch.
pub async fn delete_image(session: &Session, image_uuid: &str) -> Result<TaskRef> {
    let task = session.client().images().delete(image_uuid).await?;
    session.invalidate_images().await;
    Ok(task)
}

/// Delete an image and wait for the task.
pub async fn delete_image_and_wait(
    session: &Session,
    image_uuid: &str,
    options: &WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let task = delete_image(session, image_uuid).await?;
    let outcome = session
        .await_task(task.task_uuid, options.clone(), on_progress)
        .await;
    require_success(&outcome)
}
