//! Per-connection session state.
//!
//! A [`Session`] owns the client, the task registry, and small typed
//! caches of the inventory listings the CLI keeps asking for (vms,
//! volume groups, images, subnets, clusters). Reads hit the cache
//! unless the caller passes `refresh = true`; mutations invalidate the
//! affected cache so the next read refetches.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use nimbus_hci::{
    ClusterSummary, HciClient, ImageSummary, SubnetSummary, VmSummary, VolumeGroupSummary,
};

use crate::error::{CoreError, Result};
use crate::progress::ProgressCallback;
use crate::registry::{TaskOutcome, TaskRegistry};
use crate::watch::{WatchHandle, WatchOptions, spawn_watch_linked, watch};

/// Connection plus session-scoped state: outcome registry, cancellation
/// root, and inventory caches.
#[derive(Debug)]
pub struct Session {
    client: HciClient,
    registry: Arc<TaskRegistry>,
    cancel: CancellationToken,
    vms: RwLock<Option<Vec<VmSummary>>>,
    volume_groups: RwLock<Option<Vec<VolumeGroupSummary>>>,
    images: RwLock<Option<Vec<ImageSummary>>>,
    subnets: RwLock<Option<Vec<SubnetSummary>>>,
    clusters: RwLock<Option<Vec<ClusterSummary>>>,
}

impl Session {
    #[must_use]
    pub fn new(client: HciClient) -> Self {
        Self {
            client,
            registry: Arc::new(TaskRegistry::new()),
            cancel: CancellationToken::new(),
            vms: RwLock::new(None),
            volume_groups: RwLock::new(None),
            images: RwLock::new(None),
            subnets: RwLock::new(None),
            clusters: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn client(&self) -> &HciClient {
        &self.client
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Root cancellation token. Watches started through this session
    /// use child tokens, so [`Session::shutdown`] stops them all.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel every watch started through this session and wake all
    /// waiters so they observe the aborted outcomes.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.registry.signal_all();
    }

    /// Watch a task inline, honoring the session's cancellation root.
    /// Returns the recorded outcome whatever happens.
    pub async fn await_task(
        &self,
        task_uid: String,
        options: WatchOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Arc<TaskOutcome> {
        watch(
            self.client.clone(),
            self.registry.clone(),
            task_uid,
            options,
            self.cancel.child_token(),
            on_progress,
        )
        .await
    }

    /// Spawn a background watch tied to this session's cancellation
    /// root.
    pub fn watch_task(
        &self,
        task_uid: impl Into<String>,
        options: WatchOptions,
        on_progress: Option<ProgressCallback>,
    ) -> WatchHandle {
        spawn_watch_linked(
            self.client.clone(),
            self.registry.clone(),
            task_uid,
            options,
            &self.cancel,
            on_progress,
        )
    }

    /// Wait for a specific task's outcome to land in the registry.
    pub async fn wait_for(&self, task_uid: &str, timeout: Duration) -> Option<Arc<TaskOutcome>> {
        self.registry.wait_for(task_uid, timeout).await
    }

    /// List vms, from the cache unless `refresh` is set.
    pub async fn vms(&self, refresh: bool) -> Result<Vec<VmSummary>> {
        if !refresh && let Some(cached) = self.vms.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let fresh = self.client.vms().list().await?;
        *self.vms.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// List volume groups, from the cache unless `refresh` is set.
    pub async fn volume_groups(&self, refresh: bool) -> Result<Vec<VolumeGroupSummary>> {
        if !refresh && let Some(cached) = self.volume_groups.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let fresh = self.client.volume_groups().list().await?;
        *self.volume_groups.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// List images, from the cache unless `refresh` is set.
    pub async fn images(&self, refresh: bool) -> Result<Vec<ImageSummary>> {
        if !refresh && let Some(cached) = self.images.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let fresh = self.client.images().list().await?;
        *self.images.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// List subnets, from the cache unless `refresh` is set.
    pub async fn subnets(&self, refresh: bool) -> Result<Vec<SubnetSummary>> {
        if !refresh && let Some(cached) = self.subnets.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let fresh = self.client.subnets().list().await?;
        *self.subnets.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// List clusters, from the cache unless `refresh` is set.
    pub async fn clusters(&self, refresh: bool) -> Result<Vec<ClusterSummary>> {
        if !refresh && let Some(cached) = self.clusters.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let fresh = self.client.clusters().list().await?;
        *self.clusters.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn invalidate_vms(&self) {
        *self.vms.write().await = None;
    }

    pub async fn invalidate_volume_groups(&self) {
        *self.volume_groups.write().await = None;
    }

    pub async fn invalidate_images(&self) {
        *self.images.write().await = None;
    }

    pub async fn invalidate_subnets(&self) {
        *self.subnets.write().await = None;
    }

    /// Resolve a vm by uuid or unique name.
    pub async fn resolve_vm(&self, needle: &str) -> Result<String> {
        if let Some(uuid) = match_one(&self.vms(false).await?, needle, "vm", |v| {
            (&v.uuid, &v.name)
        })? {
            return Ok(uuid);
        }
        // Cache miss; the vm may be newer than the cache. Refresh once.
        match match_one(&self.vms(true).await?, needle, "vm", |v| (&v.uuid, &v.name))? {
            Some(uuid) => Ok(uuid),
            None => Err(CoreError::Validation(format!("no vm matches '{needle}'"))),
        }
    }

    /// Resolve a volume group by uuid or unique name.
    pub async fn resolve_volume_group(&self, needle: &str) -> Result<String> {
        if let Some(uuid) = match_one(&self.volume_groups(false).await?, needle, "volume group", |g| {
            (&g.uuid, &g.name)
        })? {
            return Ok(uuid);
        }
        match match_one(&self.volume_groups(true).await?, needle, "volume group", |g| {
            (&g.uuid, &g.name)
        })? {
            Some(uuid) => Ok(uuid),
            None => Err(CoreError::Validation(format!(
                "no volume group matches '{needle}'"
            ))),
        }
    }

    /// Resolve an image by uuid or unique name.
    pub async fn resolve_image(&self, needle: &str) -> Result<String> {
        if let Some(uuid) = match_one(&self.images(false).await?, needle, "image", |i| {
            (&i.uuid, &i.name)
        })? {
            return Ok(uuid);
        }
        match match_one(&self.images(true).await?, needle, "image", |i| (&i.uuid, &i.name))? {
            Some(uuid) => Ok(uuid),
            None => Err(CoreError::Validation(format!("no image matches '{needle}'"))),
        }
    }

    /// Resolve a subnet by uuid or unique name.
    pub async fn resolve_subnet(&self, needle: &str) -> Result<String> {
        if let Some(uuid) = match_one(&self.subnets(false).await?, needle, "subnet", |s| {
            (&s.uuid, &s.name)
        })? {
            return Ok(uuid);
        }
        match match_one(&self.subnets(true).await?, needle, "subnet", |s| (&s.uuid, &s.name))? {
            Some(uuid) => Ok(uuid),
            None => Err(CoreError::Validation(format!("no subnet matches '{needle}'"))),
        }
    }
}

/// Match by exact uuid first, then by unique name. Ambiguous names are
/// an error; a plain miss is `None` so the caller can refresh and
/// retry.
fn match_one<T>(
    items: &[T],
    needle: &str,
    kind: &str,
    key: impl Fn(&T) -> (&String, &String),
) -> Result<Option<String>> {
    if let Some(hit) = items.iter().find(|item| key(item).0 == needle) {
        return Ok(Some(hit_uuid(key(hit))));
    }
    let matches: Vec<&T> = items.iter().filter(|item| key(item).1 == needle).collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(hit_uuid(key(matches[0])))),
        n => Err(CoreError::Validation(format!(
            "name '{needle}' is ambiguous: {n} {kind}s match; use the uuid"
        ))),
    }
}

fn hit_uuid((uuid, _name): (&String, &String)) -> String {
    uuid.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(uuid: &str, name: &str) -> VmSummary {
        VmSummary {
            uuid: uuid.into(),
            name: name.into(),
            power_state: None,
            num_vcpus: None,
            memory_mb: None,
        }
    }

    #[test]
    fn match_prefers_uuid_over_name() {
        // A vm named like another vm's uuid must not shadow it.
        let items = vec![vm("aaa", "web"), vm("bbb", "aaa")];
        let got = match_one(&items, "aaa", "vm", |v| (&v.uuid, &v.name))
            .unwrap()
            .unwrap();
        assert_eq!(got, "aaa");
    }

    #[test]
    fn ambiguous_name_is_an_error() {
        let items = vec![vm("aaa", "web"), vm("bbb", "web")];
        let err = match_one(&items, "web", "vm", |v| (&v.uuid, &v.name)).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn miss_is_none_not_error() {
        let items = vec![vm("aaa", "web")];
        let got = match_one(&items, "db", "vm", |v| (&v.uuid, &v.name)).unwrap();
        assert!(got.is_none());
    }
}
