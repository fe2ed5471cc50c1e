//! Feeds a [`TableData`] from a live watch on one resource kind.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::serde_json;
use kube::api::{Api, DynamicObject, GroupVersionKind, ResourceExt};
use kube::discovery::{self, Scope};
use kube::runtime::{watcher, watcher::Event, WatchStreamExt};
use kube::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn, Instrument};

use super::{Row, TableData};
use crate::duration::format_duration;
use crate::error::{Error, Result};
use crate::utils::fqn;

const UNKNOWN: &str = "<unknown>";

/// Turns a watched object into display fields matching `header()`.
pub trait RowBuilder: Send + Sync {
    fn header(&self) -> Vec<String>;

    fn build_row(&self, obj: &DynamicObject) -> Row;
}

pub fn row_key(obj: &DynamicObject) -> String {
    fqn(&obj.namespace().unwrap_or_default(), &obj.name_any())
}

fn creation_time(obj: &DynamicObject) -> Option<DateTime<Utc>> {
    let ts = obj.metadata.creation_timestamp.as_ref()?;
    let raw = serde_json::to_value(ts).ok()?;
    DateTime::parse_from_rfc3339(raw.as_str()?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Age as a duration string truncated to seconds, e.g. `403h42m34s`.
pub fn age(obj: &DynamicObject, now: DateTime<Utc>) -> String {
    match creation_time(obj) {
        Some(created) => {
            let secs = now.signed_duration_since(created).num_seconds().max(0);
            format_duration(chrono::TimeDelta::seconds(secs))
        }
        None => UNKNOWN.to_string(),
    }
}

/// NAMESPACE, NAME, AGE.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRows;

impl RowBuilder for DefaultRows {
    fn header(&self) -> Vec<String> {
        ["NAMESPACE", "NAME", "AGE"].map(String::from).to_vec()
    }

    fn build_row(&self, obj: &DynamicObject) -> Row {
        vec![
            obj.namespace().unwrap_or_default(),
            obj.name_any(),
            age(obj, Utc::now()),
        ]
    }
}

/// NAMESPACE, NAME, READY, STATUS, RESTARTS, AGE.
#[derive(Debug, Default, Clone, Copy)]
pub struct PodRows;

impl PodRows {
    fn ready(pod: &Pod) -> String {
        let total = pod.spec.as_ref().map_or(0, |s| s.containers.len());
        let ready = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .map_or(0, |cs| cs.iter().filter(|c| c.ready).count());
        format!("{ready}/{total}")
    }

    fn restarts(pod: &Pod) -> String {
        pod.status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .map_or(0, |cs| cs.iter().map(|c| c.restart_count).sum::<i32>())
            .to_string()
    }

    fn status(pod: &Pod) -> String {
        if pod.metadata.deletion_timestamp.is_some() {
            return "Terminating".to_string();
        }
        let Some(status) = pod.status.as_ref() else {
            return UNKNOWN.to_string();
        };

        let container_reason = status.container_statuses.iter().flatten().find_map(|c| {
            let state = c.state.as_ref()?;
            state
                .waiting
                .as_ref()
                .and_then(|w| w.reason.clone())
                .or_else(|| state.terminated.as_ref().and_then(|t| t.reason.clone()))
        });

        container_reason
            .or_else(|| status.reason.clone())
            .or_else(|| status.phase.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

impl RowBuilder for PodRows {
    fn header(&self) -> Vec<String> {
        ["NAMESPACE", "NAME", "READY", "STATUS", "RESTARTS", "AGE"]
            .map(String::from)
            .to_vec()
    }

    fn build_row(&self, obj: &DynamicObject) -> Row {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        let age = age(obj, Utc::now());

        let pod: Option<Pod> = serde_json::to_value(obj)
            .and_then(serde_json::from_value)
            .map_err(|e| warn!(%name, error = %e, "object is not a pod"))
            .ok();

        match pod {
            Some(pod) => vec![
                namespace,
                name,
                Self::ready(&pod),
                Self::status(&pod),
                Self::restarts(&pod),
                age,
            ],
            None => vec![
                namespace,
                name,
                UNKNOWN.to_string(),
                UNKNOWN.to_string(),
                UNKNOWN.to_string(),
                age,
            ],
        }
    }
}

/// Applies watch events to a table, reconciling rows after each re-list.
#[derive(Default)]
struct RowSync {
    relisting: Option<HashSet<String>>,
}

impl RowSync {
    fn apply(
        &mut self,
        table: &TableData,
        builder: &dyn RowBuilder,
        event: Event<DynamicObject>,
    ) -> Result<()> {
        match event {
            Event::Init => {
                self.relisting = Some(HashSet::new());
            }
            Event::InitApply(obj) => {
                let key = row_key(&obj);
                // still listed: a rejected row keeps its previous version
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(key.clone());
                }
                table.upsert(key, builder.build_row(&obj))?;
            }
            Event::InitDone => {
                if let Some(seen) = self.relisting.take() {
                    let removed = table.retain(|key| seen.contains(key))?;
                    debug!(removed, "row watch re-list complete");
                }
            }
            Event::Apply(obj) => {
                table.upsert(row_key(&obj), builder.build_row(&obj))?;
            }
            Event::Delete(obj) => {
                table.delete(&row_key(&obj))?;
            }
        }
        Ok(())
    }
}

/// A running watch feeding a table. Dropping it stops the watch.
#[derive(Debug)]
pub struct RowWatcher {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RowWatcher {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RowWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Resolves `gvk` and starts watching it into `table`.
///
/// Cluster-scoped kinds ignore `namespace`.
#[tracing::instrument(skip(client, builder, table))]
pub async fn spawn_row_watcher(
    client: Client,
    gvk: GroupVersionKind,
    namespace: Option<String>,
    builder: Arc<dyn RowBuilder>,
    table: Arc<TableData>,
) -> Result<RowWatcher> {
    let (ar, caps) = discovery::pinned_kind(&client, &gvk).await?;
    let api: Api<DynamicObject> = match (namespace.as_deref(), caps.scope) {
        (Some(ns), Scope::Namespaced) => Api::namespaced_with(client, ns, &ar),
        _ => Api::all_with(client, &ar),
    };
    Ok(watch_rows(api, builder, table))
}

pub fn watch_rows(
    api: Api<DynamicObject>,
    builder: Arc<dyn RowBuilder>,
    table: Arc<TableData>,
) -> RowWatcher {
    let cancel = CancellationToken::new();
    let child = cancel.clone();

    let task = tokio::spawn(
        async move {
            let stream = watcher(api, watcher::Config::default()).default_backoff();
            tokio::pin!(stream);
            let mut sync = RowSync::default();

            loop {
                let next = tokio::select! {
                    _ = child.cancelled() => break,
                    next = stream.next() => next,
                };
                let Some(res) = next else { break };
                let applied = res
                    .map_err(Error::from)
                    .and_then(|event| sync.apply(&table, &*builder, event));
                if let Err(e) = applied {
                    warn!(error = %e, "row watch event dropped");
                }
            }
        }
        .instrument(debug_span!("row_watch")),
    );

    RowWatcher { cancel, task }
}
