use async_trait::async_trait;
use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::LogParams;
use kube::{Api, Client};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{LogOptions, Tailable};
use crate::error::{Error, Result};

/// Follows pod container logs through the API server.
#[derive(Clone)]
pub struct PodLogs {
    client: Client,
}

impl PodLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn log_params(opts: &LogOptions) -> LogParams {
    LogParams {
        follow: true,
        container: opts.container.clone().filter(|c| !c.is_empty()),
        tail_lines: (opts.lines > 0).then_some(opts.lines),
        previous: opts.previous,
        ..LogParams::default()
    }
}

#[async_trait]
impl Tailable for PodLogs {
    #[tracing::instrument(skip(self, cancel, out))]
    async fn logs(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> Result<()> {
        let pods: Api<Pod> = if opts.namespace.is_empty() {
            Api::default_namespaced(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), &opts.namespace)
        };

        let path = opts.path();
        let stream = pods
            .log_stream(&opts.name, &log_params(&opts))
            .await
            .map_err(|e| Error::stream_open(path.clone(), e))?;

        tokio::spawn(async move {
            let mut lines = stream.lines();
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = lines.try_next() => next,
                };
                match next {
                    Ok(Some(line)) => {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            sent = out.send(line) => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // treated like the stream ending: the consumer flushes and exits
                        warn!(path = %path, error = %e, "log stream error");
                        break;
                    }
                }
            }
            debug!(path = %path, "log stream ended");
        });

        Ok(())
    }
}
