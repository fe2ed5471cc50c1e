//! Log tailing: the source capability, the batching consumer and the
//! kube-backed pod source.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

pub mod buffer;
pub mod pod;

pub use buffer::{spawn_buffer, start_session, BufferSettings, LogBatch, Session};
pub use pod::PodLogs;

/// Queue depth between a log source and its batching consumer.
pub const LINE_QUEUE_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub namespace: String,
    pub name: String,
    pub container: Option<String>,
    pub lines: i64,
    pub previous: bool,
}

impl LogOptions {
    pub fn path(&self) -> String {
        crate::utils::fqn(&self.namespace, &self.name)
    }
}

/// A resource that can stream its logs.
///
/// On success, implementations write lines to `out` until `cancel` fires or the
/// remote stream ends, then drop `out` so the consumer sees the queue close.
/// On failure nothing is written.
#[async_trait]
pub trait Tailable: Send + Sync {
    async fn logs(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> Result<()>;
}

/// Receives flushed batches. An empty slice is an idle tick.
pub trait LogSink: Send + Sync {
    fn flush(&self, lines: &[String]);
}
