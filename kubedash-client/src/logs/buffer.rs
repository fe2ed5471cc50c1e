//! Turns an unbounded stream of log lines into bounded batches for the display.
//!
//! A batch is flushed when it reaches capacity or when the idle window elapses
//! since the previous flush, whichever comes first. The final partial batch is
//! flushed when the stream closes or the session is cancelled.

use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{LogOptions, LogSink, Tailable, LINE_QUEUE_SIZE};
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSettings {
    pub capacity: usize,
    pub flush_timeout: Duration,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BufferSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            capacity: cfg.log_buffer_size.max(1),
            flush_timeout: cfg.flush_timeout(),
        }
    }
}

/// Fixed-capacity, ordered group of lines waiting to be flushed.
#[derive(Debug)]
pub struct LogBatch {
    lines: Vec<String>,
    capacity: usize,
}

impl LogBatch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a line, returning `true` once the batch is full.
    pub fn push(&mut self, line: String) -> bool {
        self.lines.push(line);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Hands the buffered lines to `sink` and resets the count, keeping the storage.
    pub fn flush(&mut self, sink: &dyn LogSink) {
        sink.flush(&self.lines);
        self.lines.clear();
    }
}

/// Spawns the consumer task that batches `rx` into `sink`.
///
/// The task ends when `rx` closes or `cancel` fires; either way the pending
/// lines are flushed before it returns.
pub fn spawn_buffer(
    mut rx: mpsc::Receiver<String>,
    sink: Arc<dyn LogSink>,
    settings: BufferSettings,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut batch = LogBatch::new(settings.capacity);
        let idle = time::sleep(settings.flush_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    rx.close();
                    while let Ok(line) = rx.try_recv() {
                        if batch.push(line) {
                            batch.flush(&*sink);
                        }
                    }
                    batch.flush(&*sink);
                    debug!("log buffer cancelled");
                    return;
                }

                line = rx.recv() => match line {
                    Some(line) => {
                        if batch.push(line) {
                            batch.flush(&*sink);
                            idle.as_mut().reset(Instant::now() + settings.flush_timeout);
                        }
                    }
                    None => {
                        batch.flush(&*sink);
                        debug!("log stream closed");
                        return;
                    }
                },

                _ = &mut idle => {
                    batch.flush(&*sink);
                    idle.as_mut().reset(Instant::now() + settings.flush_timeout);
                }
            }
        }
    })
}

/// One running tail: the cancellation token and the supervised consumer task.
///
/// Dropping a session cancels it.
#[derive(Debug)]
pub struct Session {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Session {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the consumer task has returned.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the consumer task to exit.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Opens a log stream from `source` and starts batching it into `sink`.
///
/// If the source refuses the stream, the error is returned and nothing is left
/// running.
#[tracing::instrument(skip(source, sink))]
pub async fn start_session(
    source: &dyn Tailable,
    opts: LogOptions,
    sink: Arc<dyn LogSink>,
    settings: BufferSettings,
) -> Result<Session> {
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel::<String>(LINE_QUEUE_SIZE);

    let path = opts.path();
    if let Err(e) = source.logs(cancel.clone(), tx, opts).await {
        cancel.cancel();
        return Err(e);
    }

    info!(path = %path, "log session started");
    let task = spawn_buffer(rx, sink, settings, cancel.clone());

    Ok(Session {
        cancel,
        task: Some(task),
    })
}
