//! Test doubles for the log pipeline and the view collaborators.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::logs::{LogOptions, LogSink, Tailable};
use crate::ui::{Flash, Loggable};

pub fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Records every flush, including idle ticks.
#[derive(Default)]
pub struct RecordingSink {
    flushes: Mutex<Vec<Vec<String>>>,
}

impl RecordingSink {
    pub fn flush_count(&self) -> usize {
        self.flushes.lock().unwrap().len()
    }

    /// Non-empty flushes in order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.flushes
            .lock()
            .unwrap()
            .iter()
            .filter(|b| !b.is_empty())
            .cloned()
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn flush(&self, lines: &[String]) {
        self.flushes.lock().unwrap().push(lines.to_vec());
    }
}

/// Sends a fixed script of lines, then closes (or waits for cancellation
/// when following).
#[derive(Default)]
pub struct ScriptedSource {
    script: Vec<String>,
    delay: Option<Duration>,
    open_delay: Option<Duration>,
    follow: bool,
    options: Mutex<Option<LogOptions>>,
    token: Mutex<Option<CancellationToken>>,
}

impl ScriptedSource {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: lines(script),
            ..Default::default()
        }
    }

    pub fn follow(mut self) -> Self {
        self.follow = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Holds `logs()` open for `delay` before the stream starts.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub fn last_options(&self) -> Option<LogOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn last_token(&self) -> Option<CancellationToken> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tailable for ScriptedSource {
    async fn logs(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> Result<()> {
        *self.options.lock().unwrap() = Some(opts);
        *self.token.lock().unwrap() = Some(cancel.clone());
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }

        let script = self.script.clone();
        let delay = self.delay;
        let follow = self.follow;
        tokio::spawn(async move {
            for line in script {
                if let Some(delay) = delay {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    sent = out.send(line) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
            if follow {
                cancel.cancelled().await;
            }
        });
        Ok(())
    }
}

/// Refuses every stream.
pub struct FailingSource;

#[async_trait]
impl Tailable for FailingSource {
    async fn logs(
        &self,
        _cancel: CancellationToken,
        _out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> Result<()> {
        Err(Error::stream_open(opts.path(), "container is waiting to start"))
    }
}

/// A parent view whose selection and source can be swapped between loads.
pub struct MockParent {
    pub selection: Mutex<String>,
    pub source: Mutex<Option<Arc<dyn Tailable>>>,
    pub switched: Mutex<Vec<String>>,
}

impl MockParent {
    pub fn new(selection: &str, source: Option<Arc<dyn Tailable>>) -> Self {
        Self {
            selection: Mutex::new(selection.to_string()),
            source: Mutex::new(source),
            switched: Mutex::new(Vec::new()),
        }
    }
}

impl Loggable for MockParent {
    fn get_selection(&self) -> String {
        self.selection.lock().unwrap().clone()
    }

    fn resource_kind(&self) -> String {
        "Pod".to_string()
    }

    fn tailable(&self) -> Option<Arc<dyn Tailable>> {
        self.source.lock().unwrap().clone()
    }

    fn switch_page(&self, title: &str) {
        self.switched.lock().unwrap().push(title.to_string());
    }
}

#[derive(Default)]
pub struct MockFlash {
    pub errors: Mutex<Vec<String>>,
}

impl Flash for MockFlash {
    fn err(&self, err: &Error) {
        self.errors.lock().unwrap().push(err.to_string());
    }
}
