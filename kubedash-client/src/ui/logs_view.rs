//! The log view controller.
//!
//! A `LogsView` owns at most one live [`Session`]. Every (re)load stops the
//! previous session before starting the next, and each session writes through
//! a generation-stamped sink so that a batch still in flight from a replaced
//! session never reaches the page.

use crossterm::event::KeyEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::title::{format_title, title_line};
use super::{ActionHandler, Flash, LogView, Loggable, Skin};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logs::{start_session, BufferSettings, LogOptions, Session};
use crate::utils::namespaced;

/// Shown in place of logs when a load fails.
pub const NO_LOGS_MSG: &str = "😂 Doh! No logs are available at this time. Check again later on...";

struct State {
    parent: Arc<dyn Loggable>,
    /// Parent page to return to on back.
    title: String,
    container: String,
    show_previous: bool,
    page: Arc<LogView>,
    session: Option<Session>,
}

pub struct LogsView {
    state: Mutex<State>,
    generation: AtomicU64,
    flash: Arc<dyn Flash>,
    config: Config,
    skin: Skin,
}

impl LogsView {
    pub fn new(
        title: impl Into<String>,
        parent: Arc<dyn Loggable>,
        flash: Arc<dyn Flash>,
        config: Config,
    ) -> Self {
        let config = config.normalized();
        Self {
            state: Mutex::new(State {
                parent,
                title: title.into(),
                container: String::new(),
                show_previous: false,
                page: Arc::new(LogView::new("", config.log_view_lines)),
                session: None,
            }),
            generation: AtomicU64::new(0),
            flash,
            config,
            skin: Skin::default(),
        }
    }

    pub fn with_skin(mut self, skin: Skin) -> Self {
        self.skin = skin;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the page with a fresh one for `container` and loads it.
    pub async fn reload(
        &self,
        container: &str,
        parent: Arc<dyn Loggable>,
        title: &str,
        show_previous: bool,
    ) {
        {
            let mut state = self.state();
            state.parent = parent;
            state.title = title.to_string();
            state.container = container.to_string();
            state.show_previous = show_previous;
            state.page = Arc::new(LogView::new(container, self.config.log_view_lines));
        }
        self.load().await;
    }

    /// Loads logs for the parent's current selection into the current page.
    ///
    /// Failures are reported through the flash and leave the placeholder line
    /// on the page.
    pub async fn load(&self) {
        if let Err(e) = self.do_load().await {
            warn!(error = %e, "log load failed");
            self.flash.err(&e);
            self.current_view().log_line(NO_LOGS_MSG);
        }
    }

    async fn do_load(&self) -> Result<()> {
        self.stop();

        let (generation, parent, page, opts) = {
            let state = self.state();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let path = state.parent.get_selection();
            state.page.reset(
                path.as_str(),
                title_line(&path, &state.container, &self.skin),
                generation,
            );

            let (namespace, name) = namespaced(&path);
            let opts = LogOptions {
                namespace,
                name,
                container: Some(state.container.clone()).filter(|c| !c.is_empty()),
                lines: self.config.log_request_size,
                previous: state.show_previous,
            };
            (generation, Arc::clone(&state.parent), Arc::clone(&state.page), opts)
        };

        let source = parent.tailable().ok_or_else(|| Error::NotTailable {
            kind: parent.resource_kind(),
        })?;

        let sink = page.sink(generation);
        let session = start_session(
            source.as_ref(),
            opts,
            sink,
            BufferSettings::from(&self.config),
        )
        .await?;

        let mut state = self.state();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "load superseded, dropping session");
            session.cancel();
            return Ok(());
        }
        if let Some(old) = state.session.replace(session) {
            old.cancel();
        }
        Ok(())
    }

    /// Cancels the live session, if any. A load still opening its stream is
    /// abandoned too: its session is cancelled as soon as the open returns.
    pub fn stop(&self) {
        let session = {
            let mut state = self.state();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.page.set_generation(generation);
            state.session.take()
        };
        let Some(session) = session else {
            return;
        };
        debug!("Canceling logs...");
        session.cancel();
    }

    /// Stops logging and returns to the parent page.
    pub fn back_cmd(&self, evt: KeyEvent) -> KeyEvent {
        self.stop();
        let (parent, title) = {
            let state = self.state();
            (Arc::clone(&state.parent), state.title.clone())
        };
        parent.switch_page(&title);
        evt
    }

    pub fn back_fn(self: &Arc<Self>) -> ActionHandler {
        let view = Arc::downgrade(self);
        Arc::new(move |evt| match view.upgrade() {
            Some(view) => view.back_cmd(evt),
            None => evt,
        })
    }

    pub fn current_view(&self) -> Arc<LogView> {
        Arc::clone(&self.state().page)
    }

    /// Plain title of the current page.
    pub fn title(&self) -> String {
        let state = self.state();
        format_title(&state.page.path(), &state.container)
    }

    pub fn is_active(&self) -> bool {
        self.state()
            .session
            .as_ref()
            .is_some_and(|s| !s.is_cancelled() && !s.is_finished())
    }
}

impl Drop for LogsView {
    fn drop(&mut self) {
        self.stop();
    }
}
