//! A bounded buffer of log lines for one container, rendered as a bordered
//! paragraph that follows the tail.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Block, Paragraph, Widget},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::logs::LogSink;

#[derive(Debug, Default)]
struct State {
    lines: VecDeque<String>,
    title: Line<'static>,
    path: String,
    generation: u64,
}

impl State {
    fn push_all<'a>(&mut self, lines: impl IntoIterator<Item = &'a String>, max_lines: usize) {
        self.lines.extend(lines.into_iter().cloned());
        let excess = self.lines.len().saturating_sub(max_lines);
        self.lines.drain(..excess);
    }
}

#[derive(Debug)]
pub struct LogView {
    container: String,
    max_lines: usize,
    state: Mutex<State>,
}

impl LogView {
    pub fn new(container: impl Into<String>, max_lines: usize) -> Self {
        Self {
            container: container.into(),
            max_lines: max_lines.max(1),
            state: Mutex::new(State::default()),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    // Display state stays usable after a panicking writer.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        self.state().lines.clear();
    }

    pub fn set_path(&self, path: impl Into<String>) {
        self.state().path = path.into();
    }

    pub fn path(&self) -> String {
        self.state().path.clone()
    }

    pub fn set_title(&self, title: impl Into<Line<'static>>) {
        self.state().title = title.into();
    }

    pub fn title(&self) -> String {
        self.state().title.to_string()
    }

    pub fn log_line(&self, line: impl Into<String>) {
        let line = line.into();
        self.state().push_all([&line], self.max_lines);
    }

    pub fn append(&self, lines: &[String]) {
        self.state().push_all(lines, self.max_lines);
    }

    pub fn lines(&self) -> Vec<String> {
        self.state().lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().lines.is_empty()
    }

    /// Empties the page for a new session and hands it to `generation`, all
    /// under one lock so a late batch from the previous session cannot land
    /// in between.
    pub fn reset(&self, path: impl Into<String>, title: impl Into<Line<'static>>, generation: u64) {
        let mut state = self.state();
        state.generation = generation;
        state.lines.clear();
        state.path = path.into();
        state.title = title.into();
    }

    /// Makes `generation` the only session allowed to write here.
    pub fn set_generation(&self, generation: u64) {
        self.state().generation = generation;
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// A sink that writes into this view while `generation` is current.
    pub fn sink(self: &Arc<Self>, generation: u64) -> Arc<dyn LogSink> {
        Arc::new(GenerationSink {
            view: Arc::clone(self),
            generation,
        })
    }
}

struct GenerationSink {
    view: Arc<LogView>,
    generation: u64,
}

impl LogSink for GenerationSink {
    fn flush(&self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let mut state = self.view.state();
        if state.generation != self.generation {
            trace!(
                stale = self.generation,
                current = state.generation,
                dropped = lines.len(),
                "discarding batch from replaced session"
            );
            return;
        }
        state.push_all(lines, self.view.max_lines);
    }
}

impl Widget for &LogView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state();
        let block = Block::bordered().title(state.title.clone());
        let visible = block.inner(area).height as usize;
        let skip = state.lines.len().saturating_sub(visible);
        let text: Vec<Line<'_>> = state
            .lines
            .iter()
            .skip(skip)
            .map(|l| Line::raw(l.as_str()))
            .collect();
        Paragraph::new(text).block(block).render(area, buf);
    }
}
