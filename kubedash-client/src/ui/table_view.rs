use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Cell, Row as TableRow, Table, Widget},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

use super::colors::{Skin, SORT_MARK};
use crate::config::Config;
use crate::error::Result;
use crate::table::{Row, SortColumn, TableData};

struct Snapshot {
    sort: SortColumn,
    dirty: bool,
    refreshed: Option<Instant>,
    rows: Vec<(String, Row)>,
}

/// A resource table re-sorted at most once per refresh period, or sooner
/// when the sort changes.
pub struct TableView {
    data: Arc<TableData>,
    default_col: usize,
    refresh_rate: Duration,
    title: String,
    skin: Skin,
    snapshot: Mutex<Snapshot>,
}

impl TableView {
    pub fn new(data: Arc<TableData>, default_col: usize, config: &Config) -> Self {
        Self {
            data,
            default_col,
            refresh_rate: config.refresh_rate(),
            title: String::new(),
            skin: Skin::default(),
            snapshot: Mutex::new(Snapshot {
                sort: SortColumn::new(default_col, true),
                dirty: true,
                refreshed: None,
                rows: Vec::new(),
            }),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn data(&self) -> &Arc<TableData> {
        &self.data
    }

    fn snapshot(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sort_column(&self) -> SortColumn {
        self.snapshot().sort
    }

    pub fn sort_col(&self, index: usize, asc: bool) {
        let mut snap = self.snapshot();
        snap.sort = SortColumn::new(index, asc);
        snap.dirty = true;
    }

    pub fn toggle_sort(&self) {
        let mut snap = self.snapshot();
        snap.sort.asc = !snap.sort.asc;
        snap.dirty = true;
    }

    /// Forces the next refresh to re-sort.
    pub fn mark_dirty(&self) {
        self.snapshot().dirty = true;
    }

    pub fn needs_refresh(&self, now: Instant) -> bool {
        let snap = self.snapshot();
        snap.dirty
            || snap
                .refreshed
                .map_or(true, |at| now.saturating_duration_since(at) >= self.refresh_rate)
    }

    /// Re-sorts if due. Returns whether the rows were rebuilt.
    pub fn refresh_at(&self, now: Instant) -> Result<bool> {
        if !self.needs_refresh(now) {
            return Ok(false);
        }
        let mut snap = self.snapshot();
        let rows = self.data.sorted_rows(self.default_col, &snap.sort)?;
        snap.sort.row_count = rows.len();
        snap.rows = rows;
        snap.dirty = false;
        snap.refreshed = Some(now);
        Ok(true)
    }

    pub fn refresh(&self) -> Result<bool> {
        self.refresh_at(Instant::now())
    }

    /// Rows in display order as of the last refresh.
    pub fn rows(&self) -> Vec<(String, Row)> {
        self.snapshot().rows.clone()
    }

    fn header_row(&self, sort: &SortColumn) -> TableRow<'static> {
        let header = self.data.header();
        let marked = if sort.index < header.len() {
            sort.index
        } else {
            self.default_col
        };
        let cells = header.iter().enumerate().map(|(i, name)| {
            if i == marked {
                let arrow = if sort.asc { '↑' } else { '↓' };
                Cell::from(format!("{name}{arrow}"))
                    .style(Style::default().fg(SORT_MARK).add_modifier(Modifier::BOLD))
            } else {
                Cell::from(name.clone()).style(self.skin.title().add_modifier(Modifier::BOLD))
            }
        });
        TableRow::new(cells)
    }
}

impl Widget for &TableView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Err(e) = self.refresh() {
            warn!(error = %e, "table refresh failed, showing last snapshot");
        }
        let snap = self.snapshot();
        let widths = vec![Constraint::Fill(1); self.data.field_count().max(1)];
        let rows = snap
            .rows
            .iter()
            .map(|(_, fields)| TableRow::new(fields.iter().map(|f| Cell::from(f.as_str()))));
        let title = format!(" {}[{}] ", self.title, snap.rows.len());

        Table::new(rows, widths)
            .header(self.header_row(&snap.sort))
            .block(Block::bordered().title(title).style(self.skin.title()))
            .render(area, buf);
    }
}
