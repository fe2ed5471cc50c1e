//! Display surfaces and the log view controller.
//!
//! ```text
//!   Loggable (parent table view)
//!        │ tailable(), get_selection()
//!        ▼
//!   LogsView ── start_session ──▶ consumer task ──▶ LogView (current page)
//!        │                                              ▲
//!        └── Flash (errors)            generation guard ┘
//! ```
//!
//! - `colors` - title skin
//! - `title` - log view title templates
//! - `log_view` - bounded line buffer rendered as a bordered paragraph
//! - `logs_view` - owns at most one live log session per view
//! - `table_view` - sorted, periodically refreshed resource table

use crossterm::event::KeyEvent;
use std::sync::Arc;

use crate::error::Error;
use crate::logs::Tailable;

pub mod colors;
pub mod log_view;
pub mod logs_view;
pub mod table_view;
pub mod title;

pub use colors::Skin;
pub use log_view::LogView;
pub use logs_view::{LogsView, NO_LOGS_MSG};
pub use table_view::TableView;

/// Key handler bound to a view action. Returns the event for further dispatch.
pub type ActionHandler = Arc<dyn Fn(KeyEvent) -> KeyEvent + Send + Sync>;

/// The view a log view was opened from.
pub trait Loggable: Send + Sync {
    /// Selected resource path, `"ns/name"`.
    fn get_selection(&self) -> String;

    fn resource_kind(&self) -> String;

    /// `None` when the selected resource has no logs.
    fn tailable(&self) -> Option<Arc<dyn Tailable>>;

    fn switch_page(&self, title: &str);
}

/// User-facing error notifications.
pub trait Flash: Send + Sync {
    fn err(&self, err: &Error);
}
