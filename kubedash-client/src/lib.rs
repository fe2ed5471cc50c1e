// lib.rs
//! Live data pipeline behind the kubedash terminal views: batched log tailing,
//! sortable resource tables fed by watches, and the log view controller that
//! ties a session's lifetime to what is on screen.

pub mod config;
pub mod duration;
pub mod error;
pub mod log;
pub mod logs;
pub mod table;
pub mod ui;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use logs::{start_session, LogOptions, LogSink, PodLogs, Session, Tailable};
pub use table::{sort_rows, RowEvent, RowEvents, SortColumn, TableData};
pub use ui::{Flash, LogView, Loggable, LogsView, TableView};
