//! Dashboard tunables for the log pipeline and table refresh.

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::error::Result;

pub const DEFAULT_LOG_REQUEST_SIZE: i64 = 200;
pub const DEFAULT_LOG_BUFFER_SIZE: usize = 100;
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 200;
pub const DEFAULT_REFRESH_RATE_MS: u64 = 200;
pub const DEFAULT_LOG_VIEW_LINES: usize = 5_000;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Number of lines requested from the log source per session.
    pub log_request_size: i64,
    /// Lines per batch handed to the display.
    pub log_buffer_size: usize,
    pub flush_timeout_ms: u64,
    pub refresh_rate_ms: u64,
    /// Lines kept by a log view before the oldest are dropped.
    pub log_view_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_request_size: DEFAULT_LOG_REQUEST_SIZE,
            log_buffer_size: DEFAULT_LOG_BUFFER_SIZE,
            flush_timeout_ms: DEFAULT_FLUSH_TIMEOUT_MS,
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            log_view_lines: DEFAULT_LOG_VIEW_LINES,
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg.normalized())
    }

    /// Replaces zero sizes and durations with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.log_request_size <= 0 {
            self.log_request_size = DEFAULT_LOG_REQUEST_SIZE;
        }
        if self.log_buffer_size == 0 {
            self.log_buffer_size = DEFAULT_LOG_BUFFER_SIZE;
        }
        if self.flush_timeout_ms == 0 {
            self.flush_timeout_ms = DEFAULT_FLUSH_TIMEOUT_MS;
        }
        if self.refresh_rate_ms == 0 {
            self.refresh_rate_ms = DEFAULT_REFRESH_RATE_MS;
        }
        if self.log_view_lines == 0 {
            self.log_view_lines = DEFAULT_LOG_VIEW_LINES;
        }
        self
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.log_buffer_size, 100);
        assert_eq!(cfg.flush_timeout(), Duration::from_millis(200));
        assert_eq!(cfg.refresh_rate(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml("log_request_size: 500\n").unwrap();
        assert_eq!(cfg.log_request_size, 500);
        assert_eq!(cfg.log_buffer_size, DEFAULT_LOG_BUFFER_SIZE);
    }

    #[test]
    fn test_zero_values_normalized() {
        let cfg = Config::from_yaml("log_buffer_size: 0\nflush_timeout_ms: 0\n").unwrap();
        assert_eq!(cfg.log_buffer_size, DEFAULT_LOG_BUFFER_SIZE);
        assert_eq!(cfg.flush_timeout_ms, DEFAULT_FLUSH_TIMEOUT_MS);
    }

    #[test]
    fn test_bad_yaml() {
        assert!(Config::from_yaml("log_buffer_size: [1, 2]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_rate_ms: 1000").unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.refresh_rate(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/kubedash.yaml")).is_err());
    }
}
