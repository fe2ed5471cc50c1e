//! Error types shared by the log pipeline, the row table and the views.

use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The selected resource kind cannot stream logs.
    #[error("Resource {kind} is not tailable")]
    NotTailable { kind: String },

    /// The log stream for a target could not be established.
    #[error("failed to open log stream for {target}: {source}")]
    StreamOpen {
        target: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A row event did not match the column schema of its table.
    #[error("row has {got} fields, table expects {expected}")]
    Schema { expected: usize, got: usize },

    #[error("poisoned {0} lock")]
    LockPoisoned(&'static str),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("watch failed: {0}")]
    Watch(#[from] kube::runtime::watcher::Error),

    #[error("bad config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn stream_open<E>(target: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error::StreamOpen {
            target: target.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_tailable_message() {
        let err = Error::NotTailable {
            kind: "ConfigMap".into(),
        };
        assert_eq!(err.to_string(), "Resource ConfigMap is not tailable");
    }

    #[test]
    fn test_stream_open_keeps_source() {
        let err = Error::stream_open("default/nginx", "connection refused");
        assert!(err.to_string().contains("default/nginx"));
        assert!(err.source().is_some());
    }
}
