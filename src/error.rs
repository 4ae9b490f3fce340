//! Errors at the edges of the router: configuration, persisted overrides,
//! trace output and tracing setup. Routing itself never fails.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("invalid routing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, RoutingError>;
