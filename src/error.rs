//! Error types for procmon.
//!
//! A monitored process going away is not an error; see `monitor::SampleOutcome`.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid output template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to console: {0}")]
    Console(#[source] std::io::Error),

    #[error("access denied reading {path:?} (pid={pid})")]
    AccessDenied { pid: u32, path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
