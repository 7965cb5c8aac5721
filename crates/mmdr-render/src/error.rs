//! Render error type.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Error from a single render call.
///
/// Render errors are per-file: the batch driver reports them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The renderer program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer program exited unsuccessfully.
    #[error("{program} failed ({status}): {message}")]
    Exit {
        program: String,
        status: ExitStatus,
        /// Trimmed stderr (or stdout when stderr is empty).
        message: String,
    },

    /// The renderer reported success without producing the output file.
    #[error("no output written to {}", .0.display())]
    MissingOutput(PathBuf),

    /// The diagram source was rejected by the renderer.
    #[error("diagram rejected: {0}")]
    Diagram(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid PNG data")]
    InvalidPng,

    /// A blocking render job panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(String),
}
