//! Batch error type.

use std::path::PathBuf;

/// Error that aborts a whole batch before any rendering starts.
///
/// Per-file render failures are not batch errors; they are reported as
/// [`BatchEvent::Failed`](crate::BatchEvent::Failed) and collected in the
/// [`BatchReport`](crate::BatchReport).
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The input directory (or one of its entries) could not be read.
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two inputs would be written to the same output file.
    #[error(
        "{} and {} would both render to {}",
        first.display(),
        second.display(),
        output.display()
    )]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}
