use std::{io, path::PathBuf};

use record_api::RecordError;
use thiserror::Error;

/// Failures that abort a cleanup run.
///
/// Per-file deletion problems and unresolvable record types are not errors:
/// they are logged and reported in [`crate::ReapReport`].
#[derive(Debug, Error)]
pub enum ReapError {
    #[error("cannot read storage root {path}: {source}")]
    StorageRoot { path: PathBuf, source: io::Error },
    #[error("storage root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to walk storage root: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Records(#[from] RecordError),
}
