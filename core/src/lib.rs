pub mod cli;
pub mod config;
pub mod error;
pub mod reaper;
pub mod references;
pub mod sqlite;
pub mod storage;
pub mod structured;

pub use error::ReapError;
pub use reaper::{FileOutcome, Outcome, ReapReport, Reaper};
pub use storage::{StorageFile, StorageRoot};
