use record_api::RecordSource;
use tracing::{debug, error, info, warn};

use crate::{
    error::ReapError,
    references::{ReferenceScanner, DEFAULT_ABSTRACT_TYPES},
    storage::{StorageFile, StorageRoot},
};

/// What happened to a single orphaned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted,
    /// Dry run: the file would have been deleted.
    WouldDelete,
    /// The file disappeared between listing and deletion.
    Vanished,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file: String,
    pub outcome: Outcome,
}

/// Result of a completed cleanup run.
#[derive(Debug, Default)]
pub struct ReapReport {
    pub files_on_disk: usize,
    pub files_referenced: usize,
    pub unresolved_types: Vec<String>,
    pub outcomes: Vec<FileOutcome>,
}

impl ReapReport {
    fn with(&self, wanted: fn(&Outcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| wanted(&o.outcome))
            .map(|o| o.file.as_str())
            .collect()
    }

    pub fn deleted(&self) -> Vec<&str> {
        self.with(|o| matches!(o, Outcome::Deleted))
    }

    pub fn orphans(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.file.as_str()).collect()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.with(|o| matches!(o, Outcome::Failed(_)))
    }
}

/// Deletes files under a storage root that no record refers to.
pub struct Reaper {
    root: StorageRoot,
    abstract_types: Vec<String>,
    dry_run: bool,
}

impl Reaper {
    pub fn new(root: StorageRoot) -> Self {
        Self {
            root,
            abstract_types: DEFAULT_ABSTRACT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dry_run: false,
        }
    }

    /// Replace the record type names that are skipped during the scan.
    pub fn with_abstract_types(mut self, names: Vec<String>) -> Self {
        self.abstract_types = names;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// List storage, gather references from `source` and remove every file
    /// that is not referenced. Individual deletion failures are logged and
    /// reported; only enumeration failures end the run with an error.
    ///
    /// References are not recomputed before deleting, so a record written
    /// after the scan does not protect its file.
    pub fn run(&self, source: &dyn RecordSource) -> Result<ReapReport, ReapError> {
        let files = self.root.list_files()?;
        let scan = ReferenceScanner::new(&self.root, &self.abstract_types).scan(source)?;
        debug!(
            files = files.len(),
            referenced = scan.referenced.len(),
            records = scan.records_scanned,
            "storage scan complete"
        );

        let mut report = ReapReport {
            files_on_disk: files.len(),
            files_referenced: scan.referenced.len(),
            unresolved_types: scan.unresolved,
            outcomes: Vec::new(),
        };
        for file in files
            .iter()
            .filter(|f| !scan.referenced.contains(&f.relative))
        {
            report.outcomes.push(FileOutcome {
                file: file.relative.clone(),
                outcome: self.reap(file),
            });
        }
        Ok(report)
    }

    fn reap(&self, file: &StorageFile) -> Outcome {
        if self.dry_run {
            info!("File {} would be deleted", file.relative);
            return Outcome::WouldDelete;
        }
        if !file.path.is_file() {
            warn!("File {} vanished before deletion", file.relative);
            return Outcome::Vanished;
        }
        match self.root.remove(file) {
            Ok(()) => {
                info!("File {} deleted", file.relative);
                Outcome::Deleted
            }
            Err(err) => {
                error!("File {} not deleted: {err}", file.relative);
                Outcome::Failed(err.to_string())
            }
        }
    }
}
