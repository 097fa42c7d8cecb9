use std::collections::BTreeSet;

use record_api::RecordSource;
use tracing::{debug, warn};

use crate::{error::ReapError, storage::StorageRoot, structured::Structured};

/// Record type names skipped unless configured otherwise.
pub const DEFAULT_ABSTRACT_TYPES: &[&str] = &["Model", "BaseModel"];

/// References gathered from every loadable record type.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub referenced: BTreeSet<String>,
    /// Names that did not resolve to a loadable type.
    pub unresolved: Vec<String>,
    pub records_scanned: usize,
}

/// Collects the files referenced by a record source.
pub struct ReferenceScanner<'a> {
    root: &'a StorageRoot,
    abstract_types: &'a [String],
}

impl<'a> ReferenceScanner<'a> {
    pub fn new(root: &'a StorageRoot, abstract_types: &'a [String]) -> Self {
        Self {
            root,
            abstract_types,
        }
    }

    fn is_abstract(&self, name: &str) -> bool {
        self.abstract_types.iter().any(|t| t == name)
    }

    /// Load every non-abstract record type and gather the storage files its
    /// fields point at. Enumeration and load failures abort the scan.
    pub fn scan(&self, source: &dyn RecordSource) -> Result<ScanResult, ReapError> {
        let mut result = ScanResult::default();
        for name in source.type_names()? {
            if self.is_abstract(&name) {
                debug!(record_type = %name, "skipping abstract record type");
                continue;
            }
            let Some(record_type) = source.resolve(&name)? else {
                warn!("Record type {name} does not resolve to a loadable type, skipping");
                result.unresolved.push(name);
                continue;
            };
            let records = record_type.load_all()?;
            debug!(
                record_type = %record_type.name(),
                records = records.len(),
                "scanning records"
            );
            for record in &records {
                for value in record.values() {
                    field_references(value, self.root, &mut result.referenced);
                }
            }
            result.records_scanned += records.len();
        }
        Ok(result)
    }
}

/// Add the files a single raw field value refers to.
///
/// A value encoding a non-empty array or object is expanded recursively; an
/// empty one contributes nothing. Any other value counts when it names an
/// existing file, except empty strings and `"0"`, which are never references.
pub fn field_references(raw: Option<&str>, root: &StorageRoot, found: &mut BTreeSet<String>) {
    let Some(raw) = raw else {
        return;
    };
    if let Some(structured) = Structured::decode(raw) {
        if !structured.is_empty() {
            structured.collect_files(root, found);
        }
        return;
    }
    if raw.is_empty() || raw == "0" {
        return;
    }
    if let Some(rel) = root.resolve(raw) {
        found.insert(rel);
    }
}
