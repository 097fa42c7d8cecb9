use std::collections::BTreeMap;
use thiserror::Error;

/// Error raised by a record source backend.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to enumerate record types: {0}")]
    Enumerate(String),
    #[error("failed to load records of type {name}: {message}")]
    Load { name: String, message: String },
}

/// A persisted data instance exposing its raw field values.
///
/// A field is `None` when the backing store holds no value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub fields: BTreeMap<String, Option<String>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style helper for setting a field.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), Some(value.into()));
        self
    }

    pub fn with_null(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), None);
        self
    }

    /// Iterate over the raw field values.
    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.fields.values().map(|v| v.as_deref())
    }
}

/// A named category of records that can be loaded in bulk.
pub trait RecordType {
    fn name(&self) -> &str;

    /// Load every instance of this type.
    fn load_all(&self) -> Result<Vec<Record>, RecordError>;
}

/// Data layer collaborator used to discover and load record types.
pub trait RecordSource {
    /// All record type names known to the source, resolvable or not.
    fn type_names(&self) -> Result<Vec<String>, RecordError>;

    /// Resolve a name to a loadable type, or `None` when it does not
    /// correspond to one.
    fn resolve(&self, name: &str) -> Result<Option<Box<dyn RecordType + '_>>, RecordError>;
}

type Loader = Box<dyn Fn() -> Result<Vec<Record>, RecordError>>;

struct Entry {
    name: String,
    loader: Option<Loader>,
}

/// Explicit in-memory registry of record types.
///
/// Types are registered up front with a loader. Names can also be declared
/// without one, in which case they are enumerated but never resolve.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type with the function that loads its instances.
    pub fn register<F>(mut self, name: &str, loader: F) -> Self
    where
        F: Fn() -> Result<Vec<Record>, RecordError> + 'static,
    {
        self.entries.push(Entry {
            name: name.to_string(),
            loader: Some(Box::new(loader)),
        });
        self
    }

    /// Register a fixed set of records under a type name.
    pub fn register_records(self, name: &str, records: Vec<Record>) -> Self {
        self.register(name, move || Ok(records.clone()))
    }

    /// Declare a name that has no loadable type behind it.
    pub fn declare(mut self, name: &str) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            loader: None,
        });
        self
    }
}

struct RegisteredType<'a> {
    name: &'a str,
    loader: &'a Loader,
}

impl RecordType for RegisteredType<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn load_all(&self) -> Result<Vec<Record>, RecordError> {
        (self.loader)()
    }
}

impl RecordSource for Registry {
    fn type_names(&self) -> Result<Vec<String>, RecordError> {
        Ok(self.entries.iter().map(|e| e.name.clone()).collect())
    }

    fn resolve(&self, name: &str) -> Result<Option<Box<dyn RecordType + '_>>, RecordError> {
        let found = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.loader.as_ref().map(|loader| (e.name.as_str(), loader)));
        Ok(found.map(|(name, loader)| {
            Box::new(RegisteredType { name, loader }) as Box<dyn RecordType + '_>
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_registered_types_only() {
        let registry = Registry::new()
            .register_records("Post", vec![Record::new().with("cover", "a.jpg")])
            .declare("Ghost");
        assert_eq!(registry.type_names().unwrap(), vec!["Post", "Ghost"]);

        let post = registry.resolve("Post").unwrap().unwrap();
        assert_eq!(post.name(), "Post");
        assert_eq!(post.load_all().unwrap().len(), 1);

        assert!(registry.resolve("Ghost").unwrap().is_none());
        assert!(registry.resolve("Missing").unwrap().is_none());
    }

    #[test]
    fn loader_errors_surface() {
        let registry = Registry::new().register("Broken", || {
            Err(RecordError::Load {
                name: "Broken".into(),
                message: "boom".into(),
            })
        });
        let ty = registry.resolve("Broken").unwrap().unwrap();
        assert!(ty.load_all().is_err());
    }
}
