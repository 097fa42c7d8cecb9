use std::path::Path;

use record_api::{Record, RecordError, RecordSource, RecordType};
use rusqlite::{types::ValueRef, Connection, OpenFlags};

/// Record source backed by a SQLite database. Every table or view is a
/// record type and every row an instance.
pub struct SqliteSource {
    conn: Connection,
    types: Option<Vec<String>>,
}

impl SqliteSource {
    /// Open an existing database read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| RecordError::Enumerate(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, types: None }
    }

    /// Enumerate these names instead of the tables found in the schema.
    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = Some(types);
        self
    }

    fn schema_names(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names.collect()
    }

    fn has_relation(&self, name: &str) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl RecordSource for SqliteSource {
    fn type_names(&self) -> Result<Vec<String>, RecordError> {
        match &self.types {
            Some(types) => Ok(types.clone()),
            None => self
                .schema_names()
                .map_err(|e| RecordError::Enumerate(e.to_string())),
        }
    }

    fn resolve(&self, name: &str) -> Result<Option<Box<dyn RecordType + '_>>, RecordError> {
        let exists = self
            .has_relation(name)
            .map_err(|e| RecordError::Enumerate(e.to_string()))?;
        if !exists {
            return Ok(None);
        }
        Ok(Some(Box::new(Table {
            conn: &self.conn,
            name: name.to_string(),
        })))
    }
}

struct Table<'a> {
    conn: &'a Connection,
    name: String,
}

impl Table<'_> {
    fn rows(&self) -> rusqlite::Result<Vec<Record>> {
        let sql = format!("SELECT * FROM {}", quote_ident(&self.name));
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query_map([], |row| {
            let mut record = Record::new();
            for (i, column) in columns.iter().enumerate() {
                record.fields.insert(column.clone(), raw_value(row.get_ref(i)?));
            }
            Ok(record)
        })?;
        rows.collect()
    }
}

impl RecordType for Table<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_all(&self) -> Result<Vec<Record>, RecordError> {
        self.rows().map_err(|e| RecordError::Load {
            name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a column value the way it is compared against file paths.
fn raw_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => std::str::from_utf8(bytes).ok().map(str::to_owned),
    }
}
