//! Persistence layer for the code knowledge graph.
//!
//! One SQLite database per snapshot fingerprint, one table per entity kind.
//! The connection runs in autocommit mode, so every insert is durable as
//! soon as it returns.

mod cache;
mod schema;

pub use cache::{CacheOptions, CkgCache, OpenOutcome, OpenedStore};

use crate::entity::{Entity, EntityKind};
use crate::visitors::EntitySink;
use crate::IndexerError;
use rusqlite::{Connection, ToSql};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Restricts function lookups by method-ness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionFilter {
    /// Functions without a parent class
    Free,
    /// Functions with a parent class
    Method,
    /// No restriction
    #[default]
    Any,
}

impl FunctionFilter {
    fn clause(&self) -> &'static str {
        match self {
            FunctionFilter::Free => " AND parent_class IS NULL",
            FunctionFilter::Method => " AND parent_class IS NOT NULL",
            FunctionFilter::Any => "",
        }
    }
}

/// Entity store backed by a single SQLite connection.
pub struct CkgStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CkgStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, IndexerError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!(path = ?path, "Opened entity store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, IndexerError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create every per-kind table that does not exist yet.
    pub fn create_tables(&self) -> Result<(), IndexerError> {
        for kind in EntityKind::ALL {
            self.conn.execute(&schema::create_table(kind), [])?;
        }
        Ok(())
    }

    /// Insert one entity into its kind's table.
    pub fn insert(&self, entity: &Entity) -> Result<(), IndexerError> {
        let kind = entity.kind();
        let start_line = entity.start_line as i64;
        let end_line = entity.end_line as i64;
        let summaries = schema::values(&entity.details);

        let mut params: Vec<&dyn ToSql> = vec![
            &entity.name,
            &entity.file_path,
            &entity.body,
            &start_line,
            &end_line,
        ];
        for value in &summaries {
            params.push(value);
        }

        let mut stmt = self.conn.prepare_cached(&schema::insert(kind))?;
        stmt.execute(params.as_slice())?;
        Ok(())
    }

    /// Entities of `kind` named exactly `name`, in insertion order.
    ///
    /// `filter` only applies to functions.
    pub fn query(
        &self,
        kind: EntityKind,
        name: &str,
        filter: FunctionFilter,
    ) -> Result<Vec<Entity>, IndexerError> {
        let clause = match kind {
            EntityKind::Function => filter.clause(),
            _ => "",
        };
        let sql = format!("{} WHERE name = ?1{} ORDER BY id", schema::select(kind), clause);
        let summary_count = schema::columns(kind).len();
        let offset = schema::HEADER.len();

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([name], |row| {
            let mut summaries = Vec::with_capacity(summary_count);
            for i in 0..summary_count {
                summaries.push(row.get::<_, Option<String>>(offset + i)?);
            }
            Ok(Entity {
                name: row.get(0)?,
                file_path: row.get(1)?,
                body: row.get(2)?,
                start_line: row.get::<_, i64>(3)? as usize,
                end_line: row.get::<_, i64>(4)? as usize,
                details: schema::details(kind, summaries),
            })
        })?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }

    /// Delete every row of every table.
    pub fn clear(&self) -> Result<(), IndexerError> {
        for kind in EntityKind::ALL {
            self.conn
                .execute(&format!("DELETE FROM {}", kind.table()), [])?;
        }
        Ok(())
    }

    /// Row count of every table, in kind order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, usize)>, IndexerError> {
        let mut counts = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |row| row.get(0),
            )?;
            counts.push((kind.table(), count as usize));
        }
        Ok(counts)
    }
}

impl EntitySink for CkgStore {
    fn insert(&mut self, entity: Entity) -> Result<(), IndexerError> {
        CkgStore::insert(self, &entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDetails;
    use tempfile::tempdir;

    fn function(name: &str, parent_class: Option<&str>, line: usize) -> Entity {
        Entity {
            name: name.to_string(),
            file_path: "/src/a.py".to_string(),
            body: format!("def {}(): pass", name),
            start_line: line,
            end_line: line,
            details: EntityDetails::Function {
                parent_function: None,
                parent_class: parent_class.map(str::to_string),
            },
        }
    }

    fn store() -> CkgStore {
        let store = CkgStore::open_in_memory().unwrap();
        store.create_tables().unwrap();
        store
    }

    #[test]
    fn test_function_filters() {
        let store = store();
        store.insert(&function("run", None, 1)).unwrap();
        store.insert(&function("run", Some("Job"), 5)).unwrap();
        store.insert(&function("other", None, 9)).unwrap();

        let free = store.query(EntityKind::Function, "run", FunctionFilter::Free).unwrap();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].start_line, 1);

        let methods = store
            .query(EntityKind::Function, "run", FunctionFilter::Method)
            .unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].parent_class(), Some("Job"));

        let any = store.query(EntityKind::Function, "run", FunctionFilter::Any).unwrap();
        assert_eq!(
            any.iter().map(|e| e.start_line).collect::<Vec<_>>(),
            vec![1, 5]
        );
    }

    #[test]
    fn test_round_trip_keeps_summaries() {
        let store = store();
        let class = Entity {
            name: "Point".to_string(),
            file_path: "/src/point.py".to_string(),
            body: "class Point: ...".to_string(),
            start_line: 3,
            end_line: 10,
            details: EntityDetails::Class {
                fields: None,
                methods: Some("- norm\n- scale".to_string()),
            },
        };
        store.insert(&class).unwrap();

        let found = store.query(EntityKind::Class, "Point", FunctionFilter::Any).unwrap();
        assert_eq!(found, vec![class]);
        assert!(store
            .query(EntityKind::Struct, "Point", FunctionFilter::Any)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_counts_and_clear() {
        let mut store = store();
        EntitySink::insert(&mut store, function("a", None, 1)).unwrap();
        EntitySink::insert(&mut store, function("b", None, 2)).unwrap();

        let counts = store.table_counts().unwrap();
        assert_eq!(counts.len(), 14);
        assert_eq!(counts[0], ("functions", 2));
        assert!(counts[1..].iter().all(|(_, n)| *n == 0));

        store.clear().unwrap();
        assert!(store.table_counts().unwrap().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let store = CkgStore::open(&path).unwrap();
            store.create_tables().unwrap();
            store.insert(&function("kept", None, 1)).unwrap();
        }
        let store = CkgStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        let found = store.query(EntityKind::Function, "kept", FunctionFilter::Free).unwrap();
        assert_eq!(found.len(), 1);
    }
}
