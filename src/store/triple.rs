//! Transactional triple-store backend over SQLite
//!
//! Column artifacts are encoded as `(subject, predicate, object, graph)`
//! statements with typed literals, split across two logical graphs:
//! raw samples and minhash signatures in `colprof:text:graph`, computed
//! statistics in `colprof:profile:graph`.
//!
//! Every write runs inside one transaction. The transaction guard rolls
//! back on drop, so any error mid-write leaves the store untouched.

use super::schema::{self, PROFILE_GRAPH, TEXT_GRAPH};
use super::ProfileStore;
use crate::column::ColumnId;
use crate::profile::{ColumnProfile, ColumnStats};
use crate::{Error, Result};
use rusqlite::{params, Connection, Transaction};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Typed literal object of a statement.
enum Literal<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
}

impl Literal<'_> {
    fn type_tag(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "string",
        }
    }

    fn lexical(&self) -> Cow<'_, str> {
        match self {
            Literal::Int(n) => Cow::Owned(n.to_string()),
            Literal::Float(x) => Cow::Owned(x.to_string()),
            Literal::Str(s) => Cow::Borrowed(s),
        }
    }
}

/// Triple-store backed by a SQLite database.
///
/// Holds at most one connection, established by `init` and released by
/// `tear_down`. A single instance serves one caller at a time; concurrent
/// pipelines open one instance per worker.
pub struct TripleStore {
    endpoint: Endpoint,
    conn: Option<Connection>,
}

#[derive(Debug, Clone)]
enum Endpoint {
    File(PathBuf),
    Memory,
}

impl TripleStore {
    /// Store backed by a database file (created if missing)
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            endpoint: Endpoint::File(path.as_ref().to_path_buf()),
            conn: None,
        }
    }

    /// Store backed by an in-memory database (for testing and dry runs)
    pub fn in_memory() -> Self {
        Self {
            endpoint: Endpoint::Memory,
            conn: None,
        }
    }

    /// Open the connection and make sure the schema exists, without
    /// touching stored data. `init` builds on this and additionally clears
    /// both graphs; diagnostics and incremental runs connect directly.
    pub fn connect(&mut self) -> Result<()> {
        let conn = match &self.endpoint {
            Endpoint::File(path) => Connection::open(path)?,
            Endpoint::Memory => Connection::open_in_memory()?,
        };
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        self.conn = Some(conn);
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(Error::NotConnected)
    }

    /// Statement counts per graph
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.as_ref().ok_or(Error::NotConnected)?;
        let count = |graph: &str| -> Result<usize> {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM statements WHERE graph = ?1",
                [graph],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            text_statements: count(TEXT_GRAPH)?,
            profile_statements: count(PROFILE_GRAPH)?,
        })
    }

    /// Objects for a subject and predicate in one graph, in insertion order
    pub fn objects(&self, subject: &str, predicate: &str, graph: &str) -> Result<Vec<String>> {
        let conn = self.conn.as_ref().ok_or(Error::NotConnected)?;
        let mut stmt = conn.prepare(
            "SELECT object FROM statements WHERE subject = ?1 AND predicate = ?2 AND graph = ?3 ORDER BY idx",
        )?;

        let objects = stmt
            .query_map(params![subject, predicate, graph], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(objects)
    }
}

/// Upsert a single-valued statement (one object per subject+predicate slot).
fn put(tx: &Transaction, subject: &str, predicate: &str, object: Literal, graph: &str) -> Result<()> {
    tx.execute(
        r#"
        INSERT OR REPLACE INTO statements (subject, predicate, object, literal_type, graph, idx)
        VALUES (?1, ?2, ?3, ?4, ?5, 0)
        "#,
        params![subject, predicate, object.lexical(), object.type_tag(), graph],
    )?;
    Ok(())
}

/// Append an indexed statement for a multi-valued predicate.
fn append(
    tx: &Transaction,
    subject: &str,
    predicate: &str,
    object: Literal,
    graph: &str,
    idx: i64,
) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO statements (subject, predicate, object, literal_type, graph, idx)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![subject, predicate, object.lexical(), object.type_tag(), graph, idx],
    )?;
    Ok(())
}

/// Drop every statement for a subject+predicate in one graph.
fn clear_predicate(tx: &Transaction, subject: &str, predicate: &str, graph: &str) -> Result<()> {
    tx.execute(
        "DELETE FROM statements WHERE subject = ?1 AND predicate = ?2 AND graph = ?3",
        params![subject, predicate, graph],
    )?;
    Ok(())
}

impl ProfileStore for TripleStore {
    fn init(&mut self) -> Result<()> {
        self.connect()?;

        // The layer owns both graphs: drop whatever a previous run left.
        let conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM statements WHERE graph IN (?1, ?2)",
            params![TEXT_GRAPH, PROFILE_GRAPH],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn index_values(&mut self, column: &ColumnId, values: &[String]) -> Result<()> {
        let subject = column.iri();
        tracing::debug!(column = %subject, count = values.len(), "indexing raw values");

        let tx = self.connection()?.transaction()?;

        put(&tx, &subject, schema::PROP_ID, Literal::Int(column.id), TEXT_GRAPH)?;
        put(&tx, &subject, schema::PROP_DB_NAME, Literal::Str(&column.db_name), TEXT_GRAPH)?;
        put(&tx, &subject, schema::PROP_PATH, Literal::Str(&column.path), TEXT_GRAPH)?;
        put(&tx, &subject, schema::PROP_SOURCE_NAME, Literal::Str(&column.source_name), TEXT_GRAPH)?;
        put(&tx, &subject, schema::PROP_COLUMN_NAME, Literal::Str(&column.column_name), TEXT_GRAPH)?;

        // Values keep their multiplicity and order: one statement per
        // observed value, indexed by position. Re-indexing a column
        // replaces its previous samples in the same transaction.
        clear_predicate(&tx, &subject, schema::PROP_VALUE, TEXT_GRAPH)?;
        for (idx, value) in values.iter().enumerate() {
            append(&tx, &subject, schema::PROP_VALUE, Literal::Str(value), TEXT_GRAPH, idx as i64)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn store_profile(&mut self, profile: &ColumnProfile) -> Result<()> {
        let subject = profile.column.iri();
        tracing::debug!(column = %subject, data_type = profile.stats.data_type(), "storing profile");

        let tx = self.connection()?.transaction()?;

        put(&tx, &subject, schema::PROP_DATA_TYPE, Literal::Str(profile.stats.data_type()), PROFILE_GRAPH)?;
        put(&tx, &subject, schema::PROP_TOTAL_VALUES, Literal::Int(profile.total_values as i64), PROFILE_GRAPH)?;
        put(&tx, &subject, schema::PROP_UNIQUE_VALUES, Literal::Int(profile.unique_values as i64), PROFILE_GRAPH)?;

        // A re-profile may flip the column's type or shrink its entity
        // list: drop both variants' conditional statements before writing
        // the new ones, inside the same transaction.
        for predicate in [
            schema::PROP_MIN_VALUE,
            schema::PROP_MAX_VALUE,
            schema::PROP_AVG_VALUE,
            schema::PROP_MEDIAN,
            schema::PROP_IQR,
            schema::PROP_ENTITIES,
        ] {
            clear_predicate(&tx, &subject, predicate, PROFILE_GRAPH)?;
        }
        clear_predicate(&tx, &subject, schema::PROP_MIN_HASH, TEXT_GRAPH)?;

        match &profile.stats {
            ColumnStats::Numeric {
                min_value,
                max_value,
                avg_value,
                median,
                iqr,
            } => {
                put(&tx, &subject, schema::PROP_MIN_VALUE, Literal::Float(*min_value), PROFILE_GRAPH)?;
                put(&tx, &subject, schema::PROP_MAX_VALUE, Literal::Float(*max_value), PROFILE_GRAPH)?;
                put(&tx, &subject, schema::PROP_AVG_VALUE, Literal::Float(*avg_value), PROFILE_GRAPH)?;
                put(&tx, &subject, schema::PROP_MEDIAN, Literal::Float(*median), PROFILE_GRAPH)?;
                put(&tx, &subject, schema::PROP_IQR, Literal::Float(*iqr), PROFILE_GRAPH)?;
            }
            ColumnStats::Text { entities, min_hash } => {
                for (idx, entity) in entities.iter().enumerate() {
                    append(&tx, &subject, schema::PROP_ENTITIES, Literal::Str(entity), PROFILE_GRAPH, idx as i64)?;
                }
                // Minhash is a text-similarity artifact: it lives in the
                // text graph next to the raw samples, not with the stats.
                let signature = format!("{min_hash:?}");
                put(&tx, &subject, schema::PROP_MIN_HASH, Literal::Str(&signature), TEXT_GRAPH)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn tear_down(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| Error::Storage(err))?;
        }
        Ok(())
    }
}

/// Statement counts per logical graph
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub text_statements: usize,
    pub profile_statements: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Text statements: {}", self.text_statements)?;
        writeln!(f, "  Profile statements: {}", self.profile_statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_column() -> ColumnId {
        ColumnId::new(7, "sales_db", "/data/q1.csv", "csv_source", "region")
    }

    fn open_store() -> TripleStore {
        let mut store = TripleStore::in_memory();
        store.init().unwrap();
        store
    }

    fn values(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    fn subject_count(store: &TripleStore, subject: &str, graph: &str) -> i64 {
        store
            .conn
            .as_ref()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM statements WHERE subject = ?1 AND graph = ?2",
                params![subject, graph],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_init_yields_empty_partitions() {
        let store = open_store();
        let stats = store.stats().unwrap();
        assert_eq!(stats.text_statements, 0);
        assert_eq!(stats.profile_statements, 0);
    }

    #[test]
    fn test_init_clears_previous_data() {
        let mut store = open_store();
        store
            .index_values(&sample_column(), &values(&["EU"]))
            .unwrap();
        assert!(store.stats().unwrap().text_statements > 0);

        // Second init reconnects and drops both graphs.
        store.init().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.text_statements, 0);
        assert_eq!(stats.profile_statements, 0);
    }

    #[test]
    fn test_index_values_scenario() {
        let mut store = open_store();
        let column = sample_column();
        store
            .index_values(&column, &values(&["EU", "EU", "APAC"]))
            .unwrap();

        let subject = column.iri();
        // Five metadata statements plus three ordered value statements:
        // the duplicate keeps its multiplicity.
        assert_eq!(subject_count(&store, &subject, TEXT_GRAPH), 8);
        assert_eq!(
            store.objects(&subject, schema::PROP_VALUE, TEXT_GRAPH).unwrap(),
            values(&["EU", "EU", "APAC"])
        );
        assert_eq!(
            store.objects(&subject, schema::PROP_DB_NAME, TEXT_GRAPH).unwrap(),
            values(&["sales_db"])
        );
        assert_eq!(store.stats().unwrap().profile_statements, 0);
    }

    #[test]
    fn test_reindex_replaces_values() {
        let mut store = open_store();
        let column = sample_column();
        store
            .index_values(&column, &values(&["EU", "EU", "APAC"]))
            .unwrap();
        store.index_values(&column, &values(&["US"])).unwrap();

        let subject = column.iri();
        assert_eq!(
            store.objects(&subject, schema::PROP_VALUE, TEXT_GRAPH).unwrap(),
            values(&["US"])
        );
        assert_eq!(subject_count(&store, &subject, TEXT_GRAPH), 6);
    }

    #[test]
    fn test_index_values_is_atomic() {
        let mut store = open_store();

        // Inject a failure on the last value of the call.
        store
            .conn
            .as_ref()
            .unwrap()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_on_apac BEFORE INSERT ON statements
                WHEN NEW.object = 'APAC'
                BEGIN SELECT RAISE(ABORT, 'injected failure'); END
                "#,
            )
            .unwrap();

        let column = sample_column();
        let result = store.index_values(&column, &values(&["EU", "EU", "APAC"]));
        assert!(matches!(result, Err(Error::Storage(_))));

        // Nothing from the failed call is visible, metadata included.
        assert_eq!(subject_count(&store, &column.iri(), TEXT_GRAPH), 0);
        assert_eq!(store.stats().unwrap().text_statements, 0);
    }

    #[test]
    fn test_numeric_profile_scenario() {
        let mut store = open_store();
        let profile =
            ColumnProfile::numeric(sample_column(), 100, 42, 1.0, 99.0, 50.5, 50.0, 20.0);
        store.store_profile(&profile).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.profile_statements, 8);
        assert_eq!(stats.text_statements, 0);

        let subject = profile.column.iri();
        assert_eq!(
            store.objects(&subject, schema::PROP_DATA_TYPE, PROFILE_GRAPH).unwrap(),
            values(&["N"])
        );
        assert_eq!(
            store.objects(&subject, schema::PROP_MIN_VALUE, PROFILE_GRAPH).unwrap(),
            values(&["1"])
        );
        assert_eq!(
            store.objects(&subject, schema::PROP_AVG_VALUE, PROFILE_GRAPH).unwrap(),
            values(&["50.5"])
        );
        // None of the text-only predicates leaked in.
        assert!(store.objects(&subject, schema::PROP_MIN_HASH, TEXT_GRAPH).unwrap().is_empty());
        assert!(store.objects(&subject, schema::PROP_ENTITIES, PROFILE_GRAPH).unwrap().is_empty());
    }

    #[test]
    fn test_text_profile_with_entities() {
        let mut store = open_store();
        let profile = ColumnProfile::text(
            sample_column(),
            3,
            2,
            vec!["LOCATION".to_string(), "ORG".to_string()],
            vec![11, 42, 7],
        );
        store.store_profile(&profile).unwrap();

        let subject = profile.column.iri();
        assert_eq!(
            store.objects(&subject, schema::PROP_ENTITIES, PROFILE_GRAPH).unwrap(),
            values(&["LOCATION", "ORG"])
        );
        // Minhash lands in the text graph with the bracketed encoding.
        assert_eq!(
            store.objects(&subject, schema::PROP_MIN_HASH, TEXT_GRAPH).unwrap(),
            values(&["[11, 42, 7]"])
        );
        assert_eq!(store.stats().unwrap().text_statements, 1);
        assert_eq!(store.stats().unwrap().profile_statements, 5);
    }

    #[test]
    fn test_text_profile_without_entities() {
        let mut store = open_store();
        let profile = ColumnProfile::text(sample_column(), 3, 3, vec![], vec![1, 2]);
        store.store_profile(&profile).unwrap();

        let subject = profile.column.iri();
        assert!(store.objects(&subject, schema::PROP_ENTITIES, PROFILE_GRAPH).unwrap().is_empty());
        assert_eq!(
            store.objects(&subject, schema::PROP_MIN_HASH, TEXT_GRAPH).unwrap(),
            values(&["[1, 2]"])
        );
        // dataType, totalValues, uniqueValues only.
        assert_eq!(store.stats().unwrap().profile_statements, 3);
    }

    #[test]
    fn test_restore_profile_replaces_previous() {
        let mut store = open_store();
        let column = sample_column();
        store
            .store_profile(&ColumnProfile::numeric(column.clone(), 100, 42, 1.0, 99.0, 50.5, 50.0, 20.0))
            .unwrap();
        store
            .store_profile(&ColumnProfile::numeric(column.clone(), 120, 44, 1.0, 99.0, 51.0, 50.0, 20.0))
            .unwrap();

        // Single-valued slots hold exactly one object after a re-store.
        assert_eq!(
            store.objects(&column.iri(), schema::PROP_TOTAL_VALUES, PROFILE_GRAPH).unwrap(),
            values(&["120"])
        );
        assert_eq!(store.stats().unwrap().profile_statements, 8);
    }

    #[test]
    fn test_reprofile_type_change_drops_stale_statements() {
        let mut store = open_store();
        let column = sample_column();
        store
            .store_profile(&ColumnProfile::text(
                column.clone(),
                3,
                2,
                vec!["LOCATION".to_string()],
                vec![11, 42],
            ))
            .unwrap();
        store
            .store_profile(&ColumnProfile::numeric(column.clone(), 100, 42, 1.0, 99.0, 50.5, 50.0, 20.0))
            .unwrap();

        // No text-variant leftovers after the column turned numeric.
        let subject = column.iri();
        assert!(store.objects(&subject, schema::PROP_MIN_HASH, TEXT_GRAPH).unwrap().is_empty());
        assert!(store.objects(&subject, schema::PROP_ENTITIES, PROFILE_GRAPH).unwrap().is_empty());
        let stats = store.stats().unwrap();
        assert_eq!(stats.text_statements, 0);
        assert_eq!(stats.profile_statements, 8);
    }

    #[test]
    fn test_reprofile_with_emptied_entities_clears_them() {
        let mut store = open_store();
        let column = sample_column();
        store
            .store_profile(&ColumnProfile::text(
                column.clone(),
                3,
                2,
                vec!["LOCATION".to_string(), "ORG".to_string()],
                vec![1, 2],
            ))
            .unwrap();
        store
            .store_profile(&ColumnProfile::text(column.clone(), 4, 4, vec![], vec![3, 4]))
            .unwrap();

        let subject = column.iri();
        assert!(store.objects(&subject, schema::PROP_ENTITIES, PROFILE_GRAPH).unwrap().is_empty());
        assert_eq!(
            store.objects(&subject, schema::PROP_MIN_HASH, TEXT_GRAPH).unwrap(),
            values(&["[3, 4]"])
        );
        assert_eq!(store.stats().unwrap().profile_statements, 3);
    }

    #[test]
    fn test_write_before_init_fails() {
        let mut store = TripleStore::in_memory();
        let result = store.index_values(&sample_column(), &values(&["EU"]));
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[test]
    fn test_committed_data_survives_tear_down() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("colprof.db");

        let mut store = TripleStore::at(&db_path);
        store.init().unwrap();
        store
            .index_values(&sample_column(), &values(&["EU", "APAC"]))
            .unwrap();
        store.tear_down().unwrap();
        // Second tear_down is a no-op.
        store.tear_down().unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM statements WHERE graph = ?1",
                [TEXT_GRAPH],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 7);
    }
}
