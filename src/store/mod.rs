//! Store layer - backend-agnostic persistence of column artifacts
//!
//! One contract, several backends:
//! - `NullStore`: discards everything (dry runs, benchmarks)
//! - `TripleStore`: transactional quad store over SQLite
//! - Two search-engine kinds are registered for config validation but not
//!   built here
//!
//! Every write is atomic per call: either all statements for the call are
//! committed, or the backend is left exactly as it was.

pub mod schema;
pub mod triple;

pub use triple::TripleStore;

use crate::column::ColumnId;
use crate::profile::ColumnProfile;
use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Backend-agnostic contract for committing column artifacts.
///
/// Receivers are `&mut self`: a store instance owns its connection
/// exclusively for the lifetime of each call's transaction. Concurrent
/// profiling pipelines use one store instance per worker; sharing one
/// instance across in-flight transactions is rejected by the borrow checker
/// rather than left as a convention.
///
/// Errors are the only failure signal. A failed `index_values` or
/// `store_profile` call rolls back before returning, leaving the backend as
/// if the call never happened. `init` and `tear_down` surface connectivity
/// failures without retrying; retries belong to the caller.
pub trait ProfileStore {
    /// Acquire the backend connection and clear the partitions this layer
    /// owns. Idempotent: safe to call on an already-clean backend.
    fn init(&mut self) -> Result<()>;

    /// Persist raw sample values for one column, all-or-nothing.
    fn index_values(&mut self, column: &ColumnId, values: &[String]) -> Result<()>;

    /// Persist a computed profile, all-or-nothing.
    fn store_profile(&mut self, profile: &ColumnProfile) -> Result<()>;

    /// Release the backend connection. Writes committed before this call
    /// survive it.
    fn tear_down(&mut self) -> Result<()>;
}

/// Registered backend kinds with stable ordinal codes.
///
/// Closed at build time: adding a backend is a code change, not a runtime
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Discard all writes
    Null = 0,
    /// Search engine over HTTP (not built here)
    ElasticHttp = 1,
    /// Search engine, native protocol (not built here)
    ElasticNative = 2,
    /// Transactional triple store
    Triple = 3,
}

impl StoreKind {
    /// Get the string representation of the store kind
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Null => "null",
            StoreKind::ElasticHttp => "elastic-http",
            StoreKind::ElasticNative => "elastic-native",
            StoreKind::Triple => "triple",
        }
    }

    /// Stable numeric code used in configuration
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Get all store kinds in code order
    pub fn all() -> &'static [StoreKind] {
        &[
            StoreKind::Null,
            StoreKind::ElasticHttp,
            StoreKind::ElasticNative,
            StoreKind::Triple,
        ]
    }

    /// One-line listing of every kind with its code, for diagnostics and
    /// config validation messages. Computed once per process.
    pub fn listing() -> &'static str {
        static LISTING: OnceLock<String> = OnceLock::new();
        LISTING.get_or_init(|| {
            StoreKind::all()
                .iter()
                .map(|kind| format!("{}({})", kind.as_str(), kind.code()))
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    /// Accepts the kind name or its numeric code.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "null" | "0" => Ok(StoreKind::Null),
            "elastic-http" | "1" => Ok(StoreKind::ElasticHttp),
            "elastic-native" | "2" => Ok(StoreKind::ElasticNative),
            "triple" | "3" => Ok(StoreKind::Triple),
            other => Err(Error::UnknownStoreKind(format!(
                "{other} (expected one of: {})",
                StoreKind::listing()
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Construct the store for a configured kind, not yet connected: call
/// `init` to acquire the connection and clear both partitions.
///
/// `database` is the backend endpoint for the triple store; `None` selects
/// an in-memory database. The search-engine kinds stay in the registry for
/// configuration validation but have no implementation in this crate.
pub fn open(kind: StoreKind, database: Option<&Path>) -> Result<Box<dyn ProfileStore>> {
    match kind {
        StoreKind::Null => Ok(Box::new(NullStore)),
        StoreKind::Triple => Ok(Box::new(match database {
            Some(path) => TripleStore::at(path),
            None => TripleStore::in_memory(),
        })),
        StoreKind::ElasticHttp | StoreKind::ElasticNative => {
            Err(Error::UnsupportedBackend(kind.as_str()))
        }
    }
}

/// Construct the store for a configured kind and open its connection
/// without clearing stored data, for incremental runs and diagnostics.
pub fn connect(kind: StoreKind, database: Option<&Path>) -> Result<Box<dyn ProfileStore>> {
    match kind {
        StoreKind::Null => Ok(Box::new(NullStore)),
        StoreKind::Triple => {
            let mut store = match database {
                Some(path) => TripleStore::at(path),
                None => TripleStore::in_memory(),
            };
            store.connect()?;
            Ok(Box::new(store))
        }
        StoreKind::ElasticHttp | StoreKind::ElasticNative => {
            Err(Error::UnsupportedBackend(kind.as_str()))
        }
    }
}

/// Store that accepts and discards every write.
#[derive(Debug, Default)]
pub struct NullStore;

impl ProfileStore for NullStore {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn index_values(&mut self, column: &ColumnId, values: &[String]) -> Result<()> {
        tracing::trace!(column = %column.iri(), count = values.len(), "discarding raw values");
        Ok(())
    }

    fn store_profile(&mut self, profile: &ColumnProfile) -> Result<()> {
        tracing::trace!(column = %profile.column.iri(), "discarding profile");
        Ok(())
    }

    fn tear_down(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(StoreKind::Null.code(), 0);
        assert_eq!(StoreKind::ElasticHttp.code(), 1);
        assert_eq!(StoreKind::ElasticNative.code(), 2);
        assert_eq!(StoreKind::Triple.code(), 3);
    }

    #[test]
    fn test_kind_from_name_or_code() {
        assert_eq!(StoreKind::from_str("triple").unwrap(), StoreKind::Triple);
        assert_eq!(StoreKind::from_str("3").unwrap(), StoreKind::Triple);
        assert_eq!(StoreKind::from_str("NULL").unwrap(), StoreKind::Null);
        assert!(StoreKind::from_str("graphite").is_err());
    }

    #[test]
    fn test_listing_is_cached_and_complete() {
        let listing = StoreKind::listing();
        assert_eq!(
            listing,
            "null(0), elastic-http(1), elastic-native(2), triple(3)"
        );
        // Same allocation on every access.
        assert!(std::ptr::eq(listing, StoreKind::listing()));
    }

    #[test]
    fn test_open_unsupported_backend() {
        assert!(matches!(
            open(StoreKind::ElasticHttp, None),
            Err(Error::UnsupportedBackend("elastic-http"))
        ));
    }

    #[test]
    fn test_connect_preserves_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("colprof.db");

        let mut store = open(StoreKind::Triple, Some(&db_path)).unwrap();
        store.init().unwrap();
        store
            .index_values(&ColumnId::new(1, "db", "/p", "src", "a"), &["x".to_string()])
            .unwrap();
        store.tear_down().unwrap();

        // Reconnecting does not clear; the earlier column is still there.
        let mut store = connect(StoreKind::Triple, Some(&db_path)).unwrap();
        store
            .index_values(&ColumnId::new(2, "db", "/p", "src", "b"), &["y".to_string()])
            .unwrap();
        store.tear_down().unwrap();

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let subjects: i64 = conn
            .query_row("SELECT COUNT(DISTINCT subject) FROM statements", [], |row| row.get(0))
            .unwrap();
        assert_eq!(subjects, 2);
    }

    #[test]
    fn test_null_store_accepts_everything() {
        let mut store = NullStore;
        store.init().unwrap();
        let column = ColumnId::new(1, "db", "/p", "src", "col");
        store.index_values(&column, &["a".to_string()]).unwrap();
        store.tear_down().unwrap();
    }
}
