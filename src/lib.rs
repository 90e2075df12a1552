//! # Colprof - Column Profile Store
//!
//! Persistence layer for a column-profiling pipeline.
//!
//! Colprof provides:
//! - Stable, reversible column identifiers derived from source coordinates
//! - A data model for per-column statistical profiles (numeric and text)
//! - A backend-agnostic `ProfileStore` contract with atomic, per-call writes
//! - A transactional triple-store backend keeping raw samples and computed
//!   statistics in separate logical graphs

pub mod column;
pub mod config;
pub mod profile;
pub mod store;

// Re-exports for convenient access
pub use column::ColumnId;
pub use profile::{ColumnProfile, ColumnStats};
pub use store::triple::TripleStore;
pub use store::{NullStore, ProfileStore, StoreKind};

/// Result type alias for Colprof operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Colprof operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid column identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Store is not connected (call init first)")]
    NotConnected,

    #[error("Backend '{0}' is not available in this build")]
    UnsupportedBackend(&'static str),

    #[error("Unknown store kind: {0}")]
    UnknownStoreKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
