//! Statement table schema and the fixed vocabulary of graphs and predicates

/// Logical graph holding raw samples, column metadata and minhash signatures
pub const TEXT_GRAPH: &str = "colprof:text:graph";

/// Logical graph holding computed profile statistics
pub const PROFILE_GRAPH: &str = "colprof:profile:graph";

// Predicate vocabulary. Every statement written by this layer uses one of
// these; anything else in the table is foreign data and is left alone.
pub const PROP_ID: &str = "prop:id";
pub const PROP_DB_NAME: &str = "prop:dbName";
pub const PROP_PATH: &str = "prop:path";
pub const PROP_SOURCE_NAME: &str = "prop:sourceName";
pub const PROP_COLUMN_NAME: &str = "prop:columnName";
pub const PROP_VALUE: &str = "prop:value";
pub const PROP_DATA_TYPE: &str = "prop:dataType";
pub const PROP_TOTAL_VALUES: &str = "prop:totalValues";
pub const PROP_UNIQUE_VALUES: &str = "prop:uniqueValues";
pub const PROP_MIN_VALUE: &str = "prop:minValue";
pub const PROP_MAX_VALUE: &str = "prop:maxValue";
pub const PROP_AVG_VALUE: &str = "prop:avgValue";
pub const PROP_MEDIAN: &str = "prop:median";
pub const PROP_IQR: &str = "prop:iqr";
pub const PROP_ENTITIES: &str = "prop:entities";
pub const PROP_MIN_HASH: &str = "prop:minHash";

/// SQL to create the statements table.
///
/// One row per (subject, predicate, object, graph) quad. `idx` orders
/// multi-valued predicates (`prop:value`); single-valued predicates use 0.
/// The unique key is the slot, not the object: writing to an occupied slot
/// replaces its object. `literal_type` records the typed-literal kind of
/// the object.
pub const CREATE_STATEMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS statements (
    subject TEXT NOT NULL,
    predicate TEXT NOT NULL,
    object TEXT NOT NULL,
    literal_type TEXT NOT NULL,
    graph TEXT NOT NULL,
    idx INTEGER NOT NULL DEFAULT 0,
    UNIQUE(subject, predicate, graph, idx)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_statements_subject ON statements(subject, graph)",
    "CREATE INDEX IF NOT EXISTS idx_statements_graph ON statements(graph)",
    "CREATE INDEX IF NOT EXISTS idx_statements_predicate ON statements(predicate)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_STATEMENTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
