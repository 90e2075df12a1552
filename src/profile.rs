//! Profile result types - the computed-statistics entity consumed by the store
//!
//! A profiled column is either:
//! - `Numeric`: min/max/avg/median/IQR over the parsed values
//! - `Text`: extracted entities plus a fixed-size minhash signature
//!
//! The wire tag is `"N"` / `"T"` (`dataType` field), matching the profiler's
//! interchange format. The enum is closed: store dispatch is exhaustive and
//! unrecognized tags are rejected when a document is deserialized.

use crate::column::ColumnId;
use serde::{Deserialize, Serialize};

/// Type-conditional statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType")]
pub enum ColumnStats {
    /// Numeric column: distribution statistics
    #[serde(rename = "N")]
    Numeric {
        #[serde(rename = "minValue")]
        min_value: f64,
        #[serde(rename = "maxValue")]
        max_value: f64,
        #[serde(rename = "avgValue")]
        avg_value: f64,
        median: f64,
        iqr: f64,
    },
    /// Text column: extracted entities and minhash signature
    #[serde(rename = "T")]
    Text {
        /// Named entities found in the values (may be empty)
        entities: Vec<String>,
        /// Fixed-size minhash signature
        #[serde(rename = "minHash")]
        min_hash: Vec<i64>,
    },
}

impl ColumnStats {
    /// Wire tag for the data type ("N" or "T")
    pub fn data_type(&self) -> &'static str {
        match self {
            ColumnStats::Numeric { .. } => "N",
            ColumnStats::Text { .. } => "T",
        }
    }
}

/// A computed profile for one column, ready to be persisted.
///
/// Produced by the profiling pipeline; the store consumes it by value and
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Identity of the profiled column
    #[serde(flatten)]
    pub column: ColumnId,
    /// Number of observed values
    #[serde(rename = "totalValues")]
    pub total_values: u64,
    /// Number of distinct observed values
    #[serde(rename = "uniqueValues")]
    pub unique_values: u64,
    /// Type-conditional statistics
    #[serde(flatten)]
    pub stats: ColumnStats,
}

impl ColumnProfile {
    /// Create a numeric profile
    pub fn numeric(
        column: ColumnId,
        total_values: u64,
        unique_values: u64,
        min_value: f64,
        max_value: f64,
        avg_value: f64,
        median: f64,
        iqr: f64,
    ) -> Self {
        Self {
            column,
            total_values,
            unique_values,
            stats: ColumnStats::Numeric {
                min_value,
                max_value,
                avg_value,
                median,
                iqr,
            },
        }
    }

    /// Create a text profile
    pub fn text(
        column: ColumnId,
        total_values: u64,
        unique_values: u64,
        entities: Vec<String>,
        min_hash: Vec<i64>,
    ) -> Self {
        Self {
            column,
            total_values,
            unique_values,
            stats: ColumnStats::Text { entities, min_hash },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_column() -> ColumnId {
        ColumnId::new(7, "sales_db", "/data/q1.csv", "csv_source", "region")
    }

    #[test]
    fn test_numeric_json_shape() {
        let profile = ColumnProfile::numeric(sample_column(), 100, 42, 1.0, 99.0, 50.5, 50.0, 20.0);
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["dataType"], "N");
        assert_eq!(json["dbName"], "sales_db");
        assert_eq!(json["totalValues"], 100);
        assert_eq!(json["minValue"], 1.0);
        assert!(json.get("minHash").is_none());

        let back: ColumnProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_text_json_shape() {
        let profile = ColumnProfile::text(
            sample_column(),
            3,
            2,
            vec!["LOCATION".to_string()],
            vec![11, 42, 7],
        );
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["dataType"], "T");
        assert_eq!(json["minHash"], serde_json::json!([11, 42, 7]));
        assert!(json.get("minValue").is_none());
        assert_eq!(profile.stats.data_type(), "T");
    }

    #[test]
    fn test_unknown_data_type_is_rejected() {
        let json = serde_json::json!({
            "id": 1, "dbName": "db", "path": "/p", "sourceName": "s", "columnName": "c",
            "totalValues": 1, "uniqueValues": 1,
            "dataType": "X"
        });
        assert!(serde_json::from_value::<ColumnProfile>(json).is_err());
    }
}
