//! Capability-specific result rows and the Result Store.
//!
//! Each capability writes to its own table with its own columns. The only
//! fields every row shares are the (job id, model id) key, the correlation
//! id and the timing columns. [`ResultTable`] is the schema, [`ResultRow`]
//! the typed value, and [`ResultStore`] the persist/query front door that
//! enforces a descriptor's table and column allow-list.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::registry::CapabilityDescriptor;
use crate::store::StoreScope;
use crate::types::{DbId, Timestamp};

/// Output tables, one per capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultTable {
    Stt,
    Sa,
}

const STT_COLUMNS: &[&str] = &[
    "job_id",
    "model_id",
    "correlation_id",
    "transcription",
    "audio_duration",
    "start_time",
    "finish_time",
    "stt_duration",
    "inserted_at",
];

const SA_COLUMNS: &[&str] = &[
    "job_id",
    "model_id",
    "correlation_id",
    "emotion_result",
    "confidence_value",
    "audio_duration",
    "start_time",
    "finish_time",
    "sa_duration",
    "inserted_at",
];

impl ResultTable {
    /// Database table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stt => "stt_result",
            Self::Sa => "sa_result",
        }
    }

    /// Every column of the table, in schema order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Stt => STT_COLUMNS,
            Self::Sa => SA_COLUMNS,
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }
}

/// A row of `stt_result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SttResult {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
    pub transcription: String,
    /// Minutes, two decimals.
    pub audio_duration: f64,
    pub start_time: Timestamp,
    pub finish_time: Timestamp,
    /// Processing time in minutes, two decimals.
    pub stt_duration: f64,
    pub inserted_at: Timestamp,
}

/// A row of `sa_result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaResult {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
    pub emotion_result: String,
    pub confidence_value: f64,
    pub audio_duration: f64,
    pub start_time: Timestamp,
    pub finish_time: Timestamp,
    pub sa_duration: f64,
    pub inserted_at: Timestamp,
}

/// A result row of any capability.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    Stt(SttResult),
    Sa(SaResult),
}

impl ResultRow {
    pub fn table(&self) -> ResultTable {
        match self {
            Self::Stt(_) => ResultTable::Stt,
            Self::Sa(_) => ResultTable::Sa,
        }
    }

    pub fn job_id(&self) -> DbId {
        match self {
            Self::Stt(row) => row.job_id,
            Self::Sa(row) => row.job_id,
        }
    }

    pub fn model_id(&self) -> DbId {
        match self {
            Self::Stt(row) => row.model_id,
            Self::Sa(row) => row.model_id,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Stt(row) => &row.correlation_id,
            Self::Sa(row) => &row.correlation_id,
        }
    }

    pub fn inserted_at(&self) -> Timestamp {
        match self {
            Self::Stt(row) => row.inserted_at,
            Self::Sa(row) => row.inserted_at,
        }
    }

    /// Serialize the row and keep only `columns`, in that order.
    ///
    /// Columns the row does not have are skipped rather than emitted as
    /// `null`; the registry rejects such columns at load time anyway.
    pub fn project(&self, columns: &[String]) -> Result<Map<String, Value>, CoreError> {
        let value = match self {
            Self::Stt(row) => serde_json::to_value(row),
            Self::Sa(row) => serde_json::to_value(row),
        }
        .map_err(|e| CoreError::Internal(format!("Failed to serialize result row: {e}")))?;

        let Value::Object(mut full) = value else {
            return Err(CoreError::Internal(
                "Result row did not serialize to an object".into(),
            ));
        };

        let mut projected = Map::new();
        for column in columns {
            if let Some(v) = full.remove(column) {
                projected.insert(column.clone(), v);
            }
        }
        Ok(projected)
    }
}

/// A projected result row as returned to callers.
pub type ProjectedRow = Map<String, Value>;

/// Persists and queries result rows under a descriptor's schema.
pub struct ResultStore;

impl ResultStore {
    /// Write `row` to the descriptor's output table.
    ///
    /// Fails with `Internal` if the row belongs to another capability's
    /// table; a descriptor and its handler always agree, so this only trips
    /// on a wiring bug.
    pub async fn persist(
        scope: &mut dyn StoreScope,
        descriptor: &CapabilityDescriptor,
        row: &ResultRow,
    ) -> Result<(), CoreError> {
        if row.table() != descriptor.output_table {
            return Err(CoreError::Internal(format!(
                "Result row for table '{}' cannot be written for model '{}' (table '{}')",
                row.table().name(),
                descriptor.name,
                descriptor.output_table.name(),
            )));
        }

        scope.insert_result(row).await?;

        tracing::debug!(
            job_id = row.job_id(),
            model_id = row.model_id(),
            table = descriptor.output_table.name(),
            "Result row persisted",
        );
        Ok(())
    }

    /// Rows for `(model_id, correlation_id)` in insertion order, projected
    /// to the descriptor's output columns.
    ///
    /// Returns [`CoreError::NoResults`] when nothing matches.
    pub async fn query(
        scope: &mut dyn StoreScope,
        model_id: DbId,
        correlation_id: &str,
        descriptor: &CapabilityDescriptor,
    ) -> Result<Vec<ProjectedRow>, CoreError> {
        let rows = scope
            .list_results(descriptor.output_table, model_id, correlation_id)
            .await?;

        if rows.is_empty() {
            return Err(CoreError::NoResults {
                model_id,
                correlation_id: correlation_id.to_string(),
            });
        }

        rows.iter()
            .map(|row| row.project(&descriptor.output_columns))
            .collect()
    }
}
