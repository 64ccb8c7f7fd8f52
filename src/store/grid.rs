use async_trait::async_trait;
use thiserror::Error;

/// Errors from the tabular store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing grid could not be reached (network, auth, timeout). Retryable.
    #[error("Tabular store unavailable: {0}")]
    Unavailable(String),

    /// Lookup referenced a column the header does not declare. Config/programmer error.
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// The header row declares the same column name twice.
    #[error("Duplicate column '{column}' in header of table '{table}'")]
    DuplicateColumn { table: String, column: String },
}

/// Dimensions reported by the backing grid for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridMetadata {
    pub row_count: usize,
    pub column_count: usize,
}

/// Seam between [`TabularStore`](crate::store::TabularStore) and whatever holds
/// the actual cells. Row indices are 1-based to match the spreadsheet UI: the
/// header lives at index 1, data row k at index k+1.
#[async_trait]
pub trait RowGrid: Send + Sync {
    /// Full grid including the header row. An empty table yields an empty vec.
    async fn fetch_grid(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError>;

    /// Append one row after the last occupied row.
    async fn append_row(&self, table: &str, values: Vec<String>) -> Result<(), StoreError>;

    /// Overwrite the full row at `row_index` (1-based).
    async fn update_row(&self, table: &str, row_index: usize, values: Vec<String>)
        -> Result<(), StoreError>;

    /// Remove the row at `row_index` (1-based), shifting later rows up.
    async fn delete_row(&self, table: &str, row_index: usize) -> Result<(), StoreError>;

    /// Provision an empty table. No-op if it already exists.
    async fn create_table(&self, table: &str) -> Result<(), StoreError>;

    /// Dimensions of the named table. Errors if the table is missing.
    async fn grid_metadata(&self, table: &str) -> Result<GridMetadata, StoreError>;
}
