use std::sync::Arc;

use crate::store::grid::{GridMetadata, RowGrid, StoreError};
use crate::store::row::Row;

/// Generic CRUD over a named table whose schema is its header row.
///
/// Columns are addressed by name, never by position, so a deployment may
/// reorder or append columns without a migration step. Every lookup is a full
/// linear scan over the grid; fine for manually-reviewed deal volumes, not for
/// tables beyond a few thousand rows.
#[derive(Clone)]
pub struct TabularStore {
    grid: Arc<dyn RowGrid>,
}

impl TabularStore {
    pub fn new(grid: Arc<dyn RowGrid>) -> Self {
        Self { grid }
    }

    /// All data rows of `table`. Header-only or empty tables yield an empty
    /// vec; an unreachable grid propagates as [`StoreError::Unavailable`].
    pub async fn get_all(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let grid = self.grid.fetch_grid(table).await?;
        if grid.len() < 2 {
            return Ok(Vec::new());
        }
        let header = Self::validated_header(table, &grid)?;
        Ok(grid[1..]
            .iter()
            .map(|cells| Row::from_header(&header, cells))
            .collect())
    }

    /// Header row of `table`, validated for uniqueness.
    pub async fn header(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let grid = self.grid.fetch_grid(table).await?;
        Self::validated_header(table, &grid)
    }

    /// First data row whose `column` equals `value` by exact string match.
    pub async fn find_by_column(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<Row>, StoreError> {
        Ok(self
            .find_position(table, column, value)
            .await?
            .map(|(_, row)| row))
    }

    /// Like [`find_by_column`](Self::find_by_column) but also reports the row's
    /// current 1-based grid index, for callers about to issue an index-addressed
    /// write. Re-resolve immediately before the write; a concurrent append or
    /// delete invalidates any older index.
    pub async fn find_position(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<(usize, Row)>, StoreError> {
        let grid = self.grid.fetch_grid(table).await?;
        // Unknown columns surface loudly even when the table has no data
        // rows; a zero-row table has an empty header and knows no columns
        let header = Self::validated_header(table, &grid)?;
        let col_index = header.iter().position(|c| c == column).ok_or_else(|| {
            StoreError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            }
        })?;

        for (offset, cells) in grid.iter().skip(1).enumerate() {
            let cell = cells.get(col_index).map(String::as_str).unwrap_or("");
            if cell == value {
                // Header is row 1, so data row k sits at grid index k+1
                return Ok(Some((offset + 2, Row::from_header(&header, cells))));
            }
        }
        Ok(None)
    }

    /// Append one row. Values are positional against the *current* header
    /// order; the store performs no schema validation.
    pub async fn append(&self, table: &str, values: Vec<String>) -> Result<(), StoreError> {
        self.grid.append_row(table, values).await
    }

    /// Overwrite the full row at a 1-based index. No partial-column update.
    pub async fn update_row(
        &self,
        table: &str,
        row_index: usize,
        values: Vec<String>,
    ) -> Result<(), StoreError> {
        self.grid.update_row(table, row_index, values).await
    }

    /// Remove the row at a 1-based index, shifting subsequent rows up.
    pub async fn delete_row(&self, table: &str, row_index: usize) -> Result<(), StoreError> {
        self.grid.delete_row(table, row_index).await
    }

    /// Never fails: any error (missing table, unreachable grid) reads as false.
    pub async fn table_exists(&self, table: &str) -> bool {
        self.grid.grid_metadata(table).await.is_ok()
    }

    /// Lazily provision `table` with `columns` as its header row. Existing
    /// non-empty tables are left untouched; a missing table is created first.
    pub async fn ensure_header(&self, table: &str, columns: &[&str]) -> Result<(), StoreError> {
        let empty = match self.grid.fetch_grid(table).await {
            Ok(grid) => grid.is_empty(),
            Err(_) => {
                // Tolerated: the table may simply not exist yet. A genuinely
                // unreachable grid will fail the create below instead.
                self.grid.create_table(table).await?;
                true
            }
        };
        if empty {
            tracing::info!(table, "provisioning header row");
            self.grid
                .append_row(table, columns.iter().map(|c| c.to_string()).collect())
                .await?;
        }
        Ok(())
    }

    /// Dimensions of `table`; used by the health endpoint as a liveness check.
    pub async fn metadata(&self, table: &str) -> Result<GridMetadata, StoreError> {
        self.grid.grid_metadata(table).await
    }

    fn validated_header(table: &str, grid: &[Vec<String>]) -> Result<Vec<String>, StoreError> {
        let header = grid.first().cloned().unwrap_or_default();
        for (i, column) in header.iter().enumerate() {
            if header[..i].contains(column) {
                return Err(StoreError::DuplicateColumn {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }
        Ok(header)
    }
}
