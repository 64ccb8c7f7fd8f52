//! In-process grid backend, used by the test suite and for local development
//! without spreadsheet credentials.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::grid::{GridMetadata, RowGrid, StoreError};

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Vec<String>>>,
    /// Tables forced to error on every access, to simulate an unreachable grid.
    poisoned: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryGrid {
    inner: RwLock<Inner>,
}

impl MemoryGrid {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a table wholesale, header row first.
    pub async fn seed(&self, table: &str, rows: Vec<Vec<&str>>) {
        let mut inner = self.inner.write().await;
        inner.tables.insert(
            table.to_string(),
            rows.into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect(),
        );
    }

    /// Make every access to `table` fail with `Unavailable`.
    pub async fn poison(&self, table: &str) {
        self.inner.write().await.poisoned.insert(table.to_string());
    }

    pub async fn heal(&self, table: &str) {
        self.inner.write().await.poisoned.remove(table);
    }

    /// Raw grid snapshot, for assertions.
    pub async fn snapshot(&self, table: &str) -> Option<Vec<Vec<String>>> {
        self.inner.read().await.tables.get(table).cloned()
    }

    fn check_poison(inner: &Inner, table: &str) -> Result<(), StoreError> {
        if inner.poisoned.contains(table) {
            return Err(StoreError::Unavailable(format!(
                "simulated outage for table '{table}'"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RowGrid for MemoryGrid {
    async fn fetch_grid(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let inner = self.inner.read().await;
        Self::check_poison(&inner, table)?;
        inner
            .tables
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::Unavailable(format!("no such table '{table}'")))
    }

    async fn append_row(&self, table: &str, values: Vec<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        Self::check_poison(&inner, table)?;
        inner.tables.entry(table.to_string()).or_default().push(values);
        Ok(())
    }

    async fn update_row(
        &self,
        table: &str,
        row_index: usize,
        values: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        Self::check_poison(&inner, table)?;
        let rows = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Unavailable(format!("no such table '{table}'")))?;
        if row_index == 0 || row_index > rows.len() {
            return Err(StoreError::Unavailable(format!(
                "row index {row_index} out of range for table '{table}'"
            )));
        }
        rows[row_index - 1] = values;
        Ok(())
    }

    async fn delete_row(&self, table: &str, row_index: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        Self::check_poison(&inner, table)?;
        let rows = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Unavailable(format!("no such table '{table}'")))?;
        if row_index == 0 || row_index > rows.len() {
            return Err(StoreError::Unavailable(format!(
                "row index {row_index} out of range for table '{table}'"
            )));
        }
        rows.remove(row_index - 1);
        Ok(())
    }

    async fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        Self::check_poison(&inner, table)?;
        inner.tables.entry(table.to_string()).or_default();
        Ok(())
    }

    async fn grid_metadata(&self, table: &str) -> Result<GridMetadata, StoreError> {
        let inner = self.inner.read().await;
        Self::check_poison(&inner, table)?;
        let rows = inner
            .tables
            .get(table)
            .ok_or_else(|| StoreError::Unavailable(format!("no such table '{table}'")))?;
        Ok(GridMetadata {
            row_count: rows.len(),
            column_count: rows.iter().map(Vec::len).max().unwrap_or(0),
        })
    }
}
