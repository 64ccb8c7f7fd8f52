pub mod columns;
pub mod grid;
pub mod memory;
pub mod row;
pub mod sheets;
#[allow(clippy::module_inception)]
pub mod store;

pub use grid::{GridMetadata, RowGrid, StoreError};
pub use row::Row;
pub use store::TabularStore;
