//! kolom: a minimal paged columnar table store.
//!
//! One backing file holds the master page (page 0) and fixed-size column
//! pages of u32 values with parallel tombstones; a `.idx` sidecar maps row
//! IDs to per-column slot IDs. Row-level insert/fetch/delete plus
//! column-wise analytics (materialize, scan-equals, sum) with a
//! threshold-gated data-parallel fast path.

pub mod executor;
pub mod storage;
pub mod types;
pub mod utils;

pub use storage::table::{Materialized, Table};
pub use types::error::{Result, StorageError};
pub use types::Value;
