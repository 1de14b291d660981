use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use tempfile::env::temp_dir;

use crate::storage::row_index::RowIndex;

pub fn unix_timestamp_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos()
}

pub fn temp_table_path(prefix: &str) -> PathBuf {
    let mut path = temp_dir();
    path.push(format!("{}_{}_{}.tbl", prefix, std::process::id(), unix_timestamp_nanos()));
    path
}

/// Unique temp path for a table plus cleanup of the table file and its
/// `.idx` sidecar on drop. Tests create/open tables on `path` themselves,
/// so the same guard spans close-and-reopen scenarios.
pub struct TempTable {
    pub path: PathBuf,
}

impl TempTable {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            path: temp_table_path(prefix),
        }
    }
}

impl Drop for TempTable {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = fs::remove_file(RowIndex::sidecar_path(&self.path));
    }
}
