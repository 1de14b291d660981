use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::executor::{
    aggregate::sum_seq,
    parallel::{ParallelEngine, RayonEngine},
    scan::scan_equals_seq,
};
use crate::storage::{column_file::ColumnFile, master_page::MasterPage, row_index::RowIndex};
use crate::types::{
    error::{Result, StorageError},
    ColumnId, RowId, SlotId, Value,
};

/// One column of all live rows projected into dense memory; `values` and
/// `row_ids` are index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materialized {
    pub values: Vec<Value>,
    pub row_ids: Vec<RowId>,
}

/// A fixed-schema columnar table: one `ColumnFile` per column sharing a
/// single backing file, the master page with the per-column free-list
/// heads, and the row-index sidecar binding them into rows.
///
/// Analytics dispatch between the sequential kernels and a pluggable
/// data-parallel engine; both paths produce identical results, the knobs
/// are performance hints only.
pub struct Table {
    path: PathBuf,
    master: MasterPage,
    columns: Vec<ColumnFile>,
    row_index: RowIndex,

    engine: Box<dyn ParallelEngine>,
    use_parallel: bool,
    parallel_threshold: usize,
}

impl Table {
    /// Create a new table file at `path` and its `.idx` sidecar.
    pub fn create<P: AsRef<Path>>(path: P, page_size: u16, num_columns: u16) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let master = MasterPage::init_new(&mut file, page_size, num_columns)?;
        drop(file);
        debug!(path = %path.display(), page_size, num_columns, "created table");
        Self::attach(path, master)
    }

    /// Open an existing table, adopting the column count from its master.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let master = MasterPage::load(&mut file)?;
        drop(file);
        debug!(path = %path.display(), num_columns = master.num_columns, "opened table");
        Self::attach(path, master)
    }

    fn attach(path: PathBuf, master: MasterPage) -> Result<Self> {
        let mut columns = Vec::with_capacity(master.num_columns as usize);
        for col in 0..master.num_columns {
            columns.push(ColumnFile::open(&path, &master, col)?);
        }
        let row_index = RowIndex::open_or_create(&path, master.num_columns)?;

        Ok(Self {
            path,
            master,
            columns,
            row_index,
            engine: Box::new(RayonEngine),
            use_parallel: true,
            parallel_threshold: 4096,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_columns(&self) -> u16 {
        self.master.num_columns
    }

    /// Rows ever recorded, deleted ones included.
    pub fn rows_recorded(&self) -> u32 {
        self.row_index.rows_recorded()
    }

    pub fn live_rows(&self) -> u32 {
        self.row_index.live_rows()
    }

    // Dispatch knobs. Both paths compute the same answer; these only move
    // the crossover point.
    pub fn set_use_parallel(&mut self, on: bool) {
        self.use_parallel = on;
    }

    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = threshold;
    }

    pub fn set_engine(&mut self, engine: Box<dyn ParallelEngine>) {
        self.engine = engine;
    }

    /// Insert one row; `values` must have one entry per column. Slots are
    /// allocated column by column before the row descriptor is appended,
    /// so a crash mid-insert can leak slots but never records a row
    /// pointing at missing ones.
    pub fn insert_row(&mut self, values: &[Value]) -> Result<RowId> {
        if values.len() != self.columns.len() {
            return Err(StorageError::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let mut slots = Vec::with_capacity(values.len());
        for (column, &value) in self.columns.iter_mut().zip(values) {
            slots.push(column.alloc_slot(&mut self.master, value)?);
        }
        self.row_index.append_row(slots)
    }

    /// All column values of a row; a vector of `None` when the row is out
    /// of range or deleted.
    pub fn fetch_row(&mut self, row_id: RowId) -> Result<Vec<Option<Value>>> {
        let Some(slots) = self.row_index.fetch(row_id) else {
            return Ok(vec![None; self.columns.len()]);
        };

        let slots = slots.to_vec();
        let mut out = Vec::with_capacity(self.columns.len());
        for (column, slot) in self.columns.iter_mut().zip(slots) {
            out.push(column.fetch_slot(slot)?);
        }
        Ok(out)
    }

    /// Tombstone a row's slots in every column, then the row itself.
    /// Absent or already-deleted rows are a no-op.
    pub fn delete_row(&mut self, row_id: RowId) -> Result<()> {
        let Some(slots) = self.row_index.fetch(row_id) else {
            return Ok(());
        };

        let slots = slots.to_vec();
        for (column, slot) in self.columns.iter_mut().zip(slots) {
            column.delete_slot(&mut self.master, slot)?;
        }
        self.row_index.mark_deleted(row_id)
    }

    /// Project one column of every live row, in row-ID order. Slots that
    /// fetch as `None` (tombstoned out of band) are skipped.
    pub fn materialize_column(&mut self, col: ColumnId) -> Result<Vec<Value>> {
        Ok(self.materialize_column_with_row_ids(col)?.values)
    }

    pub fn materialize_column_with_row_ids(&mut self, col: ColumnId) -> Result<Materialized> {
        let col_idx = usize::from(col);
        if col_idx >= self.columns.len() {
            return Err(StorageError::ColumnIndexOutOfBounds {
                index: col_idx,
                count: self.columns.len(),
            });
        }

        let live: Vec<(RowId, SlotId)> = self
            .row_index
            .iter_live()
            .map(|(row_id, slots)| (row_id, slots[col_idx]))
            .collect();

        let mut out = Materialized {
            values: Vec::with_capacity(live.len()),
            row_ids: Vec::with_capacity(live.len()),
        };
        for (row_id, slot) in live {
            if let Some(value) = self.columns[col_idx].fetch_slot(slot)? {
                out.values.push(value);
                out.row_ids.push(row_id);
            }
        }
        Ok(out)
    }

    /// Sum a column over live rows in a 64-bit accumulator; the result is
    /// the low 32 bits.
    pub fn sum_column(&mut self, col: ColumnId) -> Result<Value> {
        let values = self.materialize_column(col)?;
        Ok(sum_seq(&values) as Value)
    }

    /// Row IDs of live rows whose value in `col` equals `needle`, in
    /// row-ID order. Large inputs go to the data-parallel engine.
    pub fn scan_equals(&mut self, col: ColumnId, needle: Value) -> Result<Vec<RowId>> {
        let m = self.materialize_column_with_row_ids(col)?;
        if self.dispatch_sequential(m.values.len()) {
            Ok(scan_equals_seq(&m.values, &m.row_ids, needle))
        } else {
            Ok(self.engine.scan_equals(&m.values, &m.row_ids, needle))
        }
    }

    /// `sum_column` with the same engine dispatch as `scan_equals`.
    pub fn sum_column_hybrid(&mut self, col: ColumnId) -> Result<Value> {
        let values = self.materialize_column(col)?;
        let sum = if self.dispatch_sequential(values.len()) {
            sum_seq(&values)
        } else {
            self.engine.sum(&values)
        };
        Ok(sum as Value)
    }

    fn dispatch_sequential(&self, input_len: usize) -> bool {
        !self.use_parallel || input_len < self.parallel_threshold || !self.engine.is_available()
    }
}
