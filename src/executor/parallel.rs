use rayon::prelude::*;

use crate::executor::{aggregate::sum_seq, scan::scan_equals_seq};
use crate::types::{RowId, Value};

/// Data-parallel accelerator contract for the analytics primitives. The
/// storage layers never depend on a concrete engine; results must be
/// bit-identical to the sequential kernels, including output order.
pub trait ParallelEngine {
    /// Side-effect-free and cheap; consulted on every dispatch.
    fn is_available(&self) -> bool;

    /// Row IDs at every index where `values[i] == needle`, ascending by
    /// input index.
    fn scan_equals(&self, values: &[Value], row_ids: &[RowId], needle: Value) -> Vec<RowId>;

    /// Exact 64-bit unsigned sum.
    fn sum(&self, values: &[Value]) -> u64;
}

/// Thread-pool engine backed by rayon.
#[derive(Debug, Default)]
pub struct RayonEngine;

impl ParallelEngine for RayonEngine {
    fn is_available(&self) -> bool {
        true
    }

    // Indexed parallel iterators keep the source order through
    // filter/collect, so the output matches the sequential reference.
    fn scan_equals(&self, values: &[Value], row_ids: &[RowId], needle: Value) -> Vec<RowId> {
        debug_assert_eq!(values.len(), row_ids.len());
        (0..values.len())
            .into_par_iter()
            .filter(|&i| values[i] == needle)
            .map(|i| row_ids[i])
            .collect()
    }

    fn sum(&self, values: &[Value]) -> u64 {
        values.par_iter().map(|&v| u64::from(v)).sum()
    }
}

/// Always-unavailable engine; dispatch falls through to the sequential
/// kernels, which also serve as its fallback implementation.
#[derive(Debug, Default)]
pub struct NoopEngine;

impl ParallelEngine for NoopEngine {
    fn is_available(&self) -> bool {
        false
    }

    fn scan_equals(&self, values: &[Value], row_ids: &[RowId], needle: Value) -> Vec<RowId> {
        scan_equals_seq(values, row_ids, needle)
    }

    fn sum(&self, values: &[Value]) -> u64 {
        sum_seq(values)
    }
}
