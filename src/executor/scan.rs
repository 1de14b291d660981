use crate::types::{RowId, Value};

/// Sequential scan-equals over a materialized column: row IDs of every
/// position whose value equals `needle`, in ascending input order. This is
/// the reference the data-parallel engine must reproduce exactly.
pub fn scan_equals_seq(values: &[Value], row_ids: &[RowId], needle: Value) -> Vec<RowId> {
    debug_assert_eq!(values.len(), row_ids.len());
    let mut out = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        if value == needle {
            out.push(row_ids[i]);
        }
    }
    out
}
