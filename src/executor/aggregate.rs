use crate::types::Value;

/// Exact 64-bit sum of a materialized column.
pub fn sum_seq(values: &[Value]) -> u64 {
    values.iter().map(|&v| u64::from(v)).sum()
}
