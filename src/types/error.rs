use thiserror::Error;

use crate::types::PageId;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic number: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    #[error("Page size {0} is too small to hold a single slot")]
    PageSizeTooSmall(u16),

    #[error("Table must have at least one column")]
    NoColumns,

    #[error("Column index {index} out of bounds (table has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Row arity mismatch: expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Corrupted page: page_id={page_id}, reason={reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Row index file is truncated or malformed: {details}")]
    CorruptedRowIndex { details: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;
