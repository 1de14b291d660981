use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::storage::ROW_INDEX_MAGIC;
use crate::types::{
    error::{Result, StorageError},
    RowId, SlotId,
};

// magic(4) + num_columns(2) + reserved(2)
const INDEX_HEADER_SIZE: u64 = 8;

/*
 * Row index sidecar layout (little-endian), at <table path>.idx:
 *   Header:  magic(4) | num_columns(2) | reserved(2)
 *   Entries: status(1) | pad(3) | slot_ids(4 x num_columns)
 * The row ID is the 0-based entry position. Entries are never removed;
 * deletion flips the status byte in place.
 */

#[derive(Debug, Clone, PartialEq)]
struct RowEntry {
    live: bool,
    slots: Vec<SlotId>,
}

/// Persistent `row ID -> per-column slot IDs` map with tombstoning. The
/// file is the single authority for row IDs; it is re-read in full on open.
pub struct RowIndex {
    file: File,
    num_columns: u16,
    entries: Vec<RowEntry>,
    deleted_count: u32,
}

impl RowIndex {
    /// Sidecar path for a table file: the table path with `.idx` appended.
    pub fn sidecar_path<P: AsRef<Path>>(base: P) -> PathBuf {
        let mut os = base.as_ref().as_os_str().to_os_string();
        os.push(".idx");
        PathBuf::from(os)
    }

    /// Open the sidecar next to `base`, writing a fresh header when the
    /// file is empty, then load every entry into memory.
    pub fn open_or_create<P: AsRef<Path>>(base: P, num_columns: u16) -> Result<Self> {
        let path = Self::sidecar_path(base);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let mut index = Self {
            file,
            num_columns,
            entries: Vec::new(),
            deleted_count: 0,
        };

        if index.file.metadata()?.len() == 0 {
            index.write_header()?;
        }
        index.load_all()?;
        Ok(index)
    }

    fn write_header(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&ROW_INDEX_MAGIC.to_le_bytes())?;
        self.file.write_all(&self.num_columns.to_le_bytes())?;
        self.file.write_all(&0u16.to_le_bytes())?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Read the header and every complete entry. The file's embedded
    /// column count wins over the caller's when they disagree.
    fn load_all(&mut self) -> Result<()> {
        self.entries.clear();
        self.deleted_count = 0;

        self.file.seek(SeekFrom::Start(0))?;
        let mut u32_buf = [0u8; 4];
        let mut u16_buf = [0u8; 2];

        self.file.read_exact(&mut u32_buf)?;
        let magic = u32::from_le_bytes(u32_buf);
        if magic != ROW_INDEX_MAGIC {
            return Err(StorageError::InvalidMagic {
                expected: ROW_INDEX_MAGIC,
                actual: magic,
            });
        }

        self.file.read_exact(&mut u16_buf)?;
        let ncols = u16::from_le_bytes(u16_buf);
        self.file.read_exact(&mut u16_buf)?; // reserved

        if ncols == 0 {
            return Err(StorageError::CorruptedRowIndex {
                details: "header declares zero columns".to_string(),
            });
        }
        if ncols != self.num_columns {
            warn!(
                file = ncols,
                caller = self.num_columns,
                "row index column count mismatch, adopting file value"
            );
            self.num_columns = ncols;
        }

        let mut rest = Vec::new();
        self.file.read_to_end(&mut rest)?;

        let entry_size = self.entry_size() as usize;
        for chunk in rest.chunks_exact(entry_size) {
            let live = chunk[0] == 1;
            let mut slots = Vec::with_capacity(self.num_columns as usize);
            for c in 0..self.num_columns as usize {
                let at = 4 + c * 4;
                slots.push(u32::from_le_bytes([
                    chunk[at],
                    chunk[at + 1],
                    chunk[at + 2],
                    chunk[at + 3],
                ]));
            }
            if !live {
                self.deleted_count += 1;
            }
            self.entries.push(RowEntry { live, slots });
        }
        Ok(())
    }

    /// Append a row descriptor; the returned row ID is its entry position.
    pub fn append_row(&mut self, slots: Vec<SlotId>) -> Result<RowId> {
        if slots.len() != self.num_columns as usize {
            return Err(StorageError::ArityMismatch {
                expected: self.num_columns as usize,
                actual: slots.len(),
            });
        }

        let row_id = self.entries.len() as RowId;
        self.write_entry(row_id, true, &slots)?;
        self.entries.push(RowEntry { live: true, slots });
        Ok(row_id)
    }

    /// Slot IDs for a live row; `None` when out of range or deleted.
    pub fn fetch(&self, row_id: RowId) -> Option<&[SlotId]> {
        self.entries
            .get(row_id as usize)
            .filter(|e| e.live)
            .map(|e| e.slots.as_slice())
    }

    /// Flip a row to deleted, rewriting only its entry on disk. Idempotent;
    /// out-of-range row IDs are ignored.
    pub fn mark_deleted(&mut self, row_id: RowId) -> Result<()> {
        let Some(entry) = self.entries.get(row_id as usize) else {
            return Ok(());
        };
        if !entry.live {
            return Ok(());
        }

        let slots = entry.slots.clone();
        self.write_entry(row_id, false, &slots)?;
        self.entries[row_id as usize].live = false;
        self.deleted_count += 1;
        Ok(())
    }

    /// Rows ever recorded, deleted ones included.
    pub fn rows_recorded(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn live_rows(&self) -> u32 {
        self.rows_recorded() - self.deleted_count
    }

    /// Live entries in row-ID order.
    pub fn iter_live(&self) -> impl Iterator<Item = (RowId, &[SlotId])> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.live)
            .map(|(i, e)| (i as RowId, e.slots.as_slice()))
    }

    pub fn for_each_live<F: FnMut(RowId, &[SlotId])>(&self, mut f: F) {
        for (row_id, slots) in self.iter_live() {
            f(row_id, slots);
        }
    }

    fn entry_size(&self) -> u64 {
        4 + 4 * u64::from(self.num_columns)
    }

    fn write_entry(&mut self, row_id: RowId, live: bool, slots: &[SlotId]) -> Result<()> {
        let pos = INDEX_HEADER_SIZE + u64::from(row_id) * self.entry_size();
        self.file.seek(SeekFrom::Start(pos))?;

        let mut buffer = Vec::with_capacity(self.entry_size() as usize);
        buffer.push(live as u8);
        buffer.extend_from_slice(&[0u8; 3]);
        for slot in slots {
            buffer.extend_from_slice(&slot.to_le_bytes());
        }
        self.file.write_all(&buffer)?;
        self.file.sync_all()?;
        Ok(())
    }
}
