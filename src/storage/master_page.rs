use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::storage::{MASTER_MAGIC, MIN_PAGE_SIZE};
use crate::types::{
    error::{Result, StorageError},
    ColumnId, PageId, NO_PAGE,
};

/// Page 0 of the table file: file-wide parameters plus one free-page head
/// pointer per column. The on-disk image is the fields below in order,
/// little-endian: magic (u32), page_size (u16), num_columns (u16), then
/// `num_columns` x u16 head page IDs.
#[derive(Debug)]
pub struct MasterPage {
    pub magic: u32,
    pub page_size: u16,
    pub num_columns: u16,
    pub head_page_ids: Vec<PageId>,
}

impl MasterPage {
    /// Create a fresh master page in an empty file. The file is truncated
    /// to exactly one page; anything after page 0 is discarded.
    pub fn init_new(file: &mut File, page_size: u16, num_columns: u16) -> Result<Self> {
        if page_size < MIN_PAGE_SIZE {
            return Err(StorageError::PageSizeTooSmall(page_size));
        }
        if num_columns == 0 {
            return Err(StorageError::NoColumns);
        }

        file.set_len(u64::from(page_size))?;

        let mp = Self {
            magic: MASTER_MAGIC,
            page_size,
            num_columns,
            head_page_ids: vec![NO_PAGE; num_columns as usize],
        };
        mp.flush(file)?;

        debug!(page_size, num_columns, "initialized master page");
        Ok(mp)
    }

    /// Load the master page from page 0 of an existing file.
    pub fn load(file: &mut File) -> Result<Self> {
        file.seek(SeekFrom::Start(0))?;

        let mut u32_buf = [0u8; 4];
        let mut u16_buf = [0u8; 2];

        file.read_exact(&mut u32_buf)?;
        let magic = u32::from_le_bytes(u32_buf);
        if magic != MASTER_MAGIC {
            return Err(StorageError::InvalidMagic {
                expected: MASTER_MAGIC,
                actual: magic,
            });
        }

        file.read_exact(&mut u16_buf)?;
        let page_size = u16::from_le_bytes(u16_buf);
        file.read_exact(&mut u16_buf)?;
        let num_columns = u16::from_le_bytes(u16_buf);

        let mut head_page_ids = Vec::with_capacity(num_columns as usize);
        for _ in 0..num_columns {
            file.read_exact(&mut u16_buf)?;
            head_page_ids.push(u16::from_le_bytes(u16_buf));
        }

        Ok(Self {
            magic,
            page_size,
            num_columns,
            head_page_ids,
        })
    }

    /// Rewrite page 0 with the current in-memory fields and fsync.
    pub fn flush(&self, file: &mut File) -> Result<()> {
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&self.magic.to_le_bytes())?;
        file.write_all(&self.page_size.to_le_bytes())?;
        file.write_all(&self.num_columns.to_le_bytes())?;
        for head in &self.head_page_ids {
            file.write_all(&head.to_le_bytes())?;
        }
        file.sync_all()?;
        Ok(())
    }

    pub fn head(&self, col: ColumnId) -> PageId {
        self.head_page_ids[col as usize]
    }

    pub fn set_head(&mut self, col: ColumnId, page_id: PageId) {
        self.head_page_ids[col as usize] = page_id;
    }
}
