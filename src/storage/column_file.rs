use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::storage::master_page::MasterPage;
use crate::types::{
    error::{Result, StorageError},
    page::{compute_capacity, ColumnPage},
    pack_slot_id, page_id_of, slot_idx_of, ColumnId, PageId, SlotId, Value, NO_PAGE,
};

/// Slot persistence and free-list management for one column.
///
/// All columns of a table share a single backing file; each `ColumnFile`
/// holds its own handle on it. The free-list head pointers live in the
/// `MasterPage`, which is owned by the `Table` and passed in by mutable
/// borrow, so columns never share ownership of it.
pub struct ColumnFile {
    file: File,
    col_idx: ColumnId,
    page_size: u16,
}

impl ColumnFile {
    pub fn open<P: AsRef<Path>>(path: P, master: &MasterPage, col_idx: ColumnId) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            file,
            col_idx,
            page_size: master.page_size,
        })
    }

    /// Allocate a slot, write `value` into it, and return its packed ID.
    ///
    /// Uses the column's head page when one is recorded; otherwise appends
    /// a fresh page at end-of-file and makes it the head. A page that
    /// fills up stops being the head until a later delete re-exposes it.
    pub fn alloc_slot(&mut self, master: &mut MasterPage, value: Value) -> Result<SlotId> {
        let page_id = self.allocate_or_fetch_page(master)?;
        let mut page = self.load_page(page_id)?;

        let slot_idx = page.find_free_slot().ok_or_else(|| StorageError::CorruptedPage {
            page_id,
            reason: "free-list head page has no free slot".to_string(),
        })?;
        page.write_value(slot_idx, value);
        page.mark_used(slot_idx);

        if page.is_full() {
            master.set_head(self.col_idx, NO_PAGE);
            master.flush(&mut self.file)?;
        }

        self.flush_page(&page)?;
        Ok(pack_slot_id(page_id, slot_idx))
    }

    /// Read back a slot. `None` when the slot index is out of range, the
    /// page was never allocated, or the slot is tombstoned.
    pub fn fetch_slot(&mut self, id: SlotId) -> Result<Option<Value>> {
        let page_id = page_id_of(id);
        let slot_idx = slot_idx_of(id);

        if !self.page_exists(page_id)? {
            return Ok(None);
        }
        let page = self.load_page(page_id)?;
        if slot_idx >= page.capacity || !page.tombstone[slot_idx as usize] {
            return Ok(None);
        }
        Ok(Some(page.read_value(slot_idx)))
    }

    /// Tombstone a slot. Out-of-range IDs and already-free slots are
    /// no-ops. A full page that regains space becomes the column's head
    /// again, even when another page currently holds that role.
    pub fn delete_slot(&mut self, master: &mut MasterPage, id: SlotId) -> Result<()> {
        let page_id = page_id_of(id);
        let slot_idx = slot_idx_of(id);

        if !self.page_exists(page_id)? {
            return Ok(());
        }
        let mut page = self.load_page(page_id)?;
        if slot_idx >= page.capacity {
            return Ok(());
        }

        let was_full = page.is_full();
        page.mark_deleted(slot_idx);

        if was_full && !page.is_full() {
            master.set_head(self.col_idx, page_id);
            master.flush(&mut self.file)?;
            debug!(col = self.col_idx, page_id, "re-exposed page as free-list head");
        }

        self.flush_page(&page)?;
        Ok(())
    }

    /// Head page ID, or a freshly appended page when none is recorded.
    fn allocate_or_fetch_page(&mut self, master: &mut MasterPage) -> Result<PageId> {
        let head = master.head(self.col_idx);
        if head != NO_PAGE {
            return Ok(head);
        }

        let end = self.file.seek(SeekFrom::End(0))?;
        let page_id = (end / u64::from(self.page_size)) as PageId;
        self.file.set_len(end + u64::from(self.page_size))?;

        let page = ColumnPage::new(page_id, compute_capacity(self.page_size));
        self.flush_page(&page)?;

        master.set_head(self.col_idx, page_id);
        master.flush(&mut self.file)?;

        debug!(col = self.col_idx, page_id, "appended column page");
        Ok(page_id)
    }

    fn page_offset(&self, page_id: PageId) -> u64 {
        u64::from(page_id) * u64::from(self.page_size)
    }

    fn page_exists(&mut self, page_id: PageId) -> Result<bool> {
        let len = self.file.metadata()?.len();
        Ok(self.page_offset(page_id) + u64::from(self.page_size) <= len)
    }

    fn load_page(&mut self, page_id: PageId) -> Result<ColumnPage> {
        self.file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        let mut buffer = vec![0u8; self.page_size as usize];
        self.file.read_exact(&mut buffer)?;
        ColumnPage::from_bytes(page_id, self.page_size, &buffer)
    }

    fn flush_page(&mut self, page: &ColumnPage) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.page_offset(page.page_id)))?;
        self.file.write_all(&page.to_bytes(self.page_size))?;
        self.file.sync_all()?;
        Ok(())
    }
}
