use serde::{Deserialize, Serialize};

use crate::types::{error::StorageError, PageId, SlotIndex, Value, NO_PAGE, VALUE_SIZE};

pub const PAGE_HEADER_SIZE: usize = 8; // 4 x u16

/*
 * Column page layout on disk (little-endian):
 * ┌──────────────────────────────────────────────────────────────┐
 * │ PAGE HEADER (8 bytes)                                        │
 * │   page_id(2) | capacity(2) | count(2) | next_free_page(2)    │
 * ├──────────────────────────────────────────────────────────────┤
 * │ VALUES                                                       │
 * │   capacity x u32                                             │
 * ├──────────────────────────────────────────────────────────────┤
 * │ TOMBSTONES                                                   │
 * │   capacity x u8  (0 = free, 1 = used)                        │
 * ├──────────────────────────────────────────────────────────────┤
 * │ PADDING (unused up to page size)                             │
 * └──────────────────────────────────────────────────────────────┘
 */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPage {
    pub page_id: PageId,
    pub capacity: SlotIndex,
    pub count: SlotIndex,
    // Reserved for a linked free-page chain; always NO_PAGE in the
    // single-head design but carried through the format.
    pub next_free_page: PageId,

    pub values: Vec<Value>,
    pub tombstone: Vec<bool>,
}

/// Slots that fit in a page: header is 8 bytes, each slot costs its value
/// plus one tombstone byte.
pub fn compute_capacity(page_size: u16) -> SlotIndex {
    let usable = (page_size as usize).saturating_sub(PAGE_HEADER_SIZE);
    let per_slot = VALUE_SIZE + 1;
    (usable / per_slot).min(SlotIndex::MAX as usize) as SlotIndex
}

impl ColumnPage {
    pub fn new(page_id: PageId, capacity: SlotIndex) -> Self {
        Self {
            page_id,
            capacity,
            count: 0,
            next_free_page: NO_PAGE,
            values: vec![0; capacity as usize],
            tombstone: vec![false; capacity as usize],
        }
    }

    /// Lowest-index free slot, or `None` when the page is full. The
    /// lowest-first policy makes slot reuse after deletion deterministic.
    pub fn find_free_slot(&self) -> Option<SlotIndex> {
        self.tombstone
            .iter()
            .position(|used| !used)
            .map(|i| i as SlotIndex)
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Mark a slot used. Already-used slots and out-of-range indices are
    /// no-ops; `count` only changes on a real transition.
    pub fn mark_used(&mut self, slot_idx: SlotIndex) {
        if let Some(used) = self.tombstone.get_mut(slot_idx as usize) {
            if !*used {
                *used = true;
                self.count += 1;
            }
        }
    }

    /// Mark a slot free. Idempotent, same as `mark_used`.
    pub fn mark_deleted(&mut self, slot_idx: SlotIndex) {
        if let Some(used) = self.tombstone.get_mut(slot_idx as usize) {
            if *used {
                *used = false;
                self.count -= 1;
            }
        }
    }

    /// Read a slot's value. The caller checks the tombstone.
    pub fn read_value(&self, slot_idx: SlotIndex) -> Value {
        self.values[slot_idx as usize]
    }

    /// Write a slot's value without touching tombstone or count.
    pub fn write_value(&mut self, slot_idx: SlotIndex, value: Value) {
        self.values[slot_idx as usize] = value;
    }

    /// Serialize into a full page-size buffer following the documented
    /// layout. Trailing bytes stay zero.
    pub fn to_bytes(&self, page_size: u16) -> Vec<u8> {
        let mut buffer = vec![0u8; page_size as usize];
        let mut offset = 0;

        for field in [self.page_id, self.capacity, self.count, self.next_free_page] {
            buffer[offset..offset + 2].copy_from_slice(&field.to_le_bytes());
            offset += 2;
        }

        for value in &self.values {
            buffer[offset..offset + VALUE_SIZE].copy_from_slice(&value.to_le_bytes());
            offset += VALUE_SIZE;
        }

        for &used in &self.tombstone {
            buffer[offset] = used as u8;
            offset += 1;
        }

        buffer
    }

    /// Deserialize a page read from disk. A page whose header is all zeros
    /// was appended but never flushed with content; it deserializes as a
    /// fresh empty page at `page_id`.
    pub fn from_bytes(page_id: PageId, page_size: u16, bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() != page_size as usize {
            return Err(StorageError::CorruptedPage {
                page_id,
                reason: format!(
                    "expected {} page bytes, got {}",
                    page_size,
                    bytes.len()
                ),
            });
        }

        let stored_id = u16::from_le_bytes([bytes[0], bytes[1]]);
        let capacity = u16::from_le_bytes([bytes[2], bytes[3]]);
        let count = u16::from_le_bytes([bytes[4], bytes[5]]);
        let next_free_page = u16::from_le_bytes([bytes[6], bytes[7]]);

        if stored_id == 0 && capacity == 0 {
            return Ok(ColumnPage::new(page_id, compute_capacity(page_size)));
        }

        let body = PAGE_HEADER_SIZE + capacity as usize * (VALUE_SIZE + 1);
        if body > page_size as usize {
            return Err(StorageError::CorruptedPage {
                page_id,
                reason: format!("capacity {} exceeds page size {}", capacity, page_size),
            });
        }

        let mut offset = PAGE_HEADER_SIZE;
        let mut values = Vec::with_capacity(capacity as usize);
        for _ in 0..capacity {
            values.push(u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]));
            offset += VALUE_SIZE;
        }

        let mut tombstone = Vec::with_capacity(capacity as usize);
        for _ in 0..capacity {
            tombstone.push(bytes[offset] != 0);
            offset += 1;
        }

        Ok(Self {
            page_id: stored_id,
            capacity,
            count,
            next_free_page,
            values,
            tombstone,
        })
    }
}
