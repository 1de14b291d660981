pub mod error;
pub mod page;

// Common type aliases
pub type Value = u32;
pub type PageId = u16;
pub type SlotIndex = u16;
pub type SlotId = u32;
pub type RowId = u32;
pub type ColumnId = u16;

// Fixed value width; the page capacity math depends on it
pub const VALUE_SIZE: usize = 4;

// Sentinel page ID: "no page known to have free space"
pub const NO_PAGE: PageId = u16::MAX;

/// Pack a page ID and an in-page slot index into a 32-bit slot ID.
pub fn pack_slot_id(page_id: PageId, slot_idx: SlotIndex) -> SlotId {
    (SlotId::from(page_id) << 16) | SlotId::from(slot_idx)
}

/// Page half of a packed slot ID.
pub fn page_id_of(id: SlotId) -> PageId {
    (id >> 16) as PageId
}

/// Slot-index half of a packed slot ID.
pub fn slot_idx_of(id: SlotId) -> SlotIndex {
    (id & 0xFFFF) as SlotIndex
}
