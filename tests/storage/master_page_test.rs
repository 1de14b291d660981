use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};

use kolom::storage::master_page::MasterPage;
use kolom::types::{error::StorageError, NO_PAGE};
use kolom::utils::mock::TempTable;

fn open_rw(path: &std::path::Path) -> std::fs::File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .unwrap()
}

#[test]
fn test_init_new_and_load_roundtrip() {
    let tmp = TempTable::with_prefix("master_roundtrip");
    let mut file = open_rw(&tmp.path);

    let mp = MasterPage::init_new(&mut file, 4096, 3).unwrap();
    assert_eq!(mp.page_size, 4096);
    assert_eq!(mp.num_columns, 3);
    assert_eq!(mp.head_page_ids, vec![NO_PAGE; 3]);

    // the file is exactly one page
    assert_eq!(file.metadata().unwrap().len(), 4096);

    let loaded = MasterPage::load(&mut file).unwrap();
    assert_eq!(loaded.magic, mp.magic);
    assert_eq!(loaded.page_size, 4096);
    assert_eq!(loaded.num_columns, 3);
    assert_eq!(loaded.head_page_ids, mp.head_page_ids);
}

#[test]
fn test_flush_persists_head_changes() {
    let tmp = TempTable::with_prefix("master_flush");
    let mut file = open_rw(&tmp.path);

    let mut mp = MasterPage::init_new(&mut file, 4096, 2).unwrap();
    mp.set_head(1, 42);
    mp.flush(&mut file).unwrap();

    let loaded = MasterPage::load(&mut file).unwrap();
    assert_eq!(loaded.head(0), NO_PAGE);
    assert_eq!(loaded.head(1), 42);
}

#[test]
fn test_load_rejects_bad_magic() {
    let tmp = TempTable::with_prefix("master_badmagic");
    let mut file = open_rw(&tmp.path);

    MasterPage::init_new(&mut file, 4096, 1).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(&[0xAA]).unwrap();
    file.sync_all().unwrap();

    assert!(matches!(
        MasterPage::load(&mut file),
        Err(StorageError::InvalidMagic { .. })
    ));
}

#[test]
fn test_init_new_validates_parameters() {
    let tmp = TempTable::with_prefix("master_params");
    let mut file = open_rw(&tmp.path);

    assert!(matches!(
        MasterPage::init_new(&mut file, 8, 1),
        Err(StorageError::PageSizeTooSmall(8))
    ));
    assert!(matches!(
        MasterPage::init_new(&mut file, 4096, 0),
        Err(StorageError::NoColumns)
    ));
}

#[test]
fn test_on_disk_layout_is_little_endian() {
    let tmp = TempTable::with_prefix("master_layout");
    let mut file = open_rw(&tmp.path);

    MasterPage::init_new(&mut file, 4096, 2).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut bytes = [0u8; 12];
    file.read_exact(&mut bytes).unwrap();

    assert_eq!(
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        0x4D44_5042
    );
    assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 4096);
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 2);
    assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), NO_PAGE);
    assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), NO_PAGE);
}
