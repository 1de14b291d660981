use std::fs;

use kolom::types::error::StorageError;
use kolom::utils::mock::TempTable;
use kolom::Table;

#[test]
fn test_insert_fetch_delete_three_columns() {
    let tmp = TempTable::with_prefix("table_crud");
    let mut table = Table::create(&tmp.path, 4096, 3).unwrap();

    assert_eq!(table.insert_row(&[10, 20, 30]).unwrap(), 0);
    assert_eq!(table.insert_row(&[11, 21, 31]).unwrap(), 1);
    assert_eq!(table.insert_row(&[12, 22, 32]).unwrap(), 2);

    assert_eq!(
        table.fetch_row(1).unwrap(),
        vec![Some(11), Some(21), Some(31)]
    );

    table.delete_row(1).unwrap();
    assert_eq!(table.fetch_row(1).unwrap(), vec![None, None, None]);

    // row IDs are never reused
    assert_eq!(table.insert_row(&[101, 201, 301]).unwrap(), 3);
    assert_eq!(
        table.fetch_row(3).unwrap(),
        vec![Some(101), Some(201), Some(301)]
    );
    assert_eq!(table.rows_recorded(), 4);
    assert_eq!(table.live_rows(), 3);
}

#[test]
fn test_scan_equals_and_sum() {
    let tmp = TempTable::with_prefix("table_scan");
    let mut table = Table::create(&tmp.path, 4096, 2).unwrap();

    for row in [[1, 10], [2, 20], [3, 30], [2, 40], [5, 50], [2, 60]] {
        table.insert_row(&row).unwrap();
    }

    assert_eq!(table.scan_equals(0, 2).unwrap(), vec![1, 3, 5]);
    assert_eq!(table.sum_column(1).unwrap(), 210);

    table.delete_row(1).unwrap();
    assert_eq!(table.scan_equals(0, 2).unwrap(), vec![3, 5]);
    assert_eq!(table.sum_column(1).unwrap(), 190);
    assert_eq!(table.scan_equals(0, 99).unwrap(), Vec::<u32>::new());
}

#[test]
fn test_materialize_column() {
    let tmp = TempTable::with_prefix("table_materialize");
    let mut table = Table::create(&tmp.path, 4096, 2).unwrap();

    // empty table materializes to nothing
    assert!(table.materialize_column(0).unwrap().is_empty());

    table.insert_row(&[7, 70]).unwrap();
    table.insert_row(&[8, 80]).unwrap();
    table.insert_row(&[9, 90]).unwrap();
    table.delete_row(0).unwrap();

    assert_eq!(table.materialize_column(1).unwrap(), vec![80, 90]);

    let m = table.materialize_column_with_row_ids(0).unwrap();
    assert_eq!(m.values, vec![8, 9]);
    assert_eq!(m.row_ids, vec![1, 2]);
}

#[test]
fn test_out_of_range_rows_are_tolerated() {
    let tmp = TempTable::with_prefix("table_oob");
    let mut table = Table::create(&tmp.path, 4096, 2).unwrap();
    table.insert_row(&[1, 2]).unwrap();

    assert_eq!(table.fetch_row(50).unwrap(), vec![None, None]);
    table.delete_row(50).unwrap();
    assert_eq!(table.live_rows(), 1);

    // double delete is a no-op as well
    table.delete_row(0).unwrap();
    table.delete_row(0).unwrap();
    assert_eq!(table.live_rows(), 0);
}

#[test]
fn test_contract_violations_surface_as_errors() {
    let tmp = TempTable::with_prefix("table_contract");
    let mut table = Table::create(&tmp.path, 4096, 2).unwrap();

    assert!(matches!(
        table.insert_row(&[1, 2, 3]),
        Err(StorageError::ArityMismatch {
            expected: 2,
            actual: 3
        })
    ));
    assert!(matches!(
        table.materialize_column(9),
        Err(StorageError::ColumnIndexOutOfBounds { index: 9, count: 2 })
    ));
    assert!(matches!(
        table.scan_equals(2, 0),
        Err(StorageError::ColumnIndexOutOfBounds { .. })
    ));
}

#[test]
fn test_sum_column_truncates_to_low_32_bits() {
    let tmp = TempTable::with_prefix("table_sum_overflow");
    let mut table = Table::create(&tmp.path, 4096, 1).unwrap();

    table.insert_row(&[u32::MAX]).unwrap();
    table.insert_row(&[u32::MAX]).unwrap();
    table.insert_row(&[5]).unwrap();

    let expected = (2 * u64::from(u32::MAX) + 5) as u32;
    assert_eq!(table.sum_column(0).unwrap(), expected);
}

#[test]
fn test_balanced_insert_delete_does_not_grow_file() {
    // page_size 28: capacity 4, so reuse is exercised immediately
    let tmp = TempTable::with_prefix("table_no_growth");
    let mut table = Table::create(&tmp.path, 28, 1).unwrap();

    for v in 0..4u32 {
        table.insert_row(&[v]).unwrap();
    }
    let size_full = fs::metadata(&tmp.path).unwrap().len();

    for _ in 0..20 {
        let row = table.insert_row(&[99]).unwrap();
        table.delete_row(row).unwrap();
    }

    // churn past the full page reuses freed slots instead of extending
    let size_after = fs::metadata(&tmp.path).unwrap().len();
    assert_eq!(size_after, size_full + 28);
}
