use kolom::utils::mock::TempTable;
use kolom::Table;

#[test]
fn test_rows_survive_reopen() {
    let tmp = TempTable::with_prefix("persist_basic");

    {
        let mut table = Table::create(&tmp.path, 4096, 3).unwrap();
        assert_eq!(table.insert_row(&[10, 20, 30]).unwrap(), 0);
        assert_eq!(table.insert_row(&[11, 21, 31]).unwrap(), 1);
        assert_eq!(table.insert_row(&[12, 22, 32]).unwrap(), 2);
    }

    let mut table = Table::open(&tmp.path).unwrap();
    assert_eq!(table.num_columns(), 3);
    assert_eq!(
        table.fetch_row(0).unwrap(),
        vec![Some(10), Some(20), Some(30)]
    );
    assert_eq!(
        table.fetch_row(1).unwrap(),
        vec![Some(11), Some(21), Some(31)]
    );
    assert_eq!(
        table.fetch_row(2).unwrap(),
        vec![Some(12), Some(22), Some(32)]
    );

    // deletes performed after reopen behave like before the restart
    table.delete_row(1).unwrap();
    assert_eq!(table.fetch_row(1).unwrap(), vec![None, None, None]);
}

#[test]
fn test_inserts_continue_after_reopen() {
    let tmp = TempTable::with_prefix("persist_continue");

    {
        let mut table = Table::create(&tmp.path, 4096, 2).unwrap();
        table.insert_row(&[1, 2]).unwrap();
        table.insert_row(&[3, 4]).unwrap();
        table.delete_row(0).unwrap();
    }

    let mut table = Table::open(&tmp.path).unwrap();
    assert_eq!(table.rows_recorded(), 2);
    assert_eq!(table.live_rows(), 1);

    // the next row ID continues from the recorded count
    assert_eq!(table.insert_row(&[5, 6]).unwrap(), 2);
    assert_eq!(table.fetch_row(2).unwrap(), vec![Some(5), Some(6)]);
    assert_eq!(table.sum_column(0).unwrap(), 8);
}

#[test]
fn test_free_list_state_survives_reopen() {
    // capacity 4 pages so the head pointer matters right away
    let tmp = TempTable::with_prefix("persist_freelist");

    let first_batch;
    {
        let mut table = Table::create(&tmp.path, 28, 1).unwrap();
        for v in 0..4u32 {
            table.insert_row(&[v]).unwrap();
        }
        table.delete_row(2).unwrap();
        first_batch = std::fs::metadata(&tmp.path).unwrap().len();
    }

    let mut table = Table::open(&tmp.path).unwrap();
    // the reopened table reuses the freed slot instead of appending a page
    table.insert_row(&[42]).unwrap();
    assert_eq!(std::fs::metadata(&tmp.path).unwrap().len(), first_batch);
    assert_eq!(table.fetch_row(4).unwrap(), vec![Some(42)]);
}
