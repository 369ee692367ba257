//! Multi-threaded transaction scenarios: transactions are plain threads
//! sharing one database, blocking on page locks by polling.

use anyhow::Result;
use heapdb::access::heap::HeapFileScan;
use heapdb::access::schema::TupleDesc;
use heapdb::access::tuple::Tuple;
use heapdb::access::value::{DataType, Value};
use heapdb::catalog::TableId;
use heapdb::concurrency::lock::LockMode;
use heapdb::database::Database;
use heapdb::storage::error::StorageError;
use heapdb::storage::page::PageId;
use heapdb::transaction::TransactionId;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int_schema() -> TupleDesc {
    TupleDesc::with_names(&[DataType::Int], &["n"])
}

/// A database with one table seeded with `rows` committed values.
fn seeded_db(rows: &[i32]) -> Result<(tempfile::TempDir, Arc<Database>, TableId)> {
    init_logging();
    let dir = tempdir()?;
    let db = Arc::new(Database::with_config(256, 16));
    let table_id = db.create_table("t", dir.path().join("t.dat"), int_schema())?;

    let tid = db.begin();
    for &v in rows {
        let mut t = Tuple::new(int_schema(), vec![Value::Int(v)])?;
        db.page_cache().insert_tuple(tid, table_id, &mut t)?;
    }
    db.commit(tid)?;
    Ok((dir, db, table_id))
}

fn read_all(db: &Arc<Database>, table_id: TableId, tid: TransactionId) -> Result<Vec<i32>> {
    let file = db.catalog().table_file(table_id)?;
    let mut scan = HeapFileScan::new(file, Arc::clone(db.page_cache()), tid);
    scan.open()?;
    let mut values = vec![];
    while scan.has_next()? {
        match scan.next()?.value(0) {
            Value::Int(v) => values.push(*v),
            other => panic!("unexpected value {:?}", other),
        }
    }
    values.sort();
    Ok(values)
}

#[test]
fn test_blocked_writer_granted_after_commit() -> Result<()> {
    let (_dir, db, table_id) = seeded_db(&[1])?;
    let pid = PageId::new(table_id, 0);

    // T1 reads the page and sits on its shared lock.
    let t1 = db.begin();
    db.page_cache().get_page(t1, pid, LockMode::Shared)?;

    // T2, on another thread, wants to write the same page and must wait.
    let (tx, rx) = mpsc::channel();
    let db2 = Arc::clone(&db);
    let writer = thread::spawn(move || -> Result<()> {
        let t2 = db2.begin();
        db2.page_cache().get_page(t2, pid, LockMode::Exclusive)?;
        tx.send(())?;
        db2.commit(t2)?;
        Ok(())
    });

    // Still blocked while T1 holds its lock.
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

    db.commit(t1)?;

    // Released now; the writer's next poll succeeds.
    rx.recv_timeout(Duration::from_secs(2))
        .expect("writer still blocked after commit");
    writer.join().unwrap()?;
    Ok(())
}

#[test]
fn test_lock_upgrade_in_place() -> Result<()> {
    let (_dir, db, table_id) = seeded_db(&[1])?;
    let pid = PageId::new(table_id, 0);

    let t1 = db.begin();
    db.page_cache().get_page(t1, pid, LockMode::Shared)?;
    // Sole reader: the same transaction upgrades without releasing.
    db.page_cache().get_page(t1, pid, LockMode::Exclusive)?;
    assert!(db.page_cache().holds_lock(t1, pid));

    // A second transaction cannot even read, and its wait budget runs out.
    let t2 = db.begin();
    let denied = db.page_cache().get_page(t2, pid, LockMode::Shared);
    assert!(matches!(denied, Err(StorageError::TransactionAborted(_))));
    db.abort(t2)?;

    db.commit(t1)?;

    // After commit the page is free again.
    let t3 = db.begin();
    db.page_cache().get_page(t3, pid, LockMode::Shared)?;
    db.commit(t3)?;
    Ok(())
}

#[test]
fn test_abort_on_other_thread_leaves_committed_data() -> Result<()> {
    let (_dir, db, table_id) = seeded_db(&[1, 2])?;

    let db2 = Arc::clone(&db);
    thread::spawn(move || -> Result<()> {
        let tid = db2.begin();
        let mut t = Tuple::new(int_schema(), vec![Value::Int(99)])?;
        db2.page_cache().insert_tuple(tid, table_id, &mut t)?;
        db2.abort(tid)?;
        Ok(())
    })
    .join()
    .unwrap()?;

    let tid = db.begin();
    assert_eq!(read_all(&db, table_id, tid)?, vec![1, 2]);
    db.commit(tid)?;
    Ok(())
}

#[test]
fn test_concurrent_committed_inserts_all_visible() -> Result<()> {
    const THREADS: i32 = 4;
    const ROWS_PER_THREAD: i32 = 5;

    let (_dir, db, table_id) = seeded_db(&[])?;

    let mut handles = vec![];
    for worker in 0..THREADS {
        let db = Arc::clone(&db);
        handles.push(thread::spawn(move || -> Result<()> {
            for i in 0..ROWS_PER_THREAD {
                let value = worker * ROWS_PER_THREAD + i;
                // Contention can exhaust the wait budget; an aborted
                // transaction is rolled back and the insert retried.
                loop {
                    let tid = db.begin();
                    let mut t = Tuple::new(int_schema(), vec![Value::Int(value)])?;
                    match db.page_cache().insert_tuple(tid, table_id, &mut t) {
                        Ok(()) => {
                            db.commit(tid)?;
                            break;
                        }
                        Err(StorageError::TransactionAborted(_)) => {
                            db.abort(tid)?;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().unwrap()?;
    }

    let tid = db.begin();
    let expected: Vec<i32> = (0..THREADS * ROWS_PER_THREAD).collect();
    assert_eq!(read_all(&db, table_id, tid)?, expected);
    db.commit(tid)?;
    Ok(())
}

#[test]
fn test_read_modify_write_is_serialized() -> Result<()> {
    const THREADS: usize = 3;
    const INCREMENTS: usize = 2;

    let (_dir, db, table_id) = seeded_db(&[0])?;

    let mut handles = vec![];
    for _ in 0..THREADS {
        let db = Arc::clone(&db);
        handles.push(thread::spawn(move || -> Result<()> {
            for _ in 0..INCREMENTS {
                // Replace the single counter row with its value plus one,
                // retrying the whole transaction when the lock wait budget
                // breaks a deadlock.
                loop {
                    let tid = db.begin();
                    match increment_once(&db, table_id, tid) {
                        Ok(()) => {
                            db.commit(tid)?;
                            break;
                        }
                        Err(StorageError::TransactionAborted(_)) => {
                            db.abort(tid)?;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().unwrap()?;
    }

    let tid = db.begin();
    let values = read_all(&db, table_id, tid)?;
    assert_eq!(values, vec![(THREADS * INCREMENTS) as i32]);
    db.commit(tid)?;
    Ok(())
}

fn increment_once(
    db: &Arc<Database>,
    table_id: TableId,
    tid: TransactionId,
) -> std::result::Result<(), StorageError> {
    let file = db.catalog().table_file(table_id)?;
    let mut scan = HeapFileScan::new(file, Arc::clone(db.page_cache()), tid);
    scan.open()?;
    let current = scan.next()?;
    let value = match current.value(0) {
        Value::Int(v) => *v,
        _ => unreachable!("counter table holds ints"),
    };
    scan.close();

    db.page_cache().delete_tuple(tid, &current)?;
    let mut next = Tuple::new(int_schema(), vec![Value::Int(value + 1)])?;
    db.page_cache().insert_tuple(tid, table_id, &mut next)?;
    Ok(())
}

#[test]
fn test_dirty_page_invisible_until_commit() -> Result<()> {
    let (_dir, db, table_id) = seeded_db(&[1])?;

    // T1 inserts but does not commit; its write lock keeps readers out.
    let t1 = db.begin();
    let mut t = Tuple::new(int_schema(), vec![Value::Int(2)])?;
    db.page_cache().insert_tuple(t1, table_id, &mut t)?;

    let (tx, rx) = mpsc::channel();
    let db2 = Arc::clone(&db);
    let reader = thread::spawn(move || -> Result<()> {
        let t2 = db2.begin();
        let values = read_all(&db2, table_id, t2)?;
        db2.commit(t2)?;
        tx.send(values)?;
        Ok(())
    });

    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    db.commit(t1)?;

    // The reader proceeds only after commit and sees both rows.
    let seen = rx.recv_timeout(Duration::from_secs(2))?;
    assert_eq!(seen, vec![1, 2]);
    reader.join().unwrap()?;
    Ok(())
}
