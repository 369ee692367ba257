//! Sequential scan operator.

use crate::access::heap::HeapFileScan;
use crate::access::schema::TupleDesc;
use crate::access::tuple::Tuple;
use crate::catalog::{Catalog, TableId};
use crate::executor::Executor;
use crate::storage::buffer::PageCache;
use crate::storage::error::{StorageError, StorageResult};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Reads every tuple of one table, in page order, through the page cache.
pub struct SeqScanExecutor {
    catalog: Arc<Catalog>,
    cache: Arc<PageCache>,
    tid: TransactionId,
    table_id: TableId,
    schema: TupleDesc,
    scan: Option<HeapFileScan>,
}

impl SeqScanExecutor {
    pub fn new(
        catalog: Arc<Catalog>,
        cache: Arc<PageCache>,
        tid: TransactionId,
        table_id: TableId,
    ) -> StorageResult<Self> {
        let schema = catalog.schema(table_id)?;
        Ok(Self {
            catalog,
            cache,
            tid,
            table_id,
            schema,
            scan: None,
        })
    }
}

impl Executor for SeqScanExecutor {
    fn open(&mut self) -> StorageResult<()> {
        let file = self.catalog.table_file(self.table_id)?;
        let mut scan = HeapFileScan::new(file, Arc::clone(&self.cache), self.tid);
        scan.open()?;
        self.scan = Some(scan);
        Ok(())
    }

    fn next(&mut self) -> StorageResult<Option<Tuple>> {
        match self.scan.as_mut() {
            Some(scan) => {
                if scan.has_next()? {
                    Ok(Some(scan.next()?))
                } else {
                    Ok(None)
                }
            }
            None => Err(StorageError::NoSuchElement),
        }
    }

    fn rewind(&mut self) -> StorageResult<()> {
        match self.scan.as_mut() {
            Some(scan) => scan.rewind(),
            None => Err(StorageError::NoSuchElement),
        }
    }

    fn close(&mut self) {
        if let Some(scan) = self.scan.as_mut() {
            scan.close();
        }
        self.scan = None;
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::value::{DataType, Value};
    use crate::database::Database;
    use anyhow::Result;
    use tempfile::tempdir;

    fn seeded_db(rows: &[i32]) -> Result<(tempfile::TempDir, Database, TableId)> {
        let dir = tempdir()?;
        let db = Database::with_config(128, 8);
        let schema = TupleDesc::with_names(&[DataType::Int], &["n"]);
        let table_id = db.create_table("t", dir.path().join("t.dat"), schema.clone())?;

        let tid = db.begin();
        for &v in rows {
            let mut t = Tuple::new(schema.clone(), vec![Value::Int(v)])?;
            db.page_cache().insert_tuple(tid, table_id, &mut t)?;
        }
        db.commit(tid)?;
        Ok((dir, db, table_id))
    }

    #[test]
    fn test_scan_returns_all_rows() -> Result<()> {
        let (_dir, db, table_id) = seeded_db(&[1, 2, 3])?;
        let tid = db.begin();
        let mut scan = SeqScanExecutor::new(
            Arc::clone(db.catalog()),
            Arc::clone(db.page_cache()),
            tid,
            table_id,
        )?;

        scan.open()?;
        let mut values = vec![];
        while let Some(t) = scan.next()? {
            match t.value(0) {
                Value::Int(v) => values.push(*v),
                other => panic!("unexpected value {:?}", other),
            }
        }
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);

        scan.rewind()?;
        assert!(scan.next()?.is_some());
        scan.close();
        db.commit(tid)?;
        Ok(())
    }

    #[test]
    fn test_next_before_open_fails() -> Result<()> {
        let (_dir, db, table_id) = seeded_db(&[1])?;
        let tid = db.begin();
        let mut scan = SeqScanExecutor::new(
            Arc::clone(db.catalog()),
            Arc::clone(db.page_cache()),
            tid,
            table_id,
        )?;
        assert!(matches!(scan.next(), Err(StorageError::NoSuchElement)));
        Ok(())
    }
}
