//! Delete operator.

use crate::access::schema::TupleDesc;
use crate::access::tuple::Tuple;
use crate::access::value::{DataType, Value};
use crate::executor::Executor;
use crate::storage::buffer::PageCache;
use crate::storage::error::StorageResult;
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Deletes every tuple its child produces, via the page cache, and emits a
/// single one-field tuple holding the number of deleted records.
pub struct DeleteExecutor {
    child: Box<dyn Executor>,
    cache: Arc<PageCache>,
    tid: TransactionId,
    schema: TupleDesc,
    emitted: bool,
}

impl DeleteExecutor {
    pub fn new(child: Box<dyn Executor>, cache: Arc<PageCache>, tid: TransactionId) -> Self {
        Self {
            child,
            cache,
            tid,
            schema: TupleDesc::with_names(&[DataType::Int], &["count"]),
            emitted: false,
        }
    }
}

impl Executor for DeleteExecutor {
    fn open(&mut self) -> StorageResult<()> {
        self.emitted = false;
        self.child.open()
    }

    fn next(&mut self) -> StorageResult<Option<Tuple>> {
        if self.emitted {
            return Ok(None);
        }
        self.emitted = true;

        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.cache.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        Ok(Some(Tuple::new(
            self.schema.clone(),
            vec![Value::Int(count)],
        )?))
    }

    fn rewind(&mut self) -> StorageResult<()> {
        self.emitted = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}
