//! Database facade: wires the catalog, the page cache, and transaction id
//! generation together so callers and tests have a single entry point.

use crate::access::schema::TupleDesc;
use crate::catalog::{Catalog, TableId};
use crate::storage::buffer::{PageCache, DEFAULT_CACHE_PAGES};
use crate::storage::error::StorageResult;
use crate::storage::page::DEFAULT_PAGE_SIZE;
use crate::transaction::{TransactionId, TransactionIdGenerator};
use std::path::Path;
use std::sync::Arc;

pub struct Database {
    catalog: Arc<Catalog>,
    page_cache: Arc<PageCache>,
    txn_ids: TransactionIdGenerator,
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_PAGE_SIZE, DEFAULT_CACHE_PAGES)
    }

    /// A database with the given page size (fixed for this instance) and
    /// page cache capacity.
    pub fn with_config(page_size: usize, cache_pages: usize) -> Self {
        let catalog = Arc::new(Catalog::with_page_size(page_size));
        let page_cache = Arc::new(PageCache::new(Arc::clone(&catalog), cache_pages));
        Self {
            catalog,
            page_cache,
            txn_ids: TransactionIdGenerator::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn page_cache(&self) -> &Arc<PageCache> {
        &self.page_cache
    }

    pub fn create_table(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        schema: TupleDesc,
    ) -> StorageResult<TableId> {
        self.catalog.add_table(name, path, schema)
    }

    /// Starts a new transaction.
    pub fn begin(&self) -> TransactionId {
        self.txn_ids.next()
    }

    /// Commits `tid`: dirtied pages are flushed, locks released.
    pub fn commit(&self, tid: TransactionId) -> StorageResult<()> {
        self.page_cache.transaction_complete(tid, true)
    }

    /// Aborts `tid`: its in-memory page state is discarded, locks released.
    pub fn abort(&self, tid: TransactionId) -> StorageResult<()> {
        self.page_cache.transaction_complete(tid, false)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
