//! Table catalog: resolves table ids to their heap files.
//!
//! The page cache consults the catalog on every miss to find the storage
//! collaborator for a page's table; it never constructs that mapping
//! itself. The page size is fixed here, once, for the whole instance.

use crate::access::heap::HeapFile;
use crate::access::schema::TupleDesc;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::DEFAULT_PAGE_SIZE;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A unique identifier for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct CatalogInner {
    tables: HashMap<TableId, Arc<HeapFile>>,
    names: HashMap<String, TableId>,
    next_table_id: u32,
}

/// Registry of all tables known to the engine.
pub struct Catalog {
    page_size: usize,
    inner: Mutex<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// A catalog whose tables all use `page_size`-byte pages. The size is
    /// fixed for the life of the instance.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            inner: Mutex::new(CatalogInner::default()),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Registers a table backed by the file at `path`, creating the file if
    /// it does not exist, and returns its id.
    pub fn add_table(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        schema: TupleDesc,
    ) -> StorageResult<TableId> {
        let mut inner = self.inner.lock();
        let table_id = TableId(inner.next_table_id);
        inner.next_table_id += 1;

        let file = HeapFile::open(path, table_id, schema, self.page_size)?;
        inner.tables.insert(table_id, Arc::new(file));
        inner.names.insert(name.to_string(), table_id);
        log::debug!("registered table {} as {}", name, table_id);
        Ok(table_id)
    }

    /// The storage collaborator for `table_id`.
    pub fn table_file(&self, table_id: TableId) -> StorageResult<Arc<HeapFile>> {
        self.inner
            .lock()
            .tables
            .get(&table_id)
            .cloned()
            .ok_or(StorageError::TableNotFound(table_id.0))
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.inner.lock().names.get(name).copied()
    }

    pub fn schema(&self, table_id: TableId) -> StorageResult<TupleDesc> {
        Ok(self.table_file(table_id)?.schema().clone())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
