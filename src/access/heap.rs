//! Heap files: unordered page-at-a-time tuple storage, one file per table.
//!
//! A heap file never touches its pages directly during tuple operations;
//! every page visit goes through the page cache so the lock discipline and
//! dirty tracking stay in one place. Only raw block I/O (`read_page`,
//! `write_page`) talks to the file itself.

use crate::access::schema::TupleDesc;
use crate::access::tuple::{RecordId, Tuple};
use crate::catalog::TableId;
use crate::concurrency::lock::LockMode;
use crate::storage::buffer::PageCache;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::heap_page::HeapPage;
use crate::storage::page::{Page, PageId, SharedPage};
use crate::transaction::TransactionId;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

/// One table's on-disk backing store: a flat sequence of fixed-size pages.
pub struct HeapFile {
    table_id: TableId,
    schema: TupleDesc,
    page_size: usize,
    file: Mutex<std::fs::File>,
}

impl HeapFile {
    /// Opens the file at `path`, creating it if absent.
    pub fn open(
        path: impl AsRef<Path>,
        table_id: TableId,
        schema: TupleDesc,
        page_size: usize,
    ) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self {
            table_id,
            schema,
            page_size,
            file: Mutex::new(file),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &TupleDesc {
        &self.schema
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reads exactly one page-sized block at the page's offset.
    ///
    /// Reading a page that does not exist, or hitting any I/O failure, is
    /// an error; a read failure is never papered over with an empty page.
    pub fn read_page(&self, pid: PageId) -> StorageResult<Page> {
        let mut file = self.file.lock();
        let offset = pid.page_no as u64 * self.page_size as u64;
        if offset >= file.metadata()?.len() {
            return Err(StorageError::PageNotFound(pid));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; self.page_size];
        file.read_exact(&mut data)?;
        Ok(Page::from_bytes(pid, data))
    }

    /// Writes the page's full byte image at its offset, extending the file
    /// when writing past the current end.
    pub fn write_page(&self, page: &Page) -> StorageResult<()> {
        let mut file = self.file.lock();
        let offset = page.id().page_no as u64 * self.page_size as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.data())?;
        file.sync_all()?;
        Ok(())
    }

    /// Current page count, computed freshly from the file length; this is
    /// authoritative for where new pages may be appended.
    pub fn num_pages(&self) -> StorageResult<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok(len.div_ceil(self.page_size as u64) as u32)
    }

    /// First-fit insert: scans existing pages under exclusive locks for a
    /// free slot; if none has room, appends a new page holding the tuple in
    /// slot 0 and persists it immediately. Returns the one modified page.
    pub fn insert_tuple(
        &self,
        cache: &PageCache,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> StorageResult<Vec<SharedPage>> {
        if tuple.desc() != &self.schema {
            return Err(StorageError::SchemaMismatch(
                "tuple schema does not match the table".to_string(),
            ));
        }
        let bytes = tuple.serialize()?;
        let tuple_size = self.schema.tuple_size();

        for page_no in 0..self.num_pages()? {
            let pid = PageId::new(self.table_id, page_no);
            let page = cache.get_page(tid, pid, LockMode::Exclusive)?;
            let mut guard = page.write();
            let mut heap = HeapPage::new(guard.data_mut(), tuple_size);
            if heap.free_slots() > 0 {
                let slot = heap.insert_tuple(&bytes)?;
                tuple.set_record_id(RecordId::new(pid, slot));
                drop(guard);
                return Ok(vec![page]);
            }
        }

        // Every existing page is full: append.
        let pid = PageId::new(self.table_id, self.num_pages()?);
        let mut page = Page::new(pid, self.page_size);
        let mut heap = HeapPage::new(page.data_mut(), tuple_size);
        let slot = heap.insert_tuple(&bytes)?;
        tuple.set_record_id(RecordId::new(pid, slot));
        self.write_page(&page)?;
        log::debug!("{} appended page {} to table {}", tid, pid, self.table_id);
        Ok(vec![Arc::new(RwLock::new(page))])
    }

    /// Deletes the tuple at its stored record id by clearing the slot bit.
    /// No scan, no compaction. Returns the one modified page.
    pub fn delete_tuple(
        &self,
        cache: &PageCache,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> StorageResult<Vec<SharedPage>> {
        let rid = tuple.record_id().ok_or_else(|| {
            StorageError::SchemaMismatch("tuple has no on-disk record id".to_string())
        })?;
        let page = cache.get_page(tid, rid.page_id, LockMode::Exclusive)?;
        {
            let mut guard = page.write();
            let mut heap = HeapPage::new(guard.data_mut(), self.schema.tuple_size());
            heap.delete_tuple(rid.slot)?;
        }
        Ok(vec![page])
    }
}

struct ScanState {
    next_page_no: u32,
    buffered: VecDeque<Tuple>,
}

/// Single-pass sequential scan across pages 0..num_pages, skipping
/// unoccupied slots. Pages are fetched through the cache under exclusive
/// locks, which stay held for the remainder of the transaction.
pub struct HeapFileScan {
    file: Arc<HeapFile>,
    cache: Arc<PageCache>,
    tid: TransactionId,
    state: Option<ScanState>,
}

impl HeapFileScan {
    /// A lazy forward-only scan over all tuples in `file`.
    pub fn new(file: Arc<HeapFile>, cache: Arc<PageCache>, tid: TransactionId) -> Self {
        Self {
            file,
            cache,
            tid,
            state: None,
        }
    }

    /// Positions the scan before the first tuple. Must be called before
    /// `next` or `has_next`.
    pub fn open(&mut self) -> StorageResult<()> {
        self.state = Some(ScanState {
            next_page_no: 0,
            buffered: VecDeque::new(),
        });
        Ok(())
    }

    /// Resets an open scan back to page 0.
    pub fn rewind(&mut self) -> StorageResult<()> {
        if self.state.is_none() {
            return Err(StorageError::NoSuchElement);
        }
        self.open()
    }

    pub fn close(&mut self) {
        self.state = None;
    }

    /// Whether another tuple remains. False on a closed/unopened scan.
    pub fn has_next(&mut self) -> StorageResult<bool> {
        if self.state.is_none() {
            return Ok(false);
        }
        self.fill_buffer()?;
        Ok(self
            .state
            .as_ref()
            .is_some_and(|s| !s.buffered.is_empty()))
    }

    /// The next tuple, with its record id set. `NoSuchElement` when the
    /// scan is exhausted or was never opened.
    pub fn next(&mut self) -> StorageResult<Tuple> {
        if !self.has_next()? {
            return Err(StorageError::NoSuchElement);
        }
        self.state
            .as_mut()
            .and_then(|state| state.buffered.pop_front())
            .ok_or(StorageError::NoSuchElement)
    }

    /// Loads pages until a tuple is buffered or the file is exhausted.
    fn fill_buffer(&mut self) -> StorageResult<()> {
        let num_pages = self.file.num_pages()?;
        let state = match self.state.as_mut() {
            Some(state) => state,
            None => return Ok(()),
        };
        let tuple_size = self.file.schema().tuple_size();

        while state.buffered.is_empty() && state.next_page_no < num_pages {
            let pid = PageId::new(self.file.table_id(), state.next_page_no);
            state.next_page_no += 1;

            let page = self.cache.get_page(self.tid, pid, LockMode::Exclusive)?;
            let mut guard = page.write();
            let heap = HeapPage::new(guard.data_mut(), tuple_size);
            for slot in 0..heap.num_slots() as u16 {
                if heap.slot_used(slot) {
                    let mut tuple = Tuple::deserialize(self.file.schema(), heap.tuple_bytes(slot)?)?;
                    tuple.set_record_id(RecordId::new(pid, slot));
                    state.buffered.push_back(tuple);
                }
            }
        }
        Ok(())
    }
}
