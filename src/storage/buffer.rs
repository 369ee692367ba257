//! The transactional page cache (buffer pool).
//!
//! Every page access, tuple insert, tuple delete, and transaction
//! completion flows through here. The cache checks that the calling
//! transaction holds the right lock before a page is handed out, bounds
//! the number of resident pages, and implements NO-STEAL/NO-FORCE
//! semantics: a page dirtied by an uncommitted transaction is never
//! written to disk, and abort simply discards the in-memory images so the
//! next reader re-loads the clean on-disk version.

use crate::catalog::{Catalog, TableId};
use crate::concurrency::lock::{LockManager, LockMode};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, SharedPage};
use crate::transaction::TransactionId;
use crate::access::tuple::Tuple;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default number of cached pages.
pub const DEFAULT_CACHE_PAGES: usize = 50;

/// Lock-wait budget: a `get_page` call polls the lock this many times,
/// sleeping [`LOCK_RETRY_INTERVAL`] between attempts, before aborting the
/// transaction. A crude contention breaker, not deadlock detection.
const LOCK_RETRY_LIMIT: u32 = 10;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded in-memory store of pages, shared by all transactions.
pub struct PageCache {
    catalog: Arc<Catalog>,
    lock_manager: LockManager,
    /// The page table. One global critical section guards every
    /// cache-modifying sequence, so capacity checks, eviction, and
    /// insertion are a single atomic step.
    pages: Mutex<HashMap<PageId, SharedPage>>,
    capacity: usize,
}

impl PageCache {
    /// A cache holding at most `capacity` pages at once.
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self {
            catalog,
            lock_manager: LockManager::new(),
            pages: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.pages.lock().len()
    }

    /// Retrieves the page, acquiring the requested lock first.
    ///
    /// Blocks the calling thread by polling: on each failed acquisition it
    /// sleeps for a fixed interval and retries, and after the budget is
    /// exhausted it fails with [`StorageError::TransactionAborted`]; the
    /// caller must then roll the transaction back. A lock holder releasing
    /// does not wake waiters; they re-poll.
    ///
    /// On a cache miss the page is loaded from the owning table's heap
    /// file, evicting a clean page first if the cache is at capacity.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> StorageResult<SharedPage> {
        let mut attempts = 0;
        while !self.lock_manager.try_acquire(tid, pid, mode) {
            attempts += 1;
            if attempts > LOCK_RETRY_LIMIT {
                log::warn!("{} timed out waiting for {:?} on page {}", tid, mode, pid);
                return Err(StorageError::TransactionAborted(tid));
            }
            std::thread::sleep(LOCK_RETRY_INTERVAL);
        }

        let mut pages = self.pages.lock();
        if let Some(page) = pages.get(&pid) {
            return Ok(Arc::clone(page));
        }

        let file = self.catalog.table_file(pid.table_id)?;
        let page = file.read_page(pid)?;
        if pages.len() >= self.capacity {
            Self::evict(&mut pages)?;
        }
        let page = Arc::new(RwLock::new(page));
        pages.insert(pid, Arc::clone(&page));
        Ok(page)
    }

    /// Adds a tuple to `table_id` on behalf of `tid`, taking write locks on
    /// every page the heap file touches. Pages modified by the insert are
    /// marked dirty and (re)admitted to the cache.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> StorageResult<()> {
        let file = self.catalog.table_file(table_id)?;
        let touched = file.insert_tuple(self, tid, tuple)?;
        self.admit_dirty(tid, touched)
    }

    /// Removes a tuple located by its record id, marking the modified page
    /// dirty and (re)admitting it to the cache.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> StorageResult<()> {
        let rid = tuple.record_id().ok_or_else(|| {
            StorageError::SchemaMismatch("tuple has no on-disk record id".to_string())
        })?;
        let file = self.catalog.table_file(rid.page_id.table_id)?;
        let touched = file.delete_tuple(self, tid, tuple)?;
        self.admit_dirty(tid, touched)
    }

    fn admit_dirty(&self, tid: TransactionId, touched: Vec<SharedPage>) -> StorageResult<()> {
        let mut pages = self.pages.lock();
        for page in touched {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(Some(tid));
                guard.id()
            };
            if !pages.contains_key(&pid) && pages.len() >= self.capacity {
                Self::evict(&mut pages)?;
            }
            pages.insert(pid, page);
        }
        Ok(())
    }

    /// Commits or aborts `tid`, then releases all of its locks.
    ///
    /// Commit flushes every page `tid` dirtied and clears their dirty
    /// flags. Abort discards from the cache every page `tid` dirtied, plus
    /// every page `tid` holds a write lock on (covering pages mutated but
    /// not yet re-marked); the next reader re-loads the on-disk version.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> StorageResult<()> {
        if commit {
            self.flush_pages(tid)?;
        } else {
            let mut pages = self.pages.lock();
            let doomed: Vec<PageId> = pages
                .iter()
                .filter(|(pid, page)| {
                    page.read().dirtier() == Some(tid)
                        || self.lock_manager.holding(tid, **pid) == Some(LockMode::Exclusive)
                })
                .map(|(pid, _)| *pid)
                .collect();
            for pid in &doomed {
                pages.remove(pid);
            }
            log::debug!("{} aborted, discarded {} page(s)", tid, doomed.len());
        }
        self.lock_manager.release_all(tid);
        Ok(())
    }

    /// True if `tid` holds a lock of either mode on `pid`.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds(tid, pid)
    }

    /// Releases `tid`'s lock on one page before the transaction completes.
    ///
    /// This breaks the strictness of two-phase locking: once released,
    /// another transaction can read state the releasing transaction may
    /// still abort. Callers must have proven for themselves that this is
    /// safe; nothing in the engine calls it.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    /// Writes the page to its table's file if it is dirty; a no-op when
    /// the page is clean or not cached.
    pub fn flush_page(&self, pid: PageId) -> StorageResult<()> {
        let pages = self.pages.lock();
        self.flush_one(&pages, pid)
    }

    /// Flushes every dirty page `tid` owns and clears their dirty flags.
    pub fn flush_pages(&self, tid: TransactionId) -> StorageResult<()> {
        let pages = self.pages.lock();
        let owned: Vec<PageId> = pages
            .iter()
            .filter(|(_, page)| page.read().dirtier() == Some(tid))
            .map(|(pid, _)| *pid)
            .collect();
        for pid in owned {
            self.flush_one(&pages, pid)?;
        }
        Ok(())
    }

    /// Flushes every dirty page in the cache.
    ///
    /// Writes uncommitted data to disk, breaking NO-STEAL; administrative
    /// use only (e.g. orderly shutdown with no live transactions).
    pub fn flush_all_pages(&self) -> StorageResult<()> {
        let pages = self.pages.lock();
        let all: Vec<PageId> = pages.keys().copied().collect();
        for pid in all {
            self.flush_one(&pages, pid)?;
        }
        Ok(())
    }

    /// Drops the page from the cache without flushing.
    pub fn discard_page(&self, pid: PageId) {
        self.pages.lock().remove(&pid);
    }

    fn flush_one(&self, pages: &HashMap<PageId, SharedPage>, pid: PageId) -> StorageResult<()> {
        if let Some(page) = pages.get(&pid) {
            let mut guard = page.write();
            if guard.is_dirty() {
                let file = self.catalog.table_file(pid.table_id)?;
                file.write_page(&guard)?;
                guard.mark_dirty(None);
                log::trace!("flushed page {}", pid);
            }
        }
        Ok(())
    }

    /// Evicts the first clean page found. A clean page needs no flush, so
    /// eviction never performs I/O; if every cached page is dirty the
    /// cache is full of uncommitted work and the triggering call fails.
    fn evict(pages: &mut HashMap<PageId, SharedPage>) -> StorageResult<()> {
        let victim = pages
            .iter()
            .find(|(_, page)| !page.read().is_dirty())
            .map(|(pid, _)| *pid);
        match victim {
            Some(pid) => {
                pages.remove(&pid);
                log::trace!("evicted clean page {}", pid);
                Ok(())
            }
            None => Err(StorageError::BufferPoolFull),
        }
    }
}
