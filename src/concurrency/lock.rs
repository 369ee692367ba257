//! Page-level lock management.
//!
//! Reader/writer locks at page granularity, matching the heap-page tuple
//! layout. Acquisition is non-blocking: the caller (the page cache) retries
//! with a bounded budget and converts exhaustion into a transaction abort.
//! There is no waiter queue and no fairness guarantee; any retrying caller
//! may win when a lock frees.

use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Lock modes supported by the lock manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared lock for read access.
    Shared,
    /// Exclusive lock for write access.
    Exclusive,
}

/// Per-page lock state: the set of reader transactions plus an optional
/// single writer. Invariant: `writer.is_some()` implies `readers.is_empty()`.
#[derive(Debug, Default)]
struct PageLockState {
    readers: HashSet<TransactionId>,
    writer: Option<TransactionId>,
}

impl PageLockState {
    fn is_empty(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none()
    }
}

#[derive(Debug, Default)]
struct LockTables {
    /// Per-page state, for grant decisions.
    by_page: HashMap<PageId, PageLockState>,
    /// Per-transaction held locks, for release_all. Kept consistent with
    /// `by_page` on every mutation.
    by_txn: HashMap<TransactionId, HashMap<PageId, LockMode>>,
}

/// Tracks which transaction holds which lock on which page.
pub struct LockManager {
    tables: Mutex<LockTables>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(LockTables::default()),
        }
    }

    /// Attempts to acquire `mode` on `pid` for `tid` without blocking.
    ///
    /// Grants are reentrant: a transaction already holding an exclusive
    /// lock is granted any further request on the same page. A transaction
    /// that is the sole reader of a page upgrades its shared lock to
    /// exclusive in place, replacing the read record, so it never holds
    /// both modes on one page.
    pub fn try_acquire(&self, tid: TransactionId, pid: PageId, mode: LockMode) -> bool {
        let mut guard = self.tables.lock();
        let tables = &mut *guard;
        let state = tables.by_page.entry(pid).or_default();

        match state.writer {
            Some(writer) if writer == tid => return true,
            Some(_) => return false,
            None => {}
        }

        match mode {
            LockMode::Shared => {
                state.readers.insert(tid);
                tables
                    .by_txn
                    .entry(tid)
                    .or_default()
                    .insert(pid, LockMode::Shared);
                true
            }
            LockMode::Exclusive => {
                // Grant only when no other transaction reads the page; a
                // reader set of exactly {tid} is the upgrade case.
                if state.readers.iter().any(|reader| *reader != tid) {
                    return false;
                }
                if !state.readers.is_empty() {
                    log::trace!("{} upgrades shared lock on page {}", tid, pid);
                }
                state.readers.clear();
                state.writer = Some(tid);
                tables
                    .by_txn
                    .entry(tid)
                    .or_default()
                    .insert(pid, LockMode::Exclusive);
                true
            }
        }
    }

    /// Releases `tid`'s lock on `pid`, whatever its mode.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        let mut tables = self.tables.lock();
        Self::remove_record(&mut tables, tid, pid);
    }

    /// Releases every lock held by `tid` and returns the released
    /// (page, mode) pairs so the caller can act on them.
    pub fn release_all(&self, tid: TransactionId) -> Vec<(PageId, LockMode)> {
        let mut tables = self.tables.lock();
        let held: Vec<(PageId, LockMode)> = tables
            .by_txn
            .remove(&tid)
            .map(|pages| pages.into_iter().collect())
            .unwrap_or_default();

        for (pid, _) in &held {
            if let Some(state) = tables.by_page.get_mut(pid) {
                state.readers.remove(&tid);
                if state.writer == Some(tid) {
                    state.writer = None;
                }
                if state.is_empty() {
                    tables.by_page.remove(pid);
                }
            }
        }
        held
    }

    /// The mode `tid` currently holds on `pid`, if any.
    pub fn holding(&self, tid: TransactionId, pid: PageId) -> Option<LockMode> {
        let tables = self.tables.lock();
        tables
            .by_txn
            .get(&tid)
            .and_then(|pages| pages.get(&pid))
            .copied()
    }

    /// True when `tid` holds any lock on `pid`.
    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.holding(tid, pid).is_some()
    }

    fn remove_record(tables: &mut LockTables, tid: TransactionId, pid: PageId) {
        if let Some(pages) = tables.by_txn.get_mut(&tid) {
            pages.remove(&pid);
            if pages.is_empty() {
                tables.by_txn.remove(&tid);
            }
        }
        if let Some(state) = tables.by_page.get_mut(&pid) {
            state.readers.remove(&tid);
            if state.writer == Some(tid) {
                state.writer = None;
            }
            if state.is_empty() {
                tables.by_page.remove(&pid);
            }
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
