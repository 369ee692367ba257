use crate::catalog::TableId;
use crate::transaction::TransactionId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Default page size in bytes. The actual size is configurable per
/// instance through the catalog but fixed for the instance's lifetime.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Identifies one page uniquely within the whole engine.
///
/// Page numbers are dense and contiguous per table, starting at 0: a file
/// with K pages has page numbers 0..K-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        Self { table_id, page_no }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

/// An in-memory image of one fixed-size disk block.
///
/// A page is owned by the page cache while cached; callers obtain it as a
/// [`SharedPage`] and mutate it in place under the lock discipline. The
/// dirty marker records the transaction that last mutated the page and is
/// cleared only on flush.
#[derive(Debug)]
pub struct Page {
    id: PageId,
    data: Vec<u8>,
    dirty: Option<TransactionId>,
}

impl Page {
    /// Creates a zeroed page of `page_size` bytes.
    pub fn new(id: PageId, page_size: usize) -> Self {
        Self {
            id,
            data: vec![0u8; page_size],
            dirty: None,
        }
    }

    /// Wraps bytes read from disk. `data.len()` is the page size.
    pub fn from_bytes(id: PageId, data: Vec<u8>) -> Self {
        Self {
            id,
            data,
            dirty: None,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The transaction that dirtied this page, if any.
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Marks the page dirty on behalf of `tid`, or clean when `None`.
    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }
}

/// A cached page, shared between the cache and its current lock holders.
pub type SharedPage = Arc<RwLock<Page>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_equality() {
        let a = PageId::new(TableId(1), 2);
        let b = PageId::new(TableId(1), 2);
        let c = PageId::new(TableId(1), 3);
        let d = PageId::new(TableId(2), 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_dirty_marker() {
        let mut page = Page::new(PageId::new(TableId(0), 0), 128);
        assert!(!page.is_dirty());

        page.mark_dirty(Some(TransactionId::new(7)));
        assert_eq!(page.dirtier(), Some(TransactionId::new(7)));

        page.mark_dirty(None);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_page_data_zeroed() {
        let page = Page::new(PageId::new(TableId(0), 0), 256);
        assert_eq!(page.data().len(), 256);
        assert!(page.data().iter().all(|&b| b == 0));
    }
}
