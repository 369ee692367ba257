//! Storage layer: pages, the heap page format, and the transactional
//! page cache.
//!
//! - **Page**: fixed-size block of bytes, the unit of disk I/O and caching,
//!   tagged with a dirty/owning-transaction marker
//! - **HeapPage**: slot-bitmap page format for fixed-width tuples
//! - **PageCache**: bounded in-memory page store; the single choke point
//!   every page access, insert, delete, and transaction-completion event
//!   flows through. Owns eviction and lock-manager integration.
//!
//! There is no write-ahead log: abort is discard-based (NO-STEAL), so a
//! dirty page of an uncommitted transaction never reaches disk.

pub mod buffer;
pub mod error;
pub mod heap_page;
pub mod page;

pub use buffer::{PageCache, DEFAULT_CACHE_PAGES};
pub use error::{StorageError, StorageResult};
pub use heap_page::HeapPage;
pub use page::{Page, PageId, SharedPage, DEFAULT_PAGE_SIZE};
