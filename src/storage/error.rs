//! Storage layer error types.

use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("transaction {0} aborted: lock wait budget exhausted")]
    TransactionAborted(TransactionId),

    #[error("buffer pool is full: every cached page is dirty")]
    BufferPoolFull,

    #[error("page not found: {0}")]
    PageNotFound(PageId),

    #[error("page is full: no free slot")]
    PageFull,

    #[error("invalid slot id {slot} (page has {num_slots} slots)")]
    InvalidSlot { slot: u16, num_slots: u16 },

    #[error("tuple not found: slot {slot} is empty")]
    TupleNotFound { slot: u16 },

    #[error("no such element: scan exhausted or not open")]
    NoSuchElement,

    #[error("table not found: {0}")]
    TableNotFound(u32),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
