//! Query operators, Volcano-style.
//!
//! Operators are thin consumers of the storage core: they pull tuples
//! through `open`/`next` and route every page access and mutation through
//! the page cache, never touching disk directly. A `TransactionAborted`
//! error surfacing from any operator means the whole transaction must be
//! rolled back by whoever owns `transaction_complete`.

pub mod aggregate;
pub mod delete;
pub mod seq_scan;

use crate::access::schema::TupleDesc;
use crate::access::tuple::Tuple;
use crate::storage::error::StorageResult;

pub use aggregate::{AggregateExecutor, AggregateOp};
pub use delete::DeleteExecutor;
pub use seq_scan::SeqScanExecutor;

/// A pull-based operator producing a stream of tuples.
pub trait Executor {
    /// Prepares the operator. Must be called before `next`.
    fn open(&mut self) -> StorageResult<()>;

    /// The next output tuple, or `None` when the stream is exhausted.
    fn next(&mut self) -> StorageResult<Option<Tuple>>;

    /// Resets the stream back to its beginning.
    fn rewind(&mut self) -> StorageResult<()>;

    /// Releases operator state. The transaction's locks stay held.
    fn close(&mut self);

    /// Schema of the tuples this operator produces.
    fn schema(&self) -> &TupleDesc;
}
