//! Access layer for tuple-oriented operations.
//!
//! - **Value / DataType**: typed field values and their fixed-width
//!   on-disk encoding
//! - **TupleDesc**: the schema of a table, an ordered list of typed fields
//! - **Tuple / RecordId**: a row and its on-disk placement
//! - **HeapFile**: unordered page-at-a-time tuple storage over one table
//!   file, driven through the page cache

pub mod heap;
pub mod schema;
pub mod tuple;
pub mod value;

pub use heap::{HeapFile, HeapFileScan};
pub use schema::TupleDesc;
pub use tuple::{RecordId, Tuple};
pub use value::{DataType, Value, STRING_LEN};
