pub mod access;
pub mod catalog;
pub mod concurrency;
pub mod database;
pub mod executor;
pub mod stats;
pub mod storage;
pub mod transaction;
