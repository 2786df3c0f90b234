//! Collection persistence for the roster broker.
//!
//! Provides:
//! - `CollectionService` - Fail-soft read-modify-write over a `RecordStore`
//! - Storage implementations (memory, JSON files)

pub mod service;
pub mod storage;

pub use service::CollectionService;
