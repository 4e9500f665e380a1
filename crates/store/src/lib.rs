//! JSON file-backed collection store.
//! - One file holds one homogeneous list of records (or nothing at all).
//! - Every operation reads and/or rewrites the whole file.
//! - Errors are split into construction, read and write failures.

pub mod errors;
pub mod logger;
pub mod collection;
pub mod collection_store;
pub mod selector;

pub use collection::{DbJsonOptions, JsonCollection};
pub use collection_store::CollectionStore;
pub use errors::{ConstructionError, ReadError, StoreError, WriteError};
pub use logger::{MemoryLogger, NoopLogger, StoreLogger, TracingLogger};
pub use selector::Selector;
