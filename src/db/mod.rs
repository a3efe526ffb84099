//! Database layer (Firestore, with an in-process fallback).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const COLLECTORS: &str = "collectors";
    pub const REPORTS: &str = "reports";
    /// Keyed by `{ward}_{date}`
    pub const WARD_TASKS: &str = "ward_tasks";
    pub const RESIDENTS: &str = "residents";
}
