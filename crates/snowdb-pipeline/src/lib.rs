//! Batch collection: the collection manager, per-resort failure tracking,
//! the configuration merge layer, and the ports the pipeline writes through.

pub mod error;
pub mod failure;
pub mod manager;
pub mod merge;
pub mod notify;
pub mod outcome;
pub mod store;

pub use error::PipelineError;
pub use failure::{Escalation, FailureRecord, FailureTracker, HealthState, Transition};
pub use manager::{BatchOptions, BatchRequest, CollectionManager};
pub use merge::{ConfigMergeLayer, MergedResort};
pub use notify::{AlertEvent, LogNotifier, Notifier};
pub use outcome::{
    BatchOutcome, FailureCategory, LogReporter, OutcomeReporter, PersistenceFailure,
    ResortFailure,
};
pub use store::{
    FailureStore, MemoryFailureStore, MemoryRecordStore, RecordStore, StoreError,
};
