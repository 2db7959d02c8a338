//! Troubleshooting history of each job label, kept as JSON under the project directory.

pub mod store;
pub mod types;

pub use store::{HistoryStore, StoreError};
pub use types::{JobRecord, LabelHistory, RecordStatus, RemedyEntry};
