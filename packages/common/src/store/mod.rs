mod error;
mod traits;

pub mod memory;

pub use error::{StoreError, StoreResult};
pub use traits::{
    DetailStore, KeyCount, MonthCount, ReferenceStore, StatusCount, StudentVerifiedCount,
    TransitionOutcome,
};
