//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, submission and lookup
//! - Categorization of page fetch failures
//! - Processing statistics shared by the job workers

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{
    categorize_reqwest_error, categorize_status, describe_status, describe_transport_error,
};
pub use stats::ProcessingStats;
pub use types::{DatabaseError, ErrorType, InitializationError, LookupError, SubmitError};
