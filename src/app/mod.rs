//! Application glue: submission validation, shutdown handling and final
//! statistics.

pub mod shutdown;
pub mod statistics;
pub mod url;

pub use shutdown::{shutdown_gracefully, shutdown_signal};
pub use url::validate_submitted_url;
