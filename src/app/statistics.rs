//! Shutdown statistics.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};

/// Logs job outcome totals and every non-zero error counter.
///
/// # Arguments
///
/// * `stats` - The counters shared by the workers
/// * `elapsed_seconds` - Service uptime
pub fn log_final_statistics(stats: &ProcessingStats, elapsed_seconds: f64) {
    let (done, errored, cancelled) = stats.job_counts();
    info!(
        "Processed {} jobs in {:.1}s: {} done, {} errored, {} cancelled",
        done + errored + cancelled,
        elapsed_seconds,
        done,
        errored,
        cancelled
    );

    let total_errors = stats.total_errors();
    if total_errors == 0 {
        return;
    }
    info!("Error counts ({total_errors} total):");
    for error_type in ErrorType::iter() {
        let count = stats.get_error_count(error_type);
        if count > 0 {
            info!("   {error_type}: {count}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_final_statistics_handles_empty_and_populated_stats() {
        let stats = ProcessingStats::new();
        log_final_statistics(&stats, 0.0);

        stats.record_done();
        stats.record_cancelled();
        stats.increment_error(ErrorType::HttpRequestTimeoutError);
        log_final_statistics(&stats, 12.5);
        assert_eq!(stats.job_counts(), (1, 0, 1));
    }
}
