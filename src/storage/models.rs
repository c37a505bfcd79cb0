//! Analysis record data structures.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle state of an analysis job.
///
/// `queued -> running -> {done | errored | cancelled}`; `cancelled` is also
/// reachable straight from `queued`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnalysisStatus {
    Queued,
    Running,
    Done,
    Errored,
    Cancelled,
}

impl AnalysisStatus {
    /// Terminal states accept no further pipeline transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AnalysisStatus::Done | AnalysisStatus::Errored | AnalysisStatus::Cancelled
        )
    }
}

/// A discovered link whose reachability probe failed.
///
/// `status_code` is 0 when the connection itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub url: String,
    pub status_code: u16,
    pub error: String,
}

/// Metrics extracted from a crawled page.
///
/// Only meaningful once the owning record reaches `done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub html_version: String,
    pub page_title: String,
    pub h1_count: i64,
    pub h2_count: i64,
    pub h3_count: i64,
    pub h4_count: i64,
    pub h5_count: i64,
    pub h6_count: i64,
    pub internal_link_count: i64,
    pub external_link_count: i64,
    pub inaccessible_link_count: i64,
    pub broken_links: Vec<BrokenLink>,
    pub has_login_form: bool,
    /// Description of the fetch failure behind an `errored` outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PageMetrics {
    /// Heading counts for levels 1 to 6.
    pub fn heading_counts(&self) -> [i64; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }

    pub fn set_heading_counts(&mut self, counts: [i64; 6]) {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ] = counts;
    }
}

/// One analysed URL. The URL is the natural unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: i64,
    pub url: String,
    pub status: AnalysisStatus,
    #[serde(flatten)]
    pub metrics: PageMetrics,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}
