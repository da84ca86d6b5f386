//! Location Verification Module
//!
//! Checks the configured location against the live page (or a replay file)
//! to tell whether the nowcast table is reachable and still parseable.
//!
//! Run with `rainalarm_service <config> --verify` after changing the
//! location URI or when the alarm seems stuck.

use chrono::Local;
use serde::Serialize;

use crate::ingest::{nowcast, NowcastSource};
use crate::model::SLOT_MINUTES;

/// A healthy page covers at least the alarm's one-hour lookahead.
pub const EXPECTED_MIN_CELLS: usize = 12;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationVerification {
    pub timestamp: String,
    pub location: String,
    pub status: VerificationStatus,
    pub http_status: Option<u16>,
    pub cells_seen: usize,
    pub cells_parsed: usize,
    pub unknown_colors: Vec<String>,
    pub first_slot: Option<String>,
    pub last_slot: Option<String>,
    pub error_message: Option<String>,
}

// ============================================================================
// Verification
// ============================================================================

pub fn verify_location(source: &dyn NowcastSource, location_path: &str) -> LocationVerification {
    let mut result = LocationVerification {
        timestamp: Local::now().to_rfc3339(),
        location: source.describe(location_path),
        status: VerificationStatus::Failed,
        http_status: None,
        cells_seen: 0,
        cells_parsed: 0,
        unknown_colors: Vec::new(),
        first_slot: None,
        last_slot: None,
        error_message: None,
    };

    let page = match source.fetch(location_path) {
        Ok(page) => page,
        Err(e) => {
            result.error_message = Some(format!("Request failed: {}", e));
            return result;
        }
    };

    result.http_status = Some(page.status);
    if !page.is_success() {
        result.error_message = Some(format!("HTTP {}", page.status));
        return result;
    }

    let (forecast, report) = nowcast::parse_with_report(&page.body);
    result.cells_seen = report.cells_seen;
    result.cells_parsed = report.cells_parsed();
    result.unknown_colors = report.unknown_colors;
    result.first_slot = forecast.entries().first().map(|e| e.slot.to_string());
    result.last_slot = forecast.entries().last().map(|e| e.slot.to_string());

    // Determine status
    if forecast.len() >= EXPECTED_MIN_CELLS {
        result.status = VerificationStatus::Success;
    } else if !forecast.is_empty() {
        result.status = VerificationStatus::PartialSuccess;
    } else {
        result.error_message = Some("No nowcast cells found in page".to_string());
    }

    result
}

pub fn print_summary(result: &LocationVerification) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 LOCATION VERIFICATION");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Location:        {}", result.location);
    println!("Checked at:      {}", result.timestamp);
    println!("Status:          {:?}", result.status);
    if let Some(code) = result.http_status {
        println!("HTTP status:     {}", code);
    }
    println!("Cells:           {}/{} parsed", result.cells_parsed, result.cells_seen);
    if let (Some(first), Some(last)) = (&result.first_slot, &result.last_slot) {
        println!("Coverage:        {} – {} ({} min steps)", first, last, SLOT_MINUTES);
    }
    if !result.unknown_colors.is_empty() {
        println!("Unknown colors:  {}", result.unknown_colors.join(", "));
    }
    if let Some(err) = &result.error_message {
        println!("Error:           {}", err);
    }
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FetchedPage;
    use crate::model::FetchError;

    struct FixedSource(Result<FetchedPage, FetchError>);

    impl NowcastSource for FixedSource {
        fn fetch(&self, _location_path: &str) -> Result<FetchedPage, FetchError> {
            self.0.clone()
        }
    }

    fn page_with_cells(count: usize, color: &str) -> String {
        (0..count)
            .map(|i| {
                format!(
                    r#"<div class="nowcast-table-item"><span>{:02}:{:02}</span><i style="color:#{};"></i></div>"#,
                    10 + i / 12,
                    (i % 12) * 5,
                    color
                )
            })
            .collect()
    }

    fn ok_page(body: String) -> FixedSource {
        FixedSource(Ok(FetchedPage { status: 200, body }))
    }

    #[test]
    fn test_full_table_is_success() {
        let result = verify_location(&ok_page(page_with_cells(24, "fff")), "/loc");
        assert_eq!(result.status, VerificationStatus::Success);
        assert_eq!(result.cells_parsed, 24);
        assert_eq!(result.first_slot.as_deref(), Some("10:00"));
        assert_eq!(result.last_slot.as_deref(), Some("11:55"));
    }

    #[test]
    fn test_short_table_is_partial() {
        let result = verify_location(&ok_page(page_with_cells(3, "6699ff")), "/loc");
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
    }

    #[test]
    fn test_unknown_colors_are_listed() {
        let result = verify_location(&ok_page(page_with_cells(12, "123abc")), "/loc");
        assert_eq!(result.status, VerificationStatus::Success);
        assert_eq!(result.unknown_colors.len(), 12);
    }

    #[test]
    fn test_page_without_table_fails() {
        let result = verify_location(&ok_page("<html></html>".to_string()), "/loc");
        assert_eq!(result.status, VerificationStatus::Failed);
        assert!(result.error_message.is_some());
    }

    #[test]
    fn test_http_error_fails_with_status() {
        let source = FixedSource(Ok(FetchedPage {
            status: 404,
            body: String::new(),
        }));
        let result = verify_location(&source, "/loc");
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.http_status, Some(404));
        assert_eq!(result.error_message.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn test_fetch_error_fails() {
        let result = verify_location(&FixedSource(Err(FetchError::Timeout)), "/loc");
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.http_status, None);
    }
}
