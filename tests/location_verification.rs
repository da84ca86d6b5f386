//! Location Verification Integration Tests
//!
//! These tests check the real wetter.com page for the default location.
//! They are marked #[ignore] so normal runs don't depend on the site being
//! reachable or its markup being unchanged.
//!
//! Run with: cargo test --test location_verification -- --ignored

use std::time::Duration;

use rainalarm_service::config::ServiceConfig;
use rainalarm_service::ingest::wetter::WetterClient;
use rainalarm_service::verify::*;

#[test]
#[ignore] // Don't run in CI - depends on external site
fn test_default_location_verification() {
    let config = ServiceConfig::default();
    let client = WetterClient::new(&config.location.base_url, Duration::from_secs(30))
        .expect("Failed to create HTTP client");

    println!("\n🔍 Testing nowcast location:");
    let result = verify_location(&client, &config.location.uri);
    print_summary(&result);

    assert_ne!(
        result.status,
        VerificationStatus::Failed,
        "default location returned no nowcast: {:?}",
        result.error_message
    );
    assert!(
        result.unknown_colors.is_empty(),
        "page uses colors missing from the lookup table: {:?}",
        result.unknown_colors
    );
}

#[test]
#[ignore] // Don't run in CI - depends on external site
fn test_unknown_location_fails_verification() {
    let config = ServiceConfig::default();
    let client = WetterClient::new(&config.location.base_url, Duration::from_secs(30))
        .expect("Failed to create HTTP client");

    let result = verify_location(&client, "/deutschland/nirgendwo/DE0000000000.html");
    assert_eq!(result.status, VerificationStatus::Failed);
}
