/// wetter.com page client
///
/// Retrieves the location page that embeds the 2-hour precipitation nowcast.
/// The page is HTML meant for browsers; only the nowcast table is used
/// (see `ingest::nowcast`).
///
/// Location paths look like
/// `/deutschland/niederkruechten/kapelle/DE3205889.html#niederschlag`.

use std::time::Duration;

use crate::ingest::{FetchedPage, NowcastSource};
use crate::model::FetchError;

pub const WETTER_BASE_URL: &str = "https://www.wetter.com";

const USER_AGENT: &str = concat!("rainalarm_service/", env!("CARGO_PKG_VERSION"));

/// Builds the full page URL for a location path.
///
/// The fragment (`#niederschlag`) is dropped since it never reaches the
/// server anyway.
pub fn build_location_url(base_url: &str, location_path: &str) -> String {
    let path = location_path.split('#').next().unwrap_or_default();
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Blocking HTTP source for the live page.
pub struct WetterClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl WetterClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl NowcastSource for WetterClient {
    fn fetch(&self, location_path: &str) -> Result<FetchedPage, FetchError> {
        let url = build_location_url(&self.base_url, location_path);

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/html")
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(map_reqwest_error)?;

        Ok(FetchedPage { status, body })
    }

    fn describe(&self, location_path: &str) -> String {
        build_location_url(&self.base_url, location_path)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let url = build_location_url(WETTER_BASE_URL, "/deutschland/koeln/DE0005742.html");
        assert_eq!(url, "https://www.wetter.com/deutschland/koeln/DE0005742.html");
    }

    #[test]
    fn test_url_drops_fragment() {
        let url = build_location_url(
            WETTER_BASE_URL,
            "/deutschland/niederkruechten/kapelle/DE3205889.html#niederschlag",
        );
        assert_eq!(
            url,
            "https://www.wetter.com/deutschland/niederkruechten/kapelle/DE3205889.html"
        );
    }

    #[test]
    fn test_url_handles_trailing_and_missing_slashes() {
        assert_eq!(
            build_location_url("http://localhost:8080/", "a/b.html"),
            "http://localhost:8080/a/b.html"
        );
    }

    #[test]
    #[ignore] // Don't run in CI - depends on external site
    fn wetter_live_page_contains_nowcast_cells() {
        let client = WetterClient::new(WETTER_BASE_URL, Duration::from_secs(30))
            .expect("client should build");
        let page = client
            .fetch("/deutschland/niederkruechten/kapelle/DE3205889.html#niederschlag")
            .expect("live fetch should succeed");

        assert_eq!(page.status, 200);
        let forecast = crate::ingest::nowcast::parse(&page.body);
        assert!(!forecast.is_empty(), "live page should contain nowcast cells");
    }
}
