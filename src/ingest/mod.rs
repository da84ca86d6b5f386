/// Nowcast data acquisition.
///
/// Submodules:
/// - `nowcast` — turns a raw page into a `Forecast`.
/// - `wetter`  — fetches the live page over HTTP.
/// - `replay`  — serves a saved page from disk for development.

pub mod nowcast;
pub mod replay;
pub mod wetter;

use crate::model::FetchError;

/// A page as returned by the upstream source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Anything that can produce the nowcast page for a location path.
pub trait NowcastSource {
    fn fetch(&self, location_path: &str) -> Result<FetchedPage, FetchError>;

    /// Human-readable origin of `location_path`, used in logs and reports.
    fn describe(&self, location_path: &str) -> String {
        location_path.to_string()
    }
}
