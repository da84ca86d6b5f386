/// Development mode source for working with saved pages
///
/// When the live page is unavailable (offline work, upstream outage, or a
/// markup change being investigated), use this source to replay a page saved
/// with `curl -o page.html <url>`. Every fetch rereads the file, so editing it
/// while the daemon runs changes the next cycle's forecast.

use std::fs;
use std::path::PathBuf;

use crate::ingest::{FetchedPage, NowcastSource};
use crate::model::FetchError;

pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NowcastSource for ReplaySource {
    fn fetch(&self, _location_path: &str) -> Result<FetchedPage, FetchError> {
        let body = fs::read_to_string(&self.path)
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;
        Ok(FetchedPage { status: 200, body })
    }

    fn describe(&self, _location_path: &str) -> String {
        format!("replay:{}", self.path.display())
    }
}
