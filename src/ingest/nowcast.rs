/// Nowcast table parser
///
/// Extracts the 5-minute rain forecast from the wetter.com location page.
/// The page renders the nowcast as a row of cells, each carrying the
/// `nowcast-table-item` class, a `<span>HH:MM</span>` time label and an
/// inline style whose `#rrggbb;` color encodes the rain intensity.
///
/// The page markup is not under our control, so the scanner never trusts
/// it: each cell is bounded by the next marker, every extraction step is
/// allowed to fail on its own, and the cursor always moves past the current
/// marker before searching again.

use crate::logging::{self, Component};
use crate::model::{Forecast, GridSlot, RainIntensity};

/// Class name that opens one forecast cell.
pub const CELL_MARKER: &str = "nowcast-table-item";

const TIME_OPEN: &str = "<span>";
const TIME_CLOSE: &str = "</span>";
const COLOR_OPEN: char = '#';
const COLOR_CLOSE: char = ';';

// ---------------------------------------------------------------------------
// Parse report
// ---------------------------------------------------------------------------

/// What happened while scanning one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Marker occurrences found.
    pub cells_seen: usize,
    /// Cells dropped because the time label was missing or unusable.
    pub cells_skipped: usize,
    /// Cells kept as very light rain because they carried no color token.
    pub missing_colors: usize,
    /// Color tokens missing from the lookup table, in scan order.
    pub unknown_colors: Vec<String>,
}

impl ParseReport {
    pub fn cells_parsed(&self) -> usize {
        self.cells_seen - self.cells_skipped
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Why a single cell was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CellAnomaly {
    MissingTime,
    MalformedTime(String),
}

struct CellScanner<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> CellScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    /// Returns the body of the next cell: everything after the marker up to
    /// the following marker or the end of input.
    fn next_cell(&mut self) -> Option<&'a str> {
        let start = self.cursor + self.text.get(self.cursor..)?.find(CELL_MARKER)? + CELL_MARKER.len();
        let end = self.text[start..]
            .find(CELL_MARKER)
            .map_or(self.text.len(), |offset| start + offset);
        // start lies strictly past the marker just found
        self.cursor = start;
        Some(&self.text[start..end])
    }
}

/// Returns the text between `open` and the next `close`, plus the remainder
/// after `close`.
fn delimited<'a>(text: &'a str, open: &str, close: &str) -> Option<(&'a str, &'a str)> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find(close)?;
    Some((&text[start..start + len], &text[start + len + close.len()..]))
}

fn extract_time(cell: &str) -> Result<(GridSlot, &str), CellAnomaly> {
    let (label, rest) = delimited(cell, TIME_OPEN, TIME_CLOSE).ok_or(CellAnomaly::MissingTime)?;
    let slot = GridSlot::parse(label).ok_or_else(|| CellAnomaly::MalformedTime(label.to_string()))?;
    Ok((slot, rest))
}

fn extract_color(rest: &str) -> Option<&str> {
    let start = rest.find(COLOR_OPEN)? + COLOR_OPEN.len_utf8();
    let len = rest[start..].find(COLOR_CLOSE)?;
    Some(&rest[start..start + len])
}

fn scan_cell(cell: &str, report: &mut ParseReport) -> Result<(GridSlot, RainIntensity), CellAnomaly> {
    let (slot, rest) = extract_time(cell)?;
    let Some(token) = extract_color(rest) else {
        logging::debug(
            Component::Parser,
            None,
            &format!("no color token at {}, assuming very light rain", slot),
        );
        report.missing_colors += 1;
        return Ok((slot, RainIntensity::VeryLight));
    };
    let intensity = match RainIntensity::from_color(token) {
        Some(level) => level,
        None => {
            logging::debug(
                Component::Parser,
                None,
                &format!("unknown color '#{}' at {}, assuming very light rain", token, slot),
            );
            report.unknown_colors.push(token.to_string());
            RainIntensity::from_color_or_default(token)
        }
    };
    Ok((slot, intensity))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parses a raw page into a forecast. Never fails: cells without a usable
/// time are skipped, cells whose color is missing or unknown count as very
/// light rain, and an empty payload gives an empty forecast.
pub fn parse(payload: &str) -> Forecast {
    parse_with_report(payload).0
}

/// Same as [`parse`], also returning counts of what was skipped or defaulted.
pub fn parse_with_report(payload: &str) -> (Forecast, ParseReport) {
    let mut forecast = Forecast::new();
    let mut report = ParseReport::default();
    let mut scanner = CellScanner::new(payload);

    while let Some(cell) = scanner.next_cell() {
        report.cells_seen += 1;
        match scan_cell(cell, &mut report) {
            Ok((slot, intensity)) => forecast.insert(slot, intensity),
            Err(anomaly) => {
                report.cells_skipped += 1;
                let message = match anomaly {
                    CellAnomaly::MissingTime => "cell without time label skipped".to_string(),
                    CellAnomaly::MalformedTime(label) => {
                        format!("cell with malformed time '{}' skipped", label)
                    }
                };
                logging::debug(Component::Parser, None, &message);
            }
        }
    }

    (forecast, report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
