/// Refresh cycle driver.
///
/// One cycle is fetch → parse → store → evaluate → publish, run strictly in
/// sequence on the poller's own thread. The next cycle is scheduled only
/// after the previous one has finished, so fetches never overlap and the
/// alarm state has a single writer.
///
/// A failed fetch leaves both the stored forecast and the alarm state as
/// they were; the next scheduled cycle is the retry.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::alert::{AlarmSignal, AlarmState, RainAlarm};
use crate::ingest::{nowcast, NowcastSource};
use crate::logging::{self, Component};
use crate::model::GridSlot;
use crate::publish::AlarmPublisher;
use crate::store::ForecastStore;

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The signal was computed and delivered.
    Published(AlarmSignal),
    /// The signal was computed but delivery failed.
    PublishFailed(AlarmSignal),
    /// Nothing changed: the page could not be fetched.
    FetchFailed,
}

pub struct Poller {
    source: Box<dyn NowcastSource + Send>,
    publisher: Box<dyn AlarmPublisher + Send>,
    store: Arc<ForecastStore>,
    alarm: RainAlarm,
    location_path: String,
    topic: String,
    interval: Duration,
}

impl Poller {
    pub fn new(
        source: Box<dyn NowcastSource + Send>,
        publisher: Box<dyn AlarmPublisher + Send>,
        store: Arc<ForecastStore>,
        location_path: &str,
        topic: &str,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            publisher,
            store,
            alarm: RainAlarm::new(),
            location_path: location_path.to_string(),
            topic: topic.to_string(),
            interval,
        }
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    /// Runs one cycle using the local wall clock.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.run_cycle_at(GridSlot::now_local())
    }

    /// Runs one cycle as if the current time were `now`.
    pub fn run_cycle_at(&mut self, now: GridSlot) -> CycleOutcome {
        let origin = self.source.describe(&self.location_path);

        let page = match self.source.fetch(&self.location_path) {
            Ok(page) => page,
            Err(e) => {
                logging::log_fetch_failure(&origin, "fetch nowcast page", &e.to_string());
                return CycleOutcome::FetchFailed;
            }
        };
        if !page.is_success() {
            logging::log_fetch_failure(
                &origin,
                "fetch nowcast page",
                &format!("HTTP status {}", page.status),
            );
            return CycleOutcome::FetchFailed;
        }

        let (forecast, report) = nowcast::parse_with_report(&page.body);
        if report.cells_skipped > 0 || report.missing_colors > 0 || !report.unknown_colors.is_empty() {
            logging::warn(
                Component::Parser,
                Some(origin.as_str()),
                &format!(
                    "{} of {} cells skipped, {} without color, {} unknown colors",
                    report.cells_skipped,
                    report.cells_seen,
                    report.missing_colors,
                    report.unknown_colors.len()
                ),
            );
        }
        if forecast.is_empty() {
            logging::warn(Component::Parser, Some(origin.as_str()), "page contained no nowcast cells");
        }

        self.store.replace(forecast);
        let signal = self.alarm.evaluate(&self.store.snapshot(), now);

        match self.publisher.publish(&self.topic, signal) {
            Ok(()) => CycleOutcome::Published(signal),
            Err(e) => {
                logging::warn(
                    Component::Mqtt,
                    Some(self.topic.as_str()),
                    &format!("could not publish '{}': {}", signal, e),
                );
                CycleOutcome::PublishFailed(signal)
            }
        }
    }

    /// Runs cycles until a message arrives on `shutdown` or its sender is
    /// dropped. The interval is measured from the end of one cycle to the
    /// start of the next.
    pub fn run(&mut self, shutdown: &Receiver<()>) {
        logging::info(
            Component::System,
            Some(self.location_path.as_str()),
            &format!("poller started, interval {}s", self.interval.as_secs()),
        );

        loop {
            self.run_cycle();

            match shutdown.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        logging::info(Component::System, Some(self.location_path.as_str()), "poller stopped");
    }
}
