/// Latest-forecast store shared between the poller and the query server.
///
/// The poller is the only writer. Each cycle's forecast is wrapped in an
/// `Arc` and swapped in under a short write lock; readers clone the `Arc` and
/// work on that snapshot, so a query always sees one whole forecast.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::logging::{self, Component};
use crate::model::{Forecast, GridSlot, RainIntensity};

/// Slots returned by `query` when the caller does not say (20 minutes).
pub const DEFAULT_QUERY_COUNT: usize = 4;

/// One slot of a query result. `intensity` is `None` when the current
/// forecast has no value for the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotReading {
    pub slot: GridSlot,
    pub intensity: Option<RainIntensity>,
}

#[derive(Debug, Default)]
pub struct ForecastStore {
    current: RwLock<Arc<Forecast>>,
    generation: AtomicU64,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new forecast, replacing the previous one entirely.
    pub fn replace(&self, forecast: Forecast) {
        let entries = forecast.len();
        let next = Arc::new(forecast);
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = next;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        logging::debug(
            Component::Store,
            None,
            &format!("forecast generation {} stored ({} slots)", generation, entries),
        );
    }

    /// The forecast currently on record.
    pub fn snapshot(&self) -> Arc<Forecast> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Number of forecasts stored since startup.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// `count` consecutive slots starting at `now`, each with the intensity on
    /// record or `None`.
    pub fn query(&self, now: GridSlot, count: usize) -> Vec<SlotReading> {
        let forecast = self.snapshot();
        now.following(count)
            .map(|slot| {
                let intensity = forecast.get(slot);
                if intensity.is_none() {
                    logging::debug(Component::Store, None, &format!("no rain value for {}", slot));
                }
                SlotReading { slot, intensity }
            })
            .collect()
    }
}
