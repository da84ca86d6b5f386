//! Rain alarm hysteresis.
//!
//! Turns each freshly parsed forecast into an `on`/`off` signal. The alarm
//! goes on 15 minutes before rain is expected and stays on for at least 15
//! cycles after the forecast clears, so a short gap in a shower does not
//! toggle it. New rain during the cooldown re-arms it.
//!
//! # Clock injection
//! `evaluate` takes the current grid slot as a parameter rather than reading
//! the wall clock, which keeps every transition deterministic in tests.

use std::fmt;

use crate::logging::{self, Component};
use crate::model::{Forecast, GridSlot};

/// Number of 5-minute samples looked at, i.e. one hour ahead.
pub const LOOKAHEAD_SAMPLES: usize = 12;

/// Rain closer than this many samples (15 minutes) switches the alarm on.
pub const TRIGGER_HORIZON: usize = 3;

/// Rain must be further away than this many samples before the alarm may
/// leave `Raining` or `Cooldown`.
pub const CLEAR_HORIZON: usize = 10;

/// Cycles to wait in `Cooldown` before the alarm may switch off.
pub const COOLDOWN_CYCLES: u32 = 15;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmPhase {
    Idle,
    Raining,
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    pub phase: AlarmPhase,
    pub cooldown_remaining: u32,
}

impl Default for AlarmState {
    fn default() -> Self {
        Self {
            phase: AlarmPhase::Idle,
            cooldown_remaining: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSignal {
    On,
    Off,
}

impl AlarmSignal {
    /// MQTT payload for this signal.
    pub fn as_payload(self) -> &'static str {
        match self {
            AlarmSignal::On => "on",
            AlarmSignal::Off => "off",
        }
    }
}

impl fmt::Display for AlarmSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}

// ---------------------------------------------------------------------------
// Lookahead
// ---------------------------------------------------------------------------

/// Index of the first of the next 12 samples (starting at `now`) that
/// carries rain, or `LOOKAHEAD_SAMPLES` if none does.
///
/// Slots absent from the forecast count as dry.
pub fn horizon_to_rain(forecast: &Forecast, now: GridSlot) -> usize {
    for (offset, slot) in now.following(LOOKAHEAD_SAMPLES).enumerate() {
        match forecast.get(slot) {
            Some(intensity) => {
                logging::debug(
                    Component::Alarm,
                    None,
                    &format!("at {} rain level: {}", slot, intensity),
                );
                if intensity.is_rain() {
                    return offset;
                }
            }
            None => logging::debug(Component::Alarm, None, &format!("no rain value for {}", slot)),
        }
    }
    LOOKAHEAD_SAMPLES
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Owns the alarm state carried from one refresh cycle to the next.
#[derive(Debug, Default)]
pub struct RainAlarm {
    state: AlarmState,
}

impl RainAlarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a given state instead of `Idle`.
    pub fn with_state(state: AlarmState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Runs one refresh cycle against a new forecast.
    pub fn evaluate(&mut self, forecast: &Forecast, now: GridSlot) -> AlarmSignal {
        let horizon = horizon_to_rain(forecast, now);
        logging::debug(Component::Alarm, None, &format!("next rain in {} samples", horizon));

        let signal = self.step(horizon);
        logging::info(
            Component::Alarm,
            None,
            &format!("alarm {} ({:?}, cooldown {})", signal, self.state.phase, self.state.cooldown_remaining),
        );
        signal
    }

    /// Applies the transition rules for a precomputed horizon.
    pub fn step(&mut self, horizon: usize) -> AlarmSignal {
        if horizon < TRIGGER_HORIZON {
            self.state = AlarmState {
                phase: AlarmPhase::Raining,
                cooldown_remaining: COOLDOWN_CYCLES,
            };
            return AlarmSignal::On;
        }

        match self.state.phase {
            AlarmPhase::Raining => {
                if horizon > CLEAR_HORIZON {
                    self.state.phase = AlarmPhase::Cooldown;
                }
                AlarmSignal::On
            }
            AlarmPhase::Cooldown => {
                if self.state.cooldown_remaining > 0 {
                    self.state.cooldown_remaining -= 1;
                    AlarmSignal::On
                } else if horizon > CLEAR_HORIZON {
                    self.state.phase = AlarmPhase::Idle;
                    AlarmSignal::Off
                } else {
                    AlarmSignal::On
                }
            }
            AlarmPhase::Idle => AlarmSignal::Off,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RainIntensity;
    use proptest::prelude::*;

    fn noon() -> GridSlot {
        GridSlot::parse("12:00").unwrap()
    }

    /// A dry forecast covering the full lookahead from `now`, with rain at
    /// the given sample offsets.
    fn forecast_with_rain_at(now: GridSlot, offsets: &[usize], level: RainIntensity) -> Forecast {
        now.following(LOOKAHEAD_SAMPLES)
            .enumerate()
            .map(|(i, slot)| {
                let intensity = if offsets.contains(&i) { level } else { RainIntensity::None };
                (slot, intensity)
            })
            .collect()
    }

    fn state(phase: AlarmPhase, cooldown_remaining: u32) -> AlarmState {
        AlarmState { phase, cooldown_remaining }
    }

    // --- Lookahead ------------------------------------------------------------

    #[test]
    fn test_horizon_is_12_when_dry() {
        let forecast = forecast_with_rain_at(noon(), &[], RainIntensity::None);
        assert_eq!(horizon_to_rain(&forecast, noon()), LOOKAHEAD_SAMPLES);
    }

    #[test]
    fn test_horizon_finds_first_rainy_sample() {
        let forecast = forecast_with_rain_at(noon(), &[4, 7], RainIntensity::Light);
        assert_eq!(horizon_to_rain(&forecast, noon()), 4);
    }

    #[test]
    fn test_horizon_ignores_rain_beyond_one_hour() {
        let forecast: Forecast = [(noon().advance(12), RainIntensity::Extreme)].into_iter().collect();
        assert_eq!(horizon_to_rain(&forecast, noon()), LOOKAHEAD_SAMPLES);
    }

    #[test]
    fn test_missing_slots_count_as_dry() {
        assert_eq!(horizon_to_rain(&Forecast::new(), noon()), LOOKAHEAD_SAMPLES);
    }

    #[test]
    fn test_horizon_wraps_past_midnight() {
        let late = GridSlot::parse("23:50").unwrap();
        let forecast: Forecast = [(GridSlot::parse("00:05").unwrap(), RainIntensity::Moderate)]
            .into_iter()
            .collect();
        assert_eq!(horizon_to_rain(&forecast, late), 3);
    }

    // --- Scenarios ------------------------------------------------------------

    #[test]
    fn test_all_dry_stays_idle_and_off() {
        let mut alarm = RainAlarm::new();
        let forecast = forecast_with_rain_at(noon(), &[], RainIntensity::None);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::Off);
        assert_eq!(alarm.state(), state(AlarmPhase::Idle, 0));
    }

    #[test]
    fn test_rain_in_five_minutes_switches_on() {
        let mut alarm = RainAlarm::new();
        let forecast = forecast_with_rain_at(noon(), &[1], RainIntensity::Moderate);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::On);
        assert_eq!(alarm.state(), state(AlarmPhase::Raining, COOLDOWN_CYCLES));
    }

    #[test]
    fn test_rain_fifteen_minutes_out_does_not_trigger() {
        let mut alarm = RainAlarm::new();
        let forecast = forecast_with_rain_at(noon(), &[3], RainIntensity::Heavy);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::Off);
        assert_eq!(alarm.state().phase, AlarmPhase::Idle);
    }

    #[test]
    fn test_raining_with_clear_hour_enters_cooldown_still_on() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Raining, COOLDOWN_CYCLES));
        let forecast = forecast_with_rain_at(noon(), &[11], RainIntensity::Light);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::On);
        assert_eq!(alarm.state(), state(AlarmPhase::Cooldown, COOLDOWN_CYCLES));
    }

    #[test]
    fn test_raining_with_rain_later_in_hour_stays_raining() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Raining, COOLDOWN_CYCLES));
        let forecast = forecast_with_rain_at(noon(), &[10], RainIntensity::Light);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::On);
        assert_eq!(alarm.state().phase, AlarmPhase::Raining);
    }

    #[test]
    fn test_expired_cooldown_with_clear_hour_switches_off() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Cooldown, 0));
        let forecast = forecast_with_rain_at(noon(), &[], RainIntensity::None);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::Off);
        assert_eq!(alarm.state(), state(AlarmPhase::Idle, 0));
    }

    #[test]
    fn test_rain_during_cooldown_rearms() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Cooldown, 0));
        let forecast = forecast_with_rain_at(noon(), &[2], RainIntensity::Light);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::On);
        assert_eq!(alarm.state(), state(AlarmPhase::Raining, COOLDOWN_CYCLES));
    }

    #[test]
    fn test_expired_cooldown_with_rain_within_hour_holds_on() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Cooldown, 0));
        let forecast = forecast_with_rain_at(noon(), &[6], RainIntensity::Light);

        assert_eq!(alarm.evaluate(&forecast, noon()), AlarmSignal::On);
        assert_eq!(alarm.state(), state(AlarmPhase::Cooldown, 0));
    }

    #[test]
    fn test_cooldown_counts_down_before_release() {
        let mut alarm = RainAlarm::with_state(state(AlarmPhase::Cooldown, 2));

        assert_eq!(alarm.step(LOOKAHEAD_SAMPLES), AlarmSignal::On);
        assert_eq!(alarm.state().cooldown_remaining, 1);
        assert_eq!(alarm.step(LOOKAHEAD_SAMPLES), AlarmSignal::On);
        assert_eq!(alarm.state().cooldown_remaining, 0);
        assert_eq!(alarm.step(LOOKAHEAD_SAMPLES), AlarmSignal::Off);
        assert_eq!(alarm.state().phase, AlarmPhase::Idle);
    }

    #[test]
    fn test_full_shower_takes_seventeen_dry_cycles_to_clear() {
        let mut alarm = RainAlarm::new();
        assert_eq!(alarm.step(0), AlarmSignal::On);

        // One cycle to enter cooldown, fifteen to count down, one to release.
        let mut on_cycles = 0;
        while alarm.step(LOOKAHEAD_SAMPLES) == AlarmSignal::On {
            on_cycles += 1;
            assert!(on_cycles <= 20, "alarm never released");
        }
        assert_eq!(on_cycles, 1 + COOLDOWN_CYCLES as usize);
        assert_eq!(alarm.state().phase, AlarmPhase::Idle);
    }

    #[test]
    fn test_signal_payloads() {
        assert_eq!(AlarmSignal::On.as_payload(), "on");
        assert_eq!(AlarmSignal::Off.to_string(), "off");
    }

    // --- Properties -----------------------------------------------------------

    proptest! {
        #[test]
        fn prop_off_only_when_idle_and_cooldown_bounded(
            horizons in proptest::collection::vec(0..=LOOKAHEAD_SAMPLES, 0..200)
        ) {
            let mut alarm = RainAlarm::new();
            for horizon in horizons {
                let before = alarm.state().phase;
                let signal = alarm.step(horizon);
                let after = alarm.state();

                prop_assert!(after.cooldown_remaining <= COOLDOWN_CYCLES);
                prop_assert_eq!(
                    signal == AlarmSignal::Off,
                    after.phase == AlarmPhase::Idle,
                    "signal {:?} in phase {:?} (horizon {})",
                    signal,
                    after.phase,
                    horizon
                );
                if horizon < TRIGGER_HORIZON {
                    prop_assert_eq!(after, state(AlarmPhase::Raining, COOLDOWN_CYCLES));
                }
                if before == AlarmPhase::Idle && horizon >= TRIGGER_HORIZON {
                    prop_assert_eq!(after.phase, AlarmPhase::Idle);
                }
            }
        }
    }
}
