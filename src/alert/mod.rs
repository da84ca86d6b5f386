//! Alarm decision logic.
//!
//! Submodules:
//! - `rain_alarm` — lookahead and cooldown state machine for the rain signal.

pub mod rain_alarm;

pub use rain_alarm::{AlarmPhase, AlarmSignal, AlarmState, RainAlarm};
