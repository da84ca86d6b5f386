//! Rain alarm service
//!
//! Polls the wetter.com precipitation nowcast for one location, keeps the
//! latest forecast for the query endpoints, and publishes an `on`/`off`
//! rain alarm over MQTT.

pub mod alert;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod poller;
pub mod publish;
pub mod server;
pub mod store;
pub mod verify;
