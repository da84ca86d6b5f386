/// Alarm delivery over MQTT.
///
/// Each cycle opens a short-lived connection, publishes the payload with
/// QoS 1, waits for the broker's acknowledgement and disconnects. Failures
/// are returned to the poller, which logs them; nothing here retries.
/// A broker that never acknowledges is given up on after `ack_timeout`.

use std::time::{Duration, Instant};

use rumqttc::{Client, Event, MqttOptions, Packet, QoS, RecvTimeoutError};

use crate::alert::AlarmSignal;
use crate::model::PublishError;

/// Anything that can deliver the alarm signal to a topic.
pub trait AlarmPublisher {
    fn publish(&self, topic: &str, signal: AlarmSignal) -> Result<(), PublishError>;
}

/// Longest wait for the broker's acknowledgement of one publish.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MqttPublisher {
    host: String,
    port: u16,
    client_id: String,
    ack_timeout: Duration,
}

impl MqttPublisher {
    pub fn new(host: &str, port: u16, client_id: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            client_id: client_id.to_string(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AlarmPublisher for MqttPublisher {
    fn publish(&self, topic: &str, signal: AlarmSignal) -> Result<(), PublishError> {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(5));
        options.set_clean_session(true);

        let (client, mut connection) = Client::new(options, 10);
        client
            .publish(topic, QoS::AtLeastOnce, false, signal.as_payload())
            .map_err(|e| PublishError::Client(e.to_string()))?;

        let deadline = Instant::now() + self.ack_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::PubAck(_)))) => {
                    // The message is delivered; a failed disconnect changes nothing.
                    let _ = client.disconnect();
                    return Ok(());
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(PublishError::Connection(e.to_string())),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(PublishError::Connection(format!(
                        "no acknowledgement from {} within {}ms",
                        self.endpoint(),
                        self.ack_timeout.as_millis()
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PublishError::Connection(format!(
                        "connection to {} closed before acknowledgement",
                        self.endpoint()
                    )));
                }
            }
        }
    }
}
