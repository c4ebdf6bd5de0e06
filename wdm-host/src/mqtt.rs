use std::collections::VecDeque;
use std::time::Duration;

use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};
use wdm_embedded::transport::{ConnectOptions, Message, PubSubTransport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PUMP_TIMEOUT: Duration = Duration::from_millis(10);

struct Session {
    client: Client,
    connection: Connection,
}

/// Broker session over the blocking rumqttc client.
///
/// The event loop only advances while it is pumped, so every call
/// pumps it briefly and buffers received publishes.
pub struct MqttTransport {
    host: String,
    port: u16,
    session: Option<Session>,
    connected: bool,
    inbox: VecDeque<Message>,
}

impl MqttTransport {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            session: None,
            connected: false,
            inbox: VecDeque::new(),
        }
    }

    fn pump(&mut self, timeout: Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        loop {
            match session.connection.recv_timeout(timeout) {
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    self.inbox.push_back(Message {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    tracing::warn!("Broker closed the session");
                    self.connected = false;
                    self.session = None;
                    return;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!("MQTT connection error: {}", e);
                    self.connected = false;
                    self.session = None;
                    return;
                }
                Err(_) => return,
            }
        }
    }
}

impl PubSubTransport for MqttTransport {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> bool {
        let mut mqtt_options = MqttOptions::new(options.client_id, &self.host, self.port);
        mqtt_options.set_keep_alive(Duration::from_secs(15));
        mqtt_options.set_clean_session(true);
        if !options.password.is_empty() {
            mqtt_options.set_credentials(options.username, options.password);
        }

        let (client, mut connection) = Client::new(mqtt_options, 10);
        tracing::debug!("Connecting to {}:{}", self.host, self.port);

        loop {
            match connection.recv_timeout(CONNECT_TIMEOUT) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        tracing::warn!("Broker refused connection: {:?}", ack.code);
                        return false;
                    }
                    break;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!("MQTT connect to {}:{} failed: {}", self.host, self.port, e);
                    return false;
                }
                Err(_) => {
                    tracing::warn!("MQTT connect to {}:{} timed out", self.host, self.port);
                    return false;
                }
            }
        }

        self.session = Some(Session { client, connection });
        self.connected = true;
        true
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if let Err(e) = session
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
        {
            tracing::warn!("Publish to {} failed: {}", topic, e);
            return false;
        }
        self.pump(PUMP_TIMEOUT);
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if let Err(e) = session.client.try_subscribe(topic, QoS::AtMostOnce) {
            tracing::warn!("Subscribe to {} failed: {}", topic, e);
            return false;
        }
        self.pump(PUMP_TIMEOUT);
        self.connected
    }

    fn poll(&mut self) -> Option<Message> {
        if self.inbox.is_empty() {
            self.pump(PUMP_TIMEOUT);
        }
        self.inbox.pop_front()
    }
}
