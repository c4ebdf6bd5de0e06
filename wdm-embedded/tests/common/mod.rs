#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use wdm_api::datagram::{self, Datagram, NodePacket, ServerPacket};
use wdm_api::frame::{self, Outbound, RecordFormat};
use wdm_api::{DeviceKind, NodeId};
use wdm_embedded::DeviceHal;
use wdm_embedded::transport::{ConnectOptions, DatagramTransport, Message, PubSubTransport};

pub const NODE: NodeId = NodeId([0x18, 0xfe, 0x34, 0xd4, 0x4c, 0x01]);

// 2024-01-03 07:29:58, a Wednesday
pub const WEDNESDAY_0729_58: u32 = 1_704_266_998;

#[derive(Debug, Default)]
pub struct CountingDelay {
    pub calls: u32,
    pub total_ms: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ms += ns as u64 / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += ms as u64;
    }
}

#[derive(Debug, Default)]
pub struct RecordingHal {
    pub writes: Vec<(u8, DeviceKind, i32)>,
}

impl DeviceHal for RecordingHal {
    fn apply(&mut self, offset: u8, kind: DeviceKind, value: i32) {
        self.writes.push((offset, kind, value));
    }
}

/// Broker stand-in. Connection attempts succeed unless `refuse` is set,
/// the next `failing_subscribes` subscribe calls fail, and nothing is
/// delivered until a topic has been subscribed.
#[derive(Debug, Default)]
pub struct MockBroker {
    pub connected: bool,
    pub refuse: bool,
    pub failing_subscribes: u32,
    pub connects: u32,
    pub last_username: String,
    pub last_password: String,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub inbox: VecDeque<Message>,
}

impl MockBroker {
    pub fn deliver(&mut self, topic: &str, payload: Vec<u8>) {
        self.inbox.push_back(Message {
            topic: topic.to_string(),
            payload,
        });
    }

    /// Decodes every frame published so far.
    pub fn frames(&self) -> Vec<Outbound> {
        self.published
            .iter()
            .map(|(_, bytes)| frame::decode_outbound(bytes, RecordFormat::Extended).unwrap().1)
            .collect()
    }

    pub fn status_frames(&self) -> Vec<wdm_api::StatusReport> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Outbound::Status(report) => Some(report),
                Outbound::TimeRequest { .. } => None,
            })
            .collect()
    }
}

impl PubSubTransport for MockBroker {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> bool {
        self.connects += 1;
        self.last_username = options.username.to_string();
        self.last_password = options.password.to_string();
        self.connected = !self.refuse;
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.published.push((topic.to_string(), payload.to_vec()));
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if self.failing_subscribes > 0 {
            self.failing_subscribes -= 1;
            return false;
        }
        self.subscriptions.push(topic.to_string());
        true
    }

    fn poll(&mut self) -> Option<Message> {
        if self.subscriptions.is_empty() {
            return None;
        }
        self.inbox.pop_front()
    }
}

/// Datagram server stand-in.
///
/// Replies are queued as packets are sent: CONNACK and ACK when the
/// matching switch is on, then anything in `after_status` once a STATUS
/// goes out. `inbox` holds packets pending for the node.
#[derive(Debug, Default)]
pub struct MockServer {
    pub auto_connack: bool,
    pub auto_ack: bool,
    pub after_status: VecDeque<ServerPacket>,
    pub sent: Vec<(String, u16, Vec<u8>)>,
    pub inbox: VecDeque<Vec<u8>>,
    pub polls: u32,
    next_sequence: u32,
}

impl MockServer {
    pub fn acking() -> Self {
        Self {
            auto_connack: true,
            auto_ack: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: ServerPacket) -> u32 {
        self.next_sequence += 1;
        let sequence = 1000 + self.next_sequence;
        self.inbox
            .push_back(datagram::encode_server_packet(sequence, &NODE, &packet));
        sequence
    }

    pub fn packets(&self) -> Vec<Datagram<NodePacket>> {
        self.sent
            .iter()
            .map(|(_, _, bytes)| datagram::decode_node_packet(bytes).unwrap())
            .collect()
    }
}

impl DatagramTransport for MockServer {
    fn send(&mut self, host: &str, port: u16, data: &[u8]) -> bool {
        self.sent.push((host.to_string(), port, data.to_vec()));
        let packet = datagram::decode_node_packet(data).unwrap();

        match packet.message {
            NodePacket::Connect if self.auto_connack => {
                self.push(ServerPacket::ConnAck);
            }
            NodePacket::Status(_) => {
                if self.auto_ack {
                    self.push(ServerPacket::Ack {
                        sequence: packet.sequence,
                        opcode: 0x02,
                    });
                }
                while let Some(reply) = self.after_status.pop_front() {
                    self.push(reply);
                }
            }
            _ => {}
        }
        true
    }

    fn poll_receive(&mut self, buffer: &mut [u8]) -> Option<usize> {
        self.polls += 1;
        let packet = self.inbox.pop_front()?;
        buffer[..packet.len()].copy_from_slice(&packet);
        Some(packet.len())
    }
}
