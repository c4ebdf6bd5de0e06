use embedded_hal::delay::DelayNs;
use wdm_api::datagram::{self, MAX_PACKET_SIZE, NodePacket, ServerOpcode, ServerPacket};
use wdm_api::frame::Inbound;
use wdm_api::{NodeId, StatusReport};

use super::{Binding, DatagramTransport, Delivery, LinkState};
use crate::config::DatagramConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Nothing,
    ConnAck,
    Ack(u32),
}

/// Sequenced packets with a bounded wait for acknowledgement.
///
/// While waiting, every other packet received is handled on the spot,
/// so a COMMAND arriving mid-wait is applied before the wait ends.
pub struct DatagramBinding<T: DatagramTransport, D: DelayNs> {
    transport: T,
    delay: D,
    node_id: NodeId,
    config: DatagramConfig,
    sequence: u32,
    announced: bool,
    buffer: [u8; MAX_PACKET_SIZE],
}

impl<T: DatagramTransport, D: DelayNs> DatagramBinding<T, D> {
    pub fn new(transport: T, delay: D, node_id: NodeId, config: DatagramConfig) -> Self {
        Self {
            transport,
            delay,
            node_id,
            config,
            sequence: 1,
            announced: false,
            buffer: [0; MAX_PACKET_SIZE],
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Sequence number the next packet will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Sends CONNECT and waits for CONNACK.
    pub fn announce(&mut self, handler: &mut dyn FnMut(Inbound)) -> bool {
        if self.send(&NodePacket::Connect).is_none() {
            return false;
        }
        match self.await_reply(Awaiting::ConnAck, handler) {
            Some(_) => {
                log::info!("Server acknowledged node {}", self.node_id);
                true
            }
            None => {
                log::warn!("No CONNACK from {}:{}", self.config.server_host, self.config.server_port);
                false
            }
        }
    }

    fn send(&mut self, packet: &NodePacket) -> Option<u32> {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let bytes = datagram::encode_node_packet(sequence, &self.node_id, packet);
        if self
            .transport
            .send(&self.config.server_host, self.config.server_port, &bytes)
        {
            log::debug!("Sent {:?} #{}", packet.opcode(), sequence);
            Some(sequence)
        } else {
            log::warn!("Datagram #{} could not be sent", sequence);
            None
        }
    }

    /// Polls up to the attempt budget. Returns the attempt that matched.
    fn await_reply(&mut self, awaiting: Awaiting, handler: &mut dyn FnMut(Inbound)) -> Option<u32> {
        for attempt in 1..=self.config.ack_attempts {
            if self.receive(awaiting, handler) == Some(true) {
                return Some(attempt);
            }
            self.delay.delay_ms(self.config.ack_delay_ms);
        }
        None
    }

    /// Handles at most one pending packet.
    ///
    /// `None` when nothing was pending, otherwise whether the packet was
    /// the awaited reply.
    fn receive(&mut self, awaiting: Awaiting, handler: &mut dyn FnMut(Inbound)) -> Option<bool> {
        let len = self.transport.poll_receive(&mut self.buffer)?;
        let data = &self.buffer[..len.min(MAX_PACKET_SIZE)];

        let packet = match datagram::decode_server_packet(data, &self.node_id) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("Discarding datagram: {}", e);
                return Some(false);
            }
        };

        let matched = match packet.message {
            ServerPacket::ConnAck => awaiting == Awaiting::ConnAck,
            ServerPacket::Ack { sequence, .. } => {
                if awaiting == Awaiting::Ack(sequence) {
                    true
                } else {
                    log::debug!("Ignoring ACK for #{}", sequence);
                    false
                }
            }
            ServerPacket::Command { offset, command } => {
                let ack = NodePacket::Ack {
                    sequence: packet.sequence,
                    opcode: ServerOpcode::Command as u8,
                };
                if self.send(&ack).is_none() {
                    log::debug!("Applying COMMAND #{} without acknowledging it", packet.sequence);
                }
                handler(Inbound::Command { offset, command });
                false
            }
        };
        Some(matched)
    }
}

impl<T: DatagramTransport, D: DelayNs> Binding for DatagramBinding<T, D> {
    fn maintain(&mut self, handler: &mut dyn FnMut(Inbound)) -> LinkState {
        if !self.announced {
            self.announced = true;
            self.announce(handler);
            return LinkState::JustConnected;
        }

        while self.receive(Awaiting::Nothing, handler).is_some() {}
        LinkState::Connected
    }

    fn publish_status(
        &mut self,
        report: &StatusReport,
        handler: &mut dyn FnMut(Inbound),
    ) -> Delivery {
        let Some(sequence) = self.send(&NodePacket::Status(report.clone())) else {
            return Delivery::SendFailed;
        };

        match self.await_reply(Awaiting::Ack(sequence), handler) {
            Some(attempts) => Delivery::Acknowledged { attempts },
            None => {
                log::warn!("STATUS #{} unacknowledged after {} attempts", sequence, self.config.ack_attempts);
                Delivery::Unacknowledged
            }
        }
    }
}
