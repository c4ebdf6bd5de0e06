//! Datagram packet codec.
//!
//! ```text
//! [marker:1][sequence:4][node_id:6][opcode:1][payload...][fcs:8]
//! ```
//!
//! The frame check field is sent as zeros and ignored on receipt. Opcode
//! values overlap between directions, so each direction has its own enum.

use alloc::vec::Vec;

use crate::codec::ByteReader;
use crate::error::{FrameError, Result};
use crate::models::{DeviceKind, DeviceRecord, MAX_DEVICES, NodeId, StatusReport};

pub const PACKET_MARKER: u8 = 0xA8;

/// marker(1) + sequence(4) + node id(6) + opcode(1)
pub const HEADER_SIZE: usize = 12;

pub const FCS_SIZE: usize = 8;

/// offset, kind, value(4), signal, power
pub const RECORD_SIZE: usize = 8;

/// Largest datagram the node sends or accepts
pub const MAX_PACKET_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeOpcode {
    Connect = 0x01,
    Status = 0x02,
    Ack = 0x03,
}

impl NodeOpcode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Connect),
            0x02 => Ok(Self::Status),
            0x03 => Ok(Self::Ack),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerOpcode {
    ConnAck = 0x01,
    Ack = 0x02,
    Command = 0x03,
}

impl ServerOpcode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::ConnAck),
            0x02 => Ok(Self::Ack),
            0x03 => Ok(Self::Command),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

/// Packets sent by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePacket {
    Connect,
    Status(StatusReport),
    /// Acknowledges a server packet by its sequence and opcode
    Ack { sequence: u32, opcode: u8 },
}

impl NodePacket {
    pub fn opcode(&self) -> NodeOpcode {
        match self {
            Self::Connect => NodeOpcode::Connect,
            Self::Status(_) => NodeOpcode::Status,
            Self::Ack { .. } => NodeOpcode::Ack,
        }
    }
}

/// Packets sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPacket {
    ConnAck,
    Ack { sequence: u32, opcode: u8 },
    Command { offset: u8, command: u8 },
}

impl ServerPacket {
    pub fn opcode(&self) -> ServerOpcode {
        match self {
            Self::ConnAck => ServerOpcode::ConnAck,
            Self::Ack { .. } => ServerOpcode::Ack,
            Self::Command { .. } => ServerOpcode::Command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram<M> {
    pub sequence: u32,
    pub node_id: NodeId,
    pub message: M,
}

fn encode_header(buffer: &mut Vec<u8>, sequence: u32, node_id: &NodeId, opcode: u8) {
    buffer.push(PACKET_MARKER);
    buffer.extend_from_slice(&sequence.to_le_bytes());
    buffer.extend_from_slice(node_id.as_bytes());
    buffer.push(opcode);
}

/// Returns (sequence, node id, opcode) after checking the marker.
fn decode_header(reader: &mut ByteReader<'_>) -> Result<(u32, NodeId, u8)> {
    let marker = reader.read_u8()?;
    if marker != PACKET_MARKER {
        return Err(FrameError::BadMarker(marker));
    }
    let sequence = reader.read_u32()?;
    let node_id = NodeId(reader.read_array()?);
    let opcode = reader.read_u8()?;
    Ok((sequence, node_id, opcode))
}

/// Builds a node packet.
pub fn encode_node_packet(sequence: u32, node_id: &NodeId, packet: &NodePacket) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(MAX_PACKET_SIZE);
    encode_header(&mut buffer, sequence, node_id, packet.opcode() as u8);

    match packet {
        NodePacket::Connect => {}
        NodePacket::Status(report) => {
            buffer.push(report.len() as u8);
            for record in report.records() {
                buffer.push(record.offset);
                buffer.push(record.kind.as_u8());
                buffer.extend_from_slice(&record.value.to_le_bytes());
                buffer.push(record.signal_quality as u8);
                buffer.push(record.power_level);
            }
        }
        NodePacket::Ack { sequence, opcode } => {
            buffer.extend_from_slice(&sequence.to_le_bytes());
            buffer.push(*opcode);
        }
    }

    buffer.extend_from_slice(&[0u8; FCS_SIZE]);
    buffer
}

/// Parses a server packet addressed to `local`. Marker, then node id, then opcode.
pub fn decode_server_packet(data: &[u8], local: &NodeId) -> Result<Datagram<ServerPacket>> {
    let mut reader = ByteReader::new(data);
    let (sequence, node_id, opcode) = decode_header(&mut reader)?;
    if node_id != *local {
        return Err(FrameError::ForeignNode);
    }

    let message = match ServerOpcode::from_u8(opcode)? {
        ServerOpcode::ConnAck => ServerPacket::ConnAck,
        ServerOpcode::Ack => ServerPacket::Ack {
            sequence: reader.read_u32()?,
            opcode: reader.read_u8()?,
        },
        ServerOpcode::Command => ServerPacket::Command {
            offset: reader.read_u8()?,
            command: reader.read_u8()?,
        },
    };

    Ok(Datagram {
        sequence,
        node_id,
        message,
    })
}

/// Server side: builds a packet for the node `node_id`.
pub fn encode_server_packet(sequence: u32, node_id: &NodeId, packet: &ServerPacket) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(HEADER_SIZE + 5 + FCS_SIZE);
    encode_header(&mut buffer, sequence, node_id, packet.opcode() as u8);

    match packet {
        ServerPacket::ConnAck => {}
        ServerPacket::Ack { sequence, opcode } => {
            buffer.extend_from_slice(&sequence.to_le_bytes());
            buffer.push(*opcode);
        }
        ServerPacket::Command { offset, command } => {
            buffer.push(*offset);
            buffer.push(*command);
        }
    }

    buffer.extend_from_slice(&[0u8; FCS_SIZE]);
    buffer
}

/// Server side: parses a node packet.
pub fn decode_node_packet(data: &[u8]) -> Result<Datagram<NodePacket>> {
    let mut reader = ByteReader::new(data);
    let (sequence, node_id, opcode) = decode_header(&mut reader)?;

    let message = match NodeOpcode::from_u8(opcode)? {
        NodeOpcode::Connect => NodePacket::Connect,
        NodeOpcode::Status => {
            let count = reader.read_u8()? as usize;
            if count > MAX_DEVICES {
                return Err(FrameError::TooManyDevices(count));
            }
            let mut report = StatusReport::new();
            for _ in 0..count {
                let offset = reader.read_u8()?;
                let kind = DeviceKind::from_u8(reader.read_u8()?)?;
                let value = reader.read_i32()?;
                let signal_quality = reader.read_i8()?;
                let power_level = reader.read_u8()?;
                report.push(DeviceRecord {
                    offset,
                    kind,
                    signal_quality,
                    power_level,
                    value,
                    change_time: 0,
                })?;
            }
            NodePacket::Status(report)
        }
        NodeOpcode::Ack => NodePacket::Ack {
            sequence: reader.read_u32()?,
            opcode: reader.read_u8()?,
        },
    };

    Ok(Datagram {
        sequence,
        node_id,
        message,
    })
}
