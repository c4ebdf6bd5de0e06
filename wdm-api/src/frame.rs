//! Publish/subscribe frame codec.
//!
//! ```text
//! [marker:1][opcode:1][node_id:6][payload...]
//! ```
//!
//! Integers are little-endian. Outbound frames always carry the local node id;
//! inbound frames are validated marker first, then node id, then opcode.

use alloc::vec::Vec;

use crate::codec::ByteReader;
use crate::config;
use crate::error::{FrameError, Result};
use crate::models::{DeviceConfig, DeviceKind, DeviceRecord, MAX_DEVICES, NodeId, StatusReport};

pub const FRAME_MARKER: u8 = 0x01;

/// marker(1) + opcode(1) + node id(6)
pub const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Node asks the server for the current time
    TimeRequest = 0x41,
    /// Node reports device states
    Status = 0x42,
    /// Server pushes UTC time
    TimeSet = 0x61,
    /// Server pushes a device configuration
    Config = 0x63,
    /// Server requests a device value change
    Command = 0x64,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x41 => Ok(Self::TimeRequest),
            0x42 => Ok(Self::Status),
            0x61 => Ok(Self::TimeSet),
            0x63 => Ok(Self::Config),
            0x64 => Ok(Self::Command),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }

    pub fn is_inbound(&self) -> bool {
        matches!(self, Self::TimeSet | Self::Config | Self::Command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TimeRequest => "TIME_REQUEST",
            Self::Status => "STATUS",
            Self::TimeSet => "TIME_SET",
            Self::Config => "CONFIG",
            Self::Command => "COMMAND",
        }
    }
}

/// Size of each STATUS device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// offset, kind, signal, power, value(4)
    Short,
    /// `Short` followed by change_time(4)
    #[default]
    Extended,
}

impl RecordFormat {
    pub fn record_size(&self) -> usize {
        match self {
            Self::Short => 8,
            Self::Extended => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    TimeRequest { now: u32 },
    Status(StatusReport),
}

impl Outbound {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::TimeRequest { .. } => Opcode::TimeRequest,
            Self::Status(_) => Opcode::Status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    TimeSet { utc: u32 },
    Config { offset: u8, config: DeviceConfig },
    Command { offset: u8, command: u8 },
}

impl Inbound {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::TimeSet { .. } => Opcode::TimeSet,
            Self::Config { .. } => Opcode::Config,
            Self::Command { .. } => Opcode::Command,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: u8,
    pub node_id: NodeId,
}

impl FrameHeader {
    pub fn new(opcode: Opcode, node_id: NodeId) -> Self {
        Self {
            opcode: opcode as u8,
            node_id,
        }
    }

    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.push(FRAME_MARKER);
        buffer.push(self.opcode);
        buffer.extend_from_slice(self.node_id.as_bytes());
    }

    /// Reads the header, rejecting a wrong marker before anything else.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let marker = reader.read_u8()?;
        if marker != FRAME_MARKER {
            return Err(FrameError::BadMarker(marker));
        }
        let opcode = reader.read_u8()?;
        let node_id = NodeId(reader.read_array()?);
        Ok(Self { opcode, node_id })
    }
}

/// Builds a node-to-server frame stamped with `node_id`.
pub fn encode_outbound(node_id: &NodeId, message: &Outbound, format: RecordFormat) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(HEADER_SIZE + 1 + MAX_DEVICES * format.record_size());
    FrameHeader::new(message.opcode(), *node_id).encode_into(&mut buffer);

    match message {
        Outbound::TimeRequest { now } => buffer.extend_from_slice(&now.to_le_bytes()),
        Outbound::Status(report) => {
            buffer.push(report.len() as u8);
            for record in report.records() {
                buffer.push(record.offset);
                buffer.push(record.kind.as_u8());
                buffer.push(record.signal_quality as u8);
                buffer.push(record.power_level);
                buffer.extend_from_slice(&record.value.to_le_bytes());
                if format == RecordFormat::Extended {
                    buffer.extend_from_slice(&record.change_time.to_le_bytes());
                }
            }
        }
    }

    buffer
}

/// Parses a server-to-node frame addressed to `local`.
pub fn decode_inbound(data: &[u8], local: &NodeId) -> Result<Inbound> {
    let mut reader = ByteReader::new(data);
    let header = FrameHeader::decode(&mut reader)?;
    if header.node_id != *local {
        return Err(FrameError::ForeignNode);
    }

    let opcode = Opcode::from_u8(header.opcode)?;
    if !opcode.is_inbound() {
        return Err(FrameError::UnknownOpcode(header.opcode));
    }

    match opcode {
        Opcode::TimeSet => Ok(Inbound::TimeSet {
            utc: reader.read_u32()?,
        }),
        Opcode::Config => {
            let (offset, config) = config::parse_config(reader.remaining())?;
            Ok(Inbound::Config { offset, config })
        }
        Opcode::Command => {
            let offset = reader.read_u8()?;
            let command = reader.read_u8()?;
            Ok(Inbound::Command { offset, command })
        }
        Opcode::TimeRequest | Opcode::Status => Err(FrameError::UnknownOpcode(header.opcode)),
    }
}

/// Server side: builds a frame for the node `node_id`.
pub fn encode_inbound(node_id: &NodeId, message: &Inbound) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(HEADER_SIZE + 4);
    FrameHeader::new(message.opcode(), *node_id).encode_into(&mut buffer);

    match message {
        Inbound::TimeSet { utc } => buffer.extend_from_slice(&utc.to_le_bytes()),
        Inbound::Config { offset, config } => {
            buffer.extend_from_slice(&config::render_config(*offset, config)?);
        }
        Inbound::Command { offset, command } => {
            buffer.push(*offset);
            buffer.push(*command);
        }
    }

    Ok(buffer)
}

/// Server side: parses a node frame, returning the sender and its message.
pub fn decode_outbound(data: &[u8], format: RecordFormat) -> Result<(NodeId, Outbound)> {
    let mut reader = ByteReader::new(data);
    let header = FrameHeader::decode(&mut reader)?;

    let message = match Opcode::from_u8(header.opcode)? {
        Opcode::TimeRequest => Outbound::TimeRequest {
            now: reader.read_u32()?,
        },
        Opcode::Status => {
            let count = reader.read_u8()? as usize;
            if count > MAX_DEVICES {
                return Err(FrameError::TooManyDevices(count));
            }
            let mut report = StatusReport::new();
            for _ in 0..count {
                let offset = reader.read_u8()?;
                let kind = DeviceKind::from_u8(reader.read_u8()?)?;
                let signal_quality = reader.read_i8()?;
                let power_level = reader.read_u8()?;
                let value = reader.read_i32()?;
                let change_time = match format {
                    RecordFormat::Extended => reader.read_u32()?,
                    RecordFormat::Short => 0,
                };
                report.push(DeviceRecord {
                    offset,
                    kind,
                    signal_quality,
                    power_level,
                    value,
                    change_time,
                })?;
            }
            Outbound::Status(report)
        }
        Opcode::TimeSet | Opcode::Config | Opcode::Command => {
            return Err(FrameError::UnknownOpcode(header.opcode));
        }
    };

    Ok((header.node_id, message))
}
