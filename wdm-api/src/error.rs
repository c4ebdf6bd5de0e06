use core::fmt;

use alloc::string::String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Input ended before the field being read
    Truncated { needed: usize, available: usize },
    /// Leading sync byte does not match the protocol marker
    BadMarker(u8),
    /// Frame is addressed to another node
    ForeignNode,
    /// Opcode not valid in this direction
    UnknownOpcode(u8),
    /// Device kind byte outside the known set
    UnknownDeviceKind(u8),
    /// Status report exceeds the device table capacity
    TooManyDevices(usize),
    /// CONFIG payload could not be parsed or rendered
    InvalidConfig(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "Truncated frame: needed {} bytes, got {}", needed, available)
            }
            Self::BadMarker(m) => write!(f, "Bad frame marker: {:#04x}", m),
            Self::ForeignNode => write!(f, "Frame addressed to another node"),
            Self::UnknownOpcode(op) => write!(f, "Unknown opcode: {:#04x}", op),
            Self::UnknownDeviceKind(k) => write!(f, "Unknown device kind: {}", k),
            Self::TooManyDevices(n) => write!(f, "Too many devices in report: {}", n),
            Self::InvalidConfig(e) => write!(f, "Invalid config payload: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

pub type Result<T> = core::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(FrameError::BadMarker(0x02).to_string(), "Bad frame marker: 0x02");
        assert_eq!(FrameError::UnknownOpcode(0x7f).to_string(), "Unknown opcode: 0x7f");
        assert_eq!(
            FrameError::Truncated { needed: 8, available: 3 }.to_string(),
            "Truncated frame: needed 8 bytes, got 3"
        );
    }
}
