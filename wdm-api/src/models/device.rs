use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Physical device type carried in STATUS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DeviceKind {
    /// Smoke detector
    Smoke = 1,
    /// Temperature sensor
    Temperature = 2,
    /// Humidity sensor
    Humidity = 3,
    /// Relay or switched output
    OnOff = 4,
}

/// How a device's value is interpreted and whether it accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Boolean output driven by `control`
    Actuator,
    /// Free-running reading reported by the hardware
    Sensor,
}

impl DeviceKind {
    pub fn from_u8(value: u8) -> Result<Self, FrameError> {
        match value {
            1 => Ok(Self::Smoke),
            2 => Ok(Self::Temperature),
            3 => Ok(Self::Humidity),
            4 => Ok(Self::OnOff),
            other => Err(FrameError::UnknownDeviceKind(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn class(self) -> DeviceClass {
        match self {
            Self::OnOff => DeviceClass::Actuator,
            Self::Smoke | Self::Temperature | Self::Humidity => DeviceClass::Sensor,
        }
    }

    pub fn is_actuator(self) -> bool {
        self.class() == DeviceClass::Actuator
    }

    /// Normalises a requested value for storage and comparison.
    pub fn normalize(self, value: i32) -> i32 {
        match self.class() {
            DeviceClass::Actuator => (value != 0) as i32,
            DeviceClass::Sensor => value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::OnOff => "on_off",
        }
    }
}
