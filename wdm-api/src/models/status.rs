use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::{DeviceKind, MAX_DEVICES};
use crate::error::FrameError;

/// Wire snapshot of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub offset: u8,
    pub kind: DeviceKind,
    /// Link quality in dBm, [-128, 0]
    pub signal_quality: i8,
    /// Battery or supply level in percent, [0, 100]
    pub power_level: u8,
    pub value: i32,
    /// Local Unix seconds of the last value change
    pub change_time: u32,
}

/// Ordered set of device records carried by a STATUS frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    records: Vec<DeviceRecord, MAX_DEVICES>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(record: DeviceRecord) -> Self {
        let mut report = Self::new();
        // Capacity is never zero
        let _ = report.records.push(record);
        report
    }

    pub fn push(&mut self, record: DeviceRecord) -> Result<(), FrameError> {
        self.records
            .push(record)
            .map_err(|_| FrameError::TooManyDevices(MAX_DEVICES + 1))
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, offset: u8) -> Option<&DeviceRecord> {
        self.records.iter().find(|r| r.offset == offset)
    }
}

impl FromIterator<DeviceRecord> for StatusReport {
    /// Records beyond the device table capacity are dropped.
    fn from_iter<I: IntoIterator<Item = DeviceRecord>>(iter: I) -> Self {
        let mut report = Self::new();
        for record in iter.into_iter().take(MAX_DEVICES) {
            let _ = report.records.push(record);
        }
        report
    }
}
