use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use wdm_api::DeviceKind;
use wdm_embedded::DeviceHal;

/// Blocking delay on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Stands in for relay outputs by logging every level change.
#[derive(Debug, Default)]
pub struct LogOutputs;

impl DeviceHal for LogOutputs {
    fn apply(&mut self, offset: u8, kind: DeviceKind, value: i32) {
        tracing::info!(offset, kind = kind.name(), value, "Output changed");
    }
}
