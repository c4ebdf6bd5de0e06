use heapless::Vec;
use wdm_api::{DEVICE_SCHEDULE_CNT, MAX_DEVICES};

use crate::hal::DeviceHal;
use crate::registry::Registry;
use crate::storage::SettingsStore;

/// Evaluates schedule entries against the current minute.
///
/// No debouncing happens here: running twice in the same minute fires
/// the due entries twice. [`MinuteGate`] keeps the driver to one run.
pub struct Scheduler;

impl Scheduler {
    /// Fires every due entry and returns how many commands were issued.
    pub fn run<S: SettingsStore, H: DeviceHal>(
        registry: &mut Registry<S, H>,
        weekday: u8,
        minute_of_day: u16,
        now: u32,
    ) -> usize {
        let mut due: Vec<(u8, u8), { MAX_DEVICES * DEVICE_SCHEDULE_CNT }> = Vec::new();

        for device in registry.devices() {
            if !device.config.enabled {
                continue;
            }
            for entry in device.config.schedules.iter() {
                if entry.is_due(weekday, minute_of_day) {
                    let _ = due.push((entry.target_offset, entry.command));
                }
            }
        }

        for (offset, command) in due.iter() {
            log::debug!("Schedule fired: device {} <- {}", offset, command);
            registry.control(*offset, *command as i32, now);
        }
        due.len()
    }
}

/// Passes once per wall-clock minute, at second 0.
#[derive(Debug, Default)]
pub struct MinuteGate {
    last_minute: Option<u32>,
}

impl MinuteGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&mut self, now: u32) -> bool {
        let minute = now / 60;
        if now % 60 != 0 || self.last_minute == Some(minute) {
            return false;
        }
        self.last_minute = Some(minute);
        true
    }
}
