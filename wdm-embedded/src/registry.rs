use heapless::{Deque, Vec};
use wdm_api::{DeviceConfig, DeviceKind, DeviceRecord, MAX_DEVICES, ScheduleEntry, StatusReport};

use crate::hal::DeviceHal;
use crate::storage::{SettingsStore, load_config, save_config};
use crate::{Error, Result};

/// Signal quality reported before the first real reading.
pub const SIGNAL_UNKNOWN: i8 = i8::MIN;

pub const DEFAULT_POWER_LEVEL: u8 = 100;

/// Pending status notifications kept between two ticks.
pub const EVENT_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub offset: u8,
    pub kind: DeviceKind,
    pub value: i32,
    pub signal_quality: i8,
    pub power_level: u8,
    pub last_change_time: u32,
    pub config: DeviceConfig,
}

impl Device {
    pub fn new(offset: u8, kind: DeviceKind) -> Self {
        Self {
            offset,
            kind,
            value: 0,
            signal_quality: SIGNAL_UNKNOWN,
            power_level: DEFAULT_POWER_LEVEL,
            last_change_time: 0,
            config: DeviceConfig::default(),
        }
    }

    pub fn record(&self) -> DeviceRecord {
        DeviceRecord {
            offset: self.offset,
            kind: self.kind,
            signal_quality: self.signal_quality,
            power_level: self.power_level,
            value: self.value,
            change_time: self.last_change_time,
        }
    }
}

/// A device value changed and should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    pub record: DeviceRecord,
}

/// Fixed table of device slots, addressed by 1-based offset.
///
/// Every mutation goes through here. Out-of-range offsets are ignored
/// without an error so malformed network input cannot fault the node.
pub struct Registry<S: SettingsStore, H: DeviceHal> {
    devices: Vec<Device, MAX_DEVICES>,
    events: Deque<StatusEvent, EVENT_QUEUE_CAPACITY>,
    store: S,
    hal: H,
}

impl<S: SettingsStore, H: DeviceHal> Registry<S, H> {
    pub fn new(kinds: &[DeviceKind], store: S, hal: H) -> Self {
        if kinds.len() > MAX_DEVICES {
            log::warn!("Only the first {} of {} devices are used", MAX_DEVICES, kinds.len());
        }

        let mut devices = Vec::new();
        for (index, kind) in kinds.iter().take(MAX_DEVICES).enumerate() {
            let _ = devices.push(Device::new(index as u8 + 1, *kind));
        }

        Self {
            devices,
            events: Deque::new(),
            store,
            hal,
        }
    }

    /// Resets every slot and reloads persisted configurations.
    pub fn init(&mut self) {
        self.events.clear();
        for device in self.devices.iter_mut() {
            *device = Device::new(device.offset, device.kind);

            match load_config(&self.store, device.offset) {
                Ok(Some(config)) => device.config = config,
                Ok(None) => {}
                Err(e) => log::warn!("Ignoring stored config of device {}: {}", device.offset, e),
            }

            if device.kind.is_actuator() {
                self.hal.apply(device.offset, device.kind, device.value);
            }
        }
        log::info!("Registry initialised with {} devices", self.devices.len());
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, offset: u8) -> Option<&Device> {
        self.index(offset).map(|i| &self.devices[i])
    }

    fn index(&self, offset: u8) -> Option<usize> {
        let index = (offset as usize).checked_sub(1)?;
        (index < self.devices.len()).then_some(index)
    }

    /// Replaces the configuration of a slot and persists it.
    pub fn config(&mut self, offset: u8, config: DeviceConfig) -> bool {
        let Some(index) = self.index(offset) else {
            log::debug!("Config for unknown device {} ignored", offset);
            return false;
        };

        self.devices[index].config = config;
        self.persist(index);
        true
    }

    /// Applies a command. Returns whether the value changed.
    ///
    /// Actuator commands are clamped to 0/1. Only an actual change stamps
    /// the time, drives the output and queues a status event.
    pub fn control(&mut self, offset: u8, command: i32, now: u32) -> bool {
        let Some(index) = self.index(offset) else {
            log::debug!("Command for unknown device {} ignored", offset);
            return false;
        };

        let device = &mut self.devices[index];
        let value = device.kind.normalize(command);
        if value == device.value {
            return false;
        }

        device.value = value;
        device.last_change_time = now;
        self.hal.apply(device.offset, device.kind, value);
        log::info!("Device {} ({}) set to {}", device.offset, device.kind.name(), value);

        let record = device.record();
        self.notify(record);
        true
    }

    pub fn toggle(&mut self, offset: u8, now: u32) -> Result<bool> {
        let Some(device) = self.device(offset) else {
            return Ok(false);
        };
        if !device.kind.is_actuator() {
            return Err(Error::NotToggleable(offset));
        }

        let command = if device.value == 0 { 1 } else { 0 };
        Ok(self.control(offset, command, now))
    }

    /// Stores a sampled sensor reading.
    ///
    /// Signal and power are kept silently; a value change is reported.
    pub fn update_reading(
        &mut self,
        offset: u8,
        value: i32,
        signal_quality: i8,
        power_level: u8,
        now: u32,
    ) -> bool {
        let Some(index) = self.index(offset) else {
            return false;
        };

        let device = &mut self.devices[index];
        if device.kind.is_actuator() {
            log::debug!("Reading for actuator {} ignored", offset);
            return false;
        }

        device.signal_quality = signal_quality.min(0);
        device.power_level = power_level.min(100);
        if device.value == value {
            return false;
        }

        device.value = value;
        device.last_change_time = now;
        let record = device.record();
        self.notify(record);
        true
    }

    pub fn schedule_update(&mut self, offset: u8, entry: ScheduleEntry) -> bool {
        let Some(index) = self.index(offset) else {
            return false;
        };

        let entry = ScheduleEntry {
            target_offset: offset,
            ..entry
        };
        if !self.devices[index].config.schedules.update(entry) {
            log::debug!("Schedule {} rejected for device {}", entry.id, offset);
            return false;
        }
        self.persist(index);
        true
    }

    pub fn schedule_remove(&mut self, offset: u8, id: u8) -> bool {
        let Some(index) = self.index(offset) else {
            return false;
        };
        if !self.devices[index].config.schedules.remove(id) {
            return false;
        }
        self.persist(index);
        true
    }

    pub fn schedule_remove_all(&mut self, offset: u8) -> bool {
        let Some(index) = self.index(offset) else {
            return false;
        };
        self.devices[index].config.schedules.clear();
        self.persist(index);
        true
    }

    /// Snapshot of every slot.
    pub fn status(&self) -> StatusReport {
        self.devices.iter().map(Device::record).collect()
    }

    pub fn take_event(&mut self) -> Option<StatusEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    fn notify(&mut self, record: DeviceRecord) {
        if self.events.push_back(StatusEvent { record }).is_err() {
            log::warn!("Status queue full, dropping event for device {}", record.offset);
        }
    }

    fn persist(&mut self, index: usize) {
        let device = &self.devices[index];
        if let Err(e) = save_config(&mut self.store, device.offset, &device.config) {
            log::warn!("Failed to persist config of device {}: {}", device.offset, e);
        }
    }
}
