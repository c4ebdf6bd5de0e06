use core::ops::BitOr;

use heapless::String;
use serde::{Deserialize, Serialize};

use super::{DEVICE_SCHEDULE_CNT, MINUTES_PER_DAY};

/// Weekday bitmask, bit 0 = Monday through bit 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DayMask(pub u8);

impl DayMask {
    pub const NONE: Self = Self(0x00);
    pub const MONDAY: Self = Self(0x01);
    pub const TUESDAY: Self = Self(0x02);
    pub const WEDNESDAY: Self = Self(0x04);
    pub const THURSDAY: Self = Self(0x08);
    pub const FRIDAY: Self = Self(0x10);
    pub const SATURDAY: Self = Self(0x20);
    pub const SUNDAY: Self = Self(0x40);
    pub const WEEKDAYS: Self = Self(0x1f);
    pub const WEEKEND: Self = Self(0x60);
    pub const ALL: Self = Self(0x7f);

    /// `weekday` is 0 for Monday up to 6 for Sunday.
    pub fn contains(self, weekday: u8) -> bool {
        weekday < 7 && self.0 & (1 << weekday) != 0
    }
}

impl BitOr for DayMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One day/time-triggered command. `id == 0` marks an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: u8,
    pub target_offset: u8,
    pub enabled: bool,
    pub days: DayMask,
    /// Minute of the local day, 0..=1439
    pub time_of_day: u16,
    pub command: u8,
    pub in_use: bool,
}

impl ScheduleEntry {
    pub fn new(id: u8, target_offset: u8, days: DayMask, time_of_day: u16, command: u8) -> Self {
        Self {
            id,
            target_offset,
            enabled: true,
            days,
            time_of_day,
            command,
            in_use: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.id != 0 && self.time_of_day < MINUTES_PER_DAY
    }

    /// True when this entry should fire at the given weekday and minute.
    pub fn is_due(&self, weekday: u8, minute_of_day: u16) -> bool {
        self.in_use
            && self.enabled
            && self.id != 0
            && self.days.contains(weekday)
            && self.time_of_day == minute_of_day
    }
}

/// Fixed-capacity schedule arena. Removal clears `in_use` instead of compacting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleList {
    entries: [ScheduleEntry; DEVICE_SCHEDULE_CNT],
}

impl ScheduleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn capacity(&self) -> usize {
        DEVICE_SCHEDULE_CNT
    }

    /// Number of in-use entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.in_use).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == DEVICE_SCHEDULE_CNT
    }

    /// Replaces the in-use entry with the same id, else takes the first free
    /// slot. Returns false (list untouched) when the entry is invalid or the
    /// list is full.
    pub fn update(&mut self, entry: ScheduleEntry) -> bool {
        if !entry.is_valid() {
            return false;
        }

        let slot = self
            .entries
            .iter()
            .position(|e| e.in_use && e.id == entry.id)
            .or_else(|| self.entries.iter().position(|e| !e.in_use));

        match slot {
            Some(index) => {
                self.entries[index] = ScheduleEntry {
                    in_use: true,
                    ..entry
                };
                true
            }
            None => false,
        }
    }

    /// Tombstones the in-use entry with `id`.
    pub fn remove(&mut self, id: u8) -> bool {
        match self.entries.iter_mut().find(|e| e.in_use && e.id == id) {
            Some(entry) => {
                entry.in_use = false;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.in_use = false;
        }
    }

    pub fn get(&self, id: u8) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.in_use && e.id == id)
    }

    /// In-use entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.in_use)
    }

    /// Raw slots including tombstones
    pub fn slots(&self) -> &[ScheduleEntry] {
        &self.entries
    }
}

/// Per-device configuration pushed by the server and persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub enabled: bool,
    pub name: String<32>,
    pub display: String<32>,
    pub schedules: ScheduleList,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: String::new(),
            display: String::new(),
            schedules: ScheduleList::new(),
        }
    }
}
