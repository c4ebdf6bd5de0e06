use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use wdm_api::DeviceConfig;

use crate::{Error, Result};

/// Opaque key/value persistence.
pub trait SettingsStore {
    fn load(&self, key: &str) -> Option<Vec<u8>>;

    fn save(&mut self, key: &str, data: &[u8]) -> bool;
}

impl<T: SettingsStore + ?Sized> SettingsStore for &mut T {
    fn load(&self, key: &str) -> Option<Vec<u8>> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, data: &[u8]) -> bool {
        (**self).save(key, data)
    }
}

pub struct MemoryStore {
    data: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn save(&mut self, key: &str, data: &[u8]) -> bool {
        self.data.insert(key.to_string(), data.to_vec());
        true
    }
}

pub fn config_key(offset: u8) -> String {
    format!("/device-{}.cfg", offset)
}

/// Reads the stored configuration of a device, if any.
pub fn load_config<S: SettingsStore + ?Sized>(store: &S, offset: u8) -> Result<Option<DeviceConfig>> {
    match store.load(&config_key(offset)) {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

pub fn save_config<S: SettingsStore + ?Sized>(
    store: &mut S,
    offset: u8,
    config: &DeviceConfig,
) -> Result<()> {
    let bytes = postcard::to_allocvec(config)?;
    if store.save(&config_key(offset), &bytes) {
        Ok(())
    } else {
        Err(Error::StorageError)
    }
}

#[cfg(test)]
mod tests {
    use wdm_api::{DayMask, ScheduleEntry};

    use super::*;

    #[test]
    fn test_config_round_trip() {
        let mut store = MemoryStore::new();
        let mut config = DeviceConfig::default();
        config.enabled = false;
        let _ = config.name.push_str("porch");
        config
            .schedules
            .update(ScheduleEntry::new(3, 2, DayMask::WEEKEND, 600, 1));

        save_config(&mut store, 2, &config).unwrap();
        assert!(store.contains("/device-2.cfg"));
        assert_eq!(load_config(&store, 2).unwrap(), Some(config));
        assert_eq!(load_config(&store, 3).unwrap(), None);
    }

    #[test]
    fn test_corrupt_blob_is_an_error() {
        let mut store = MemoryStore::new();
        store.save(&config_key(1), &[0xff, 0xff, 0xff]);
        assert_eq!(load_config(&store, 1), Err(Error::SerializationError));
    }
}
