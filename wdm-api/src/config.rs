//! CONFIG payload: a JSON object describing one device.
//!
//! ```text
//! {"offset": 1, "en": 1, "name": "relay", "disp": "Porch light",
//!  "sch": [[id, enable, days, time, cmd], ...]}
//! ```

use alloc::string::ToString;
use alloc::vec::Vec;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::models::{DayMask, DeviceConfig, ScheduleEntry};

/// `[id, enable, days, time, cmd]`
type ScheduleTuple = (u8, u8, u8, u16, u8);

#[derive(Debug, Serialize, Deserialize)]
struct ConfigPayload {
    offset: u8,
    #[serde(default = "enabled_by_default")]
    en: u8,
    #[serde(default)]
    name: String<32>,
    #[serde(default)]
    disp: String<32>,
    #[serde(default)]
    sch: Vec<ScheduleTuple>,
}

fn enabled_by_default() -> u8 {
    1
}

/// Parses a CONFIG payload into the target offset and its configuration.
///
/// Schedule rows are inserted with [`ScheduleList::update`](crate::ScheduleList::update),
/// so rows with id 0 and rows past the list capacity are dropped.
pub fn parse_config(payload: &[u8]) -> Result<(u8, DeviceConfig)> {
    let parsed: ConfigPayload = serde_json::from_slice(payload)
        .map_err(|e| FrameError::InvalidConfig(e.to_string()))?;

    let mut config = DeviceConfig {
        enabled: parsed.en != 0,
        name: parsed.name,
        display: parsed.disp,
        ..Default::default()
    };

    for (id, enable, days, time, cmd) in parsed.sch {
        let entry = ScheduleEntry::new(id, parsed.offset, DayMask(days), time, cmd)
            .with_enabled(enable != 0);
        config.schedules.update(entry);
    }

    Ok((parsed.offset, config))
}

/// Renders a configuration back into the CONFIG payload form.
pub fn render_config(offset: u8, config: &DeviceConfig) -> Result<Vec<u8>> {
    let payload = ConfigPayload {
        offset,
        en: config.enabled as u8,
        name: config.name.clone(),
        disp: config.display.clone(),
        sch: config
            .schedules
            .iter()
            .map(|e| (e.id, e.enabled as u8, e.days.0, e.time_of_day, e.command))
            .collect(),
    };

    serde_json::to_vec(&payload).map_err(|e| FrameError::InvalidConfig(e.to_string()))
}
