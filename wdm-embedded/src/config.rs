use alloc::format;
use alloc::string::String;

use heapless::Vec;
use wdm_api::frame::RecordFormat;
use wdm_api::{DeviceKind, MAX_DEVICES, MINUTES_PER_DAY, NodeId};

/// UTC+7
pub const DEFAULT_TIMEZONE_MINUTES: i16 = 420;

pub const DEFAULT_HEARTBEAT_TICKS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Device kinds in slot order, slot 1 first
    pub devices: Vec<DeviceKind, MAX_DEVICES>,
    /// Offset added to TIME_SET UTC seconds, in minutes
    pub timezone_minutes: i16,
    /// Full STATUS is republished every this many ticks, 0 disables it
    pub heartbeat_ticks: u32,
}

impl NodeConfig {
    pub fn with_devices(kinds: &[DeviceKind]) -> Self {
        let mut devices = Vec::new();
        for kind in kinds.iter().take(MAX_DEVICES) {
            let _ = devices.push(*kind);
        }
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Timezone in minutes, falling back to the default when out of range.
    pub fn timezone(&self) -> i32 {
        let limit = MINUTES_PER_DAY as i16;
        if (-limit..=limit).contains(&self.timezone_minutes) {
            self.timezone_minutes as i32
        } else {
            log::warn!(
                "Timezone {} out of range, using {}",
                self.timezone_minutes,
                DEFAULT_TIMEZONE_MINUTES
            );
            DEFAULT_TIMEZONE_MINUTES as i32
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut devices = Vec::new();
        let _ = devices.push(DeviceKind::OnOff);
        Self {
            devices,
            timezone_minutes: DEFAULT_TIMEZONE_MINUTES,
            heartbeat_ticks: DEFAULT_HEARTBEAT_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    pub topic_prefix: String,
    /// Broker password
    pub security: String,
    pub reconnect_delay_ms: u32,
    pub record_format: RecordFormat,
}

impl PubSubConfig {
    /// Topic the node subscribes to for server frames.
    pub fn inbound_topic(&self, node_id: &NodeId) -> String {
        format!("{}/sub/{}", self.topic_prefix, node_id)
    }

    /// Topic the node publishes its frames on.
    pub fn outbound_topic(&self, node_id: &NodeId) -> String {
        format!("{}/pub/{}", self.topic_prefix, node_id)
    }

    pub fn client_id(&self, node_id: &NodeId) -> String {
        format!("wdm-{}", node_id)
    }

    pub fn username(&self, node_id: &NodeId) -> String {
        format!("wdm-user-{}", node_id)
    }
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            topic_prefix: String::from("wdm/dev"),
            security: String::new(),
            reconnect_delay_ms: 1000,
            record_format: RecordFormat::Extended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatagramConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Receive polls made while waiting for an acknowledgement
    pub ack_attempts: u32,
    /// Delay between two polls
    pub ack_delay_ms: u32,
}

impl Default for DatagramConfig {
    fn default() -> Self {
        Self {
            server_host: String::from("127.0.0.1"),
            server_port: 5683,
            ack_attempts: 20,
            ack_delay_ms: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_fallback() {
        let mut config = NodeConfig::default();
        assert_eq!(config.timezone(), 420);

        config.timezone_minutes = -1440;
        assert_eq!(config.timezone(), -1440);

        config.timezone_minutes = 1441;
        assert_eq!(config.timezone(), DEFAULT_TIMEZONE_MINUTES as i32);
    }

    #[test]
    fn test_topics() {
        let node = NodeId([0x18, 0xfe, 0x34, 0xa1, 0xb2, 0xc3]);
        let config = PubSubConfig::default();
        assert_eq!(config.inbound_topic(&node), "wdm/dev/sub/18fe34a1b2c3");
        assert_eq!(config.outbound_topic(&node), "wdm/dev/pub/18fe34a1b2c3");
        assert_eq!(config.username(&node), "wdm-user-18fe34a1b2c3");
    }

    #[test]
    fn test_device_table_is_bounded() {
        let kinds = [DeviceKind::Temperature; MAX_DEVICES + 3];
        assert_eq!(NodeConfig::with_devices(&kinds).devices.len(), MAX_DEVICES);
    }
}
