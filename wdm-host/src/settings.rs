use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use wdm_api::frame::RecordFormat;
use wdm_api::{DeviceKind, NodeId};
use wdm_embedded::{DatagramConfig, NodeConfig, PubSubConfig};

use crate::errors::{HostError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Hardware address as 12 hex digits, separators allowed
    pub id: String,
    pub timezone_minutes: i16,
    pub heartbeat_ticks: u32,
    /// Start the clock from the host time instead of waiting for TIME_SET
    #[serde(default)]
    pub seed_clock: bool,
    pub devices: Vec<DeviceKind>,
}

impl NodeSettings {
    pub fn node_id(&self) -> Result<NodeId> {
        let digits: String = self
            .id
            .chars()
            .filter(|c| !matches!(c, ':' | '-'))
            .collect();
        if digits.len() != NodeId::SIZE * 2 || !digits.is_ascii() {
            return Err(HostError::InvalidNodeId(self.id.clone()));
        }

        let mut bytes = [0u8; NodeId::SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| HostError::InvalidNodeId(self.id.clone()))?;
        }
        Ok(NodeId(bytes))
    }

    pub fn to_config(&self) -> NodeConfig {
        NodeConfig {
            timezone_minutes: self.timezone_minutes,
            heartbeat_ticks: self.heartbeat_ticks,
            ..NodeConfig::with_devices(&self.devices)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Mqtt,
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub topic_prefix: String,
    pub security: String,
    pub reconnect_delay_ms: u32,
    #[serde(default)]
    pub short_records: bool,
}

impl MqttSettings {
    pub fn to_config(&self) -> PubSubConfig {
        PubSubConfig {
            topic_prefix: self.topic_prefix.clone(),
            security: self.security.clone(),
            reconnect_delay_ms: self.reconnect_delay_ms,
            record_format: if self.short_records {
                RecordFormat::Short
            } else {
                RecordFormat::Extended
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpSettings {
    pub bind: String,
    pub server_host: String,
    pub server_port: u16,
    pub ack_attempts: u32,
    pub ack_delay_ms: u32,
}

impl UdpSettings {
    pub fn to_config(&self) -> DatagramConfig {
        DatagramConfig {
            server_host: self.server_host.clone(),
            server_port: self.server_port,
            ack_attempts: self.ack_attempts,
            ack_delay_ms: self.ack_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub kind: TransportKind,
    pub mqtt: MqttSettings,
    pub udp: UdpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub node: NodeSettings,
    pub transport: Transport,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("WDM").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const DEFAULTS: &str = include_str!("../../configs/default.toml");

    fn parse(overrides: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse("");
        assert_eq!(settings.transport.kind, TransportKind::Mqtt);
        assert_eq!(settings.node.devices, [DeviceKind::OnOff, DeviceKind::Temperature]);

        let config = settings.node.to_config();
        assert_eq!(config.timezone_minutes, 420);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(settings.transport.udp.to_config().ack_attempts, 20);
    }

    #[test]
    fn test_override() {
        let settings = parse("[transport]\nkind = \"udp\"\n[transport.mqtt]\nshort_records = true\n");
        assert_eq!(settings.transport.kind, TransportKind::Udp);
        assert_eq!(settings.transport.mqtt.to_config().record_format, RecordFormat::Short);
    }

    #[test]
    fn test_node_id() {
        let mut node = parse("").node;
        node.id = "18:FE:34:00:00:2a".into();
        assert_eq!(node.node_id().unwrap(), NodeId([0x18, 0xfe, 0x34, 0, 0, 0x2a]));

        node.id = "18fe34".into();
        assert!(node.node_id().is_err());
        node.id = "zzfe34000000".into();
        assert!(node.node_id().is_err());
    }
}
