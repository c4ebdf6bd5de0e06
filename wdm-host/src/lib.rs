use std::thread;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use wdm_embedded::transport::{Binding, DatagramBinding, PubSubBinding};
use wdm_embedded::{Clock, Node, SoftClock};

use crate::errors::Result;
use crate::hal::{LogOutputs, StdDelay};
use crate::mqtt::MqttTransport;
use crate::settings::{NodeSettings, Settings, TransportKind};
use crate::store::FileStore;
use crate::udp::UdpTransport;

pub mod errors;
pub mod hal;
pub mod mqtt;
pub mod settings;
pub mod store;
pub mod udp;

pub type HostNode<B> = Node<SoftClock, FileStore, LogOutputs, B>;

const TICK: Duration = Duration::from_secs(1);

/// Builds the node described by `settings` and drives it forever.
pub fn run(settings: &Settings) -> Result<()> {
    let node_id = settings.node.node_id()?;
    let store = FileStore::new(&settings.storage.path)?;
    let clock = initial_clock(&settings.node);

    tracing::info!(
        "Starting node {} with {} devices over {:?}",
        node_id,
        settings.node.devices.len(),
        settings.transport.kind
    );

    match settings.transport.kind {
        TransportKind::Mqtt => {
            let mqtt = &settings.transport.mqtt;
            let transport = MqttTransport::new(&mqtt.host, mqtt.port);
            let binding = PubSubBinding::new(transport, StdDelay, node_id, mqtt.to_config());
            let node = Node::new(&node_id, settings.node.to_config(), clock, store, LogOutputs, binding);
            drive(node, None);
        }
        TransportKind::Udp => {
            let udp = &settings.transport.udp;
            let transport = UdpTransport::bind(&udp.bind)?;
            let binding = DatagramBinding::new(transport, StdDelay, node_id, udp.to_config());
            let node = Node::new(&node_id, settings.node.to_config(), clock, store, LogOutputs, binding);
            drive(node, None);
        }
    }

    Ok(())
}

fn initial_clock(node: &NodeSettings) -> SoftClock {
    if !node.seed_clock {
        return SoftClock::new();
    }
    let local = OffsetDateTime::now_utc().unix_timestamp() + node.to_config().timezone() as i64 * 60;
    SoftClock::starting_at(local.clamp(0, u32::MAX as i64) as u32)
}

/// Ticks `node` once per second, `ticks` times or forever.
pub fn drive<B: Binding>(mut node: HostNode<B>, ticks: Option<u64>) -> HostNode<B> {
    node.init();

    let mut next = Instant::now();
    let mut count = 0u64;
    while ticks.is_none_or(|limit| count < limit) {
        node.tick();
        count += 1;

        next += TICK;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            tracing::debug!("Tick overran by {:?}", now - next);
            next = now;
        }
    }

    tracing::info!("Stopped after {} ticks at {}", count, node.clock().now_unix());
    node
}
