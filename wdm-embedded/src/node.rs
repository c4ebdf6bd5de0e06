use wdm_api::frame::Inbound;
use wdm_api::{DeviceConfig, NodeId, StatusReport};

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::hal::{DeviceHal, IdentityProvider};
use crate::registry::Registry;
use crate::scheduler::{MinuteGate, Scheduler};
use crate::storage::SettingsStore;
use crate::transport::{Binding, Delivery, LinkState};
use crate::Result;

/// Cooperative driver owning all node state.
///
/// Call [`Node::tick`] once per second. Inbound frames, schedules and
/// status notifications are all processed inside that call.
pub struct Node<C: Clock, S: SettingsStore, H: DeviceHal, B: Binding> {
    node_id: NodeId,
    config: NodeConfig,
    clock: C,
    registry: Registry<S, H>,
    binding: B,
    gate: MinuteGate,
    ticks: u32,
}

impl<C: Clock, S: SettingsStore, H: DeviceHal, B: Binding> Node<C, S, H, B> {
    pub fn new(
        identity: &impl IdentityProvider,
        config: NodeConfig,
        clock: C,
        store: S,
        hal: H,
        binding: B,
    ) -> Self {
        let registry = Registry::new(&config.devices, store, hal);
        Self {
            node_id: identity.node_id(),
            config,
            clock,
            registry,
            binding,
            gate: MinuteGate::new(),
            ticks: 0,
        }
    }

    pub fn init(&mut self) {
        self.registry.init();
        log::info!("Node {} ready", self.node_id);
    }

    pub fn tick(&mut self) {
        self.clock.tick();

        let timezone = self.config.timezone();
        let link = {
            let Self {
                clock,
                registry,
                binding,
                ..
            } = self;
            binding.maintain(&mut |frame: Inbound| apply_inbound(clock, registry, timezone, frame))
        };

        if link == LinkState::JustConnected {
            self.publish_all();
            if !self.clock.is_set() {
                self.binding.request_time(self.clock.now_unix());
            }
        }

        let now = self.clock.now_unix();
        if self.clock.is_set() && self.gate.poll(now) {
            let weekday = self.clock.weekday();
            let minute = self.clock.minute_of_day();
            Scheduler::run(&mut self.registry, weekday, minute, now);
        }

        while let Some(event) = self.registry.take_event() {
            self.publish(&StatusReport::single(event.record));
        }

        self.ticks = self.ticks.wrapping_add(1);
        if self.config.heartbeat_ticks > 0 && self.ticks % self.config.heartbeat_ticks == 0 {
            log::debug!("Heartbeat");
            self.publish_all();
        }
    }

    /// Publishes the state of every device.
    pub fn publish_all(&mut self) -> Delivery {
        let report = self.registry.status();
        self.publish(&report)
    }

    fn publish(&mut self, report: &StatusReport) -> Delivery {
        let timezone = self.config.timezone();
        let Self {
            clock,
            registry,
            binding,
            ..
        } = self;
        binding.publish_status(report, &mut |frame: Inbound| {
            apply_inbound(clock, registry, timezone, frame)
        })
    }

    pub fn control(&mut self, offset: u8, command: i32) -> bool {
        let now = self.clock.now_unix();
        self.registry.control(offset, command, now)
    }

    pub fn toggle(&mut self, offset: u8) -> Result<bool> {
        let now = self.clock.now_unix();
        self.registry.toggle(offset, now)
    }

    pub fn config(&mut self, offset: u8, config: DeviceConfig) -> bool {
        self.registry.config(offset, config)
    }

    pub fn status(&self) -> StatusReport {
        self.registry.status()
    }

    pub fn count(&self) -> usize {
        self.registry.count()
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn registry(&self) -> &Registry<S, H> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<S, H> {
        &mut self.registry
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }
}

fn apply_inbound<C: Clock, S: SettingsStore, H: DeviceHal>(
    clock: &mut C,
    registry: &mut Registry<S, H>,
    timezone: i32,
    frame: Inbound,
) {
    match frame {
        Inbound::TimeSet { utc } => {
            let local = (utc as i64 + timezone as i64 * 60).clamp(0, u32::MAX as i64);
            clock.set_local_unix(local as u32);
        }
        Inbound::Config { offset, config } => {
            registry.config(offset, config);
        }
        Inbound::Command { offset, command } => {
            let now = clock.now_unix();
            registry.control(offset, command as i32, now);
        }
    }
}
