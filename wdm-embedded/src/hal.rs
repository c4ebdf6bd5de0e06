use embedded_hal::digital::OutputPin;
use heapless::Vec;
use wdm_api::{DeviceKind, MAX_DEVICES, NodeId};

/// Stable hardware address of the node.
pub trait IdentityProvider {
    fn node_id(&self) -> NodeId;
}

impl IdentityProvider for NodeId {
    fn node_id(&self) -> NodeId {
        *self
    }
}

/// Physical side effect of a device value change.
pub trait DeviceHal {
    fn apply(&mut self, offset: u8, kind: DeviceKind, value: i32);
}

/// For nodes without outputs.
#[derive(Debug, Default)]
pub struct NoopHal;

impl DeviceHal for NoopHal {
    fn apply(&mut self, _offset: u8, _kind: DeviceKind, _value: i32) {}
}

/// Drives one output pin per actuator slot.
pub struct PinOutputs<P: OutputPin> {
    pins: Vec<(u8, P), MAX_DEVICES>,
    active_low: bool,
}

impl<P: OutputPin> PinOutputs<P> {
    pub fn new(active_low: bool) -> Self {
        Self {
            pins: Vec::new(),
            active_low,
        }
    }

    /// Binds `pin` to a device slot. Gives the pin back when the table is full.
    pub fn bind(&mut self, offset: u8, pin: P) -> Result<(), P> {
        self.pins.push((offset, pin)).map_err(|(_, pin)| pin)
    }

    pub fn pin(&self, offset: u8) -> Option<&P> {
        self.pins.iter().find(|(o, _)| *o == offset).map(|(_, p)| p)
    }
}

impl<P: OutputPin> DeviceHal for PinOutputs<P> {
    fn apply(&mut self, offset: u8, kind: DeviceKind, value: i32) {
        if !kind.is_actuator() {
            return;
        }
        let Some((_, pin)) = self.pins.iter_mut().find(|(o, _)| *o == offset) else {
            return;
        };

        let high = (value != 0) != self.active_low;
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            log::warn!("Failed to drive output {}: {:?}", offset, e);
        }
    }
}
