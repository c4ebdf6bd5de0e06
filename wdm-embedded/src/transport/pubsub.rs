use alloc::string::String;

use embedded_hal::delay::DelayNs;
use wdm_api::frame::{self, Inbound, Outbound};
use wdm_api::{NodeId, StatusReport};

use super::{Binding, ConnectOptions, Delivery, LinkState, Message, PubSubTransport};
use crate::config::PubSubConfig;

/// Frames over a persistent broker session.
pub struct PubSubBinding<T: PubSubTransport, D: DelayNs> {
    transport: T,
    delay: D,
    node_id: NodeId,
    config: PubSubConfig,
    inbound_topic: String,
    outbound_topic: String,
    client_id: String,
    username: String,
    /// Session up and inbound topic subscribed
    subscribed: bool,
}

impl<T: PubSubTransport, D: DelayNs> PubSubBinding<T, D> {
    pub fn new(transport: T, delay: D, node_id: NodeId, config: PubSubConfig) -> Self {
        Self {
            inbound_topic: config.inbound_topic(&node_id),
            outbound_topic: config.outbound_topic(&node_id),
            client_id: config.client_id(&node_id),
            username: config.username(&node_id),
            transport,
            delay,
            node_id,
            config,
            subscribed: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn inbound_topic(&self) -> &str {
        &self.inbound_topic
    }

    pub fn outbound_topic(&self) -> &str {
        &self.outbound_topic
    }

    fn reconnect(&mut self) -> bool {
        let options = ConnectOptions {
            client_id: &self.client_id,
            username: &self.username,
            password: &self.config.security,
        };

        // A session whose subscribe failed is kept and only resubscribed
        if !self.transport.is_connected() && !self.transport.connect(&options) {
            log::warn!("Broker connection failed, retrying in {} ms", self.config.reconnect_delay_ms);
            return false;
        }
        if !self.transport.subscribe(&self.inbound_topic) {
            log::warn!("Subscribe to {} failed", self.inbound_topic);
            return false;
        }

        log::info!("Connected as {}, listening on {}", self.client_id, self.inbound_topic);
        true
    }

    fn drain(&mut self, handler: &mut dyn FnMut(Inbound)) {
        while let Some(message) = self.transport.poll() {
            self.dispatch(message, handler);
        }
    }

    fn dispatch(&self, message: Message, handler: &mut dyn FnMut(Inbound)) {
        if message.topic != self.inbound_topic {
            log::debug!("Ignoring message on {}", message.topic);
            return;
        }

        match frame::decode_inbound(&message.payload, &self.node_id) {
            Ok(inbound) => {
                log::debug!("Received {}", inbound.opcode().name());
                handler(inbound);
            }
            Err(e) => log::warn!("Discarding frame: {}", e),
        }
    }

    fn publish(&mut self, message: &Outbound) -> bool {
        if !self.transport.is_connected() {
            return false;
        }
        let bytes = frame::encode_outbound(&self.node_id, message, self.config.record_format);
        log::debug!("Publishing {} ({} bytes)", message.opcode().name(), bytes.len());
        self.transport.publish(&self.outbound_topic, &bytes)
    }
}

impl<T: PubSubTransport, D: DelayNs> Binding for PubSubBinding<T, D> {
    fn maintain(&mut self, handler: &mut dyn FnMut(Inbound)) -> LinkState {
        if self.subscribed && self.transport.is_connected() {
            self.drain(handler);
            return LinkState::Connected;
        }

        if self.subscribed {
            log::warn!("Broker session lost");
            self.subscribed = false;
        }

        if !self.reconnect() {
            self.delay.delay_ms(self.config.reconnect_delay_ms);
            return LinkState::Down;
        }

        self.subscribed = true;
        self.drain(handler);
        LinkState::JustConnected
    }

    fn publish_status(
        &mut self,
        report: &StatusReport,
        _handler: &mut dyn FnMut(Inbound),
    ) -> Delivery {
        if self.publish(&Outbound::Status(report.clone())) {
            Delivery::Sent
        } else {
            log::warn!("STATUS for {} devices not published", report.len());
            Delivery::SendFailed
        }
    }

    fn request_time(&mut self, now: u32) -> bool {
        self.publish(&Outbound::TimeRequest { now })
    }
}
