pub mod datagram;
pub mod pubsub;

pub use datagram::DatagramBinding;
pub use pubsub::PubSubBinding;

use alloc::string::String;
use alloc::vec::Vec;

use wdm_api::StatusReport;
use wdm_api::frame::Inbound;

/// Credentials presented to the broker.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Broker session carrying raw topic payloads.
pub trait PubSubTransport {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> bool;

    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;

    fn subscribe(&mut self, topic: &str) -> bool;

    /// Next inbound message, without blocking.
    fn poll(&mut self) -> Option<Message>;
}

/// Unreliable datagram socket.
pub trait DatagramTransport {
    fn send(&mut self, host: &str, port: u16, data: &[u8]) -> bool;

    /// Copies the next pending datagram into `buffer`, without blocking.
    fn poll_receive(&mut self, buffer: &mut [u8]) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Link came up during this call
    JustConnected,
    Connected,
    Down,
}

/// Outcome of a single STATUS transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport, no acknowledgement expected
    Sent,
    /// Acknowledged after this many receive polls
    Acknowledged { attempts: u32 },
    /// Sent but never acknowledged within the poll budget
    Unacknowledged,
    SendFailed,
}

/// Carries frames between the node and its server.
///
/// Inbound frames are decoded here and handed to `handler` in arrival
/// order. The handler runs synchronously inside the call.
pub trait Binding {
    /// Keeps the link up and drains pending inbound frames.
    fn maintain(&mut self, handler: &mut dyn FnMut(Inbound)) -> LinkState;

    fn publish_status(
        &mut self,
        report: &StatusReport,
        handler: &mut dyn FnMut(Inbound),
    ) -> Delivery;

    /// Asks the server for the current time.
    fn request_time(&mut self, _now: u32) -> bool {
        false
    }
}
