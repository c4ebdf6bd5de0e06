use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use wdm_embedded::transport::DatagramTransport;

use crate::errors::{HostError, Result};

/// Non-blocking UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn bind(address: &str) -> Result<Self> {
        let address: SocketAddr = address
            .parse()
            .map_err(|_| HostError::InvalidAddress(address.to_string()))?;
        let socket = UdpSocket::bind(address)?;
        socket.set_nonblocking(true)?;

        tracing::info!("UDP socket bound to {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl DatagramTransport for UdpTransport {
    fn send(&mut self, host: &str, port: u16, data: &[u8]) -> bool {
        match self.socket.send_to(data, (host, port)) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Send to {}:{} failed: {}", host, port, e);
                false
            }
        }
    }

    fn poll_receive(&mut self, buffer: &mut [u8]) -> Option<usize> {
        match self.socket.recv_from(buffer) {
            Ok((len, from)) => {
                tracing::trace!("{} bytes from {}", len, from);
                Some(len)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                tracing::warn!("Receive failed: {}", e);
                None
            }
        }
    }
}
