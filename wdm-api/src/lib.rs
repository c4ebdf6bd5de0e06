#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod codec;
pub mod config;
pub mod datagram;
pub mod error;
pub mod frame;
pub mod models;

pub use error::{FrameError, Result};
pub use models::*;
