#![no_std]

extern crate alloc;

pub mod clock;
pub mod config;
pub mod error;
pub mod hal;
pub mod node;
pub mod registry;
pub mod scheduler;
pub mod storage;
pub mod transport;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use hal::*;
pub use node::*;
pub use registry::*;
pub use scheduler::*;
pub use storage::*;
