//! Tiny-CAN Adapter Layer for Rust
//!
//! This crate wraps the native Tiny-CAN driver API (MHS Elektronik) used to
//! talk to Tiny-CAN USB-to-CAN adapters. It translates native return codes
//! into typed errors, decodes the driver's adapter list and message records,
//! and manages channel lifecycles and receive callbacks.
//!
//! The driver library itself is supplied by the caller as an implementation
//! of [`NativeDriver`].
//!
//! # Features
//!
//! - Adapter enumeration and lookup by serial number
//! - Classic CAN frames (standard and extended identifiers, remote requests)
//! - Polled reads or event-driven receive handlers
//! - Typed driver errors carrying the raw return code
//! - Device status monitoring
//!
//! # Example
//!
//! ```no_run
//! use tiny_can::{AdapterRegistry, Bitrate, Frame, HandlerResult, NativeDriver, TinyCanError};
//!
//! fn run<D: NativeDriver + 'static>(driver: D) -> tiny_can::Result<()> {
//!     let registry = AdapterRegistry::new(driver)?;
//!
//!     let adapters = registry.scan()?;
//!     let Some(adapter) = adapters.first() else {
//!         println!("No Tiny-CAN adapter found");
//!         return Ok(());
//!     };
//!
//!     let channel = registry.open_channel(adapter, Bitrate::Kbps250)?;
//!
//!     // Send a frame
//!     let frame = Frame::new(0x123, &[0x12, 0x34, 0x56, 0x78])?;
//!     channel.write(&frame)?;
//!
//!     println!("{}", channel.get_status()?);
//!
//!     // Poll the receive queue
//!     loop {
//!         match channel.read() {
//!             Ok(frame) => println!("RX  {}", frame),
//!             Err(TinyCanError::NoMessage) => break,
//!             Err(e) => return Err(e),
//!         }
//!     }
//!
//!     // Or have frames delivered as they arrive
//!     channel.set_receive_handler(Some(Box::new(|frame: &Frame| -> HandlerResult {
//!         println!("RX  {}", frame);
//!         Ok(())
//!     })));
//!
//!     channel.close()
//! }
//! ```

pub mod adapter;
pub mod channel;
pub mod constants;
pub mod driver;
pub mod error;
pub mod frame;
pub mod index;
pub mod registry;
pub mod structures;

#[cfg(test)]
mod mock;

// Re-export main types at crate root
pub use constants::{
    // Clear commands
    CAN_CMD_ALL_CLEAR,
    CAN_CMD_HW_FILTER_CLEAR,
    CAN_CMD_NONE,
    CAN_CMD_RXD_FIFOS_CLEAR,
    CAN_CMD_RXD_OVERRUN_CLEAR,
    CAN_CMD_SW_FILTER_CLEAR,
    CAN_CMD_TXD_FIFOS_CLEAR,
    CAN_CMD_TXD_OVERRUN_CLEAR,
    CAN_CMD_TXD_PUFFERS_CLEAR,
    // Limits
    CAN_MAX_DLEN,
    INDEX_INVALID,
};

pub use adapter::{Adapter, AdapterCore, ModuleFeatures};
pub use channel::{Channel, ChannelState, FrameHandler, HandlerResult};
pub use driver::{NativeDriver, RawDeviceList, RxEventCallback};
pub use error::{DriverErrorKind, Result, TinyCanError};
pub use frame::{Frame, RawCanMsg, RawTime, WireFlags};
pub use index::Index;
pub use registry::AdapterRegistry;
pub use structures::{Bitrate, DeviceListFilter, EventMask, OperatingMode, RawDeviceStatus, Status};
