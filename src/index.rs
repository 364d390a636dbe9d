//! Packed buffer/filter address
//!
//! The driver addresses every buffer and filter through a 32-bit index:
//!
//! ```text
//!  31      26  25    24    23..20   19..16   15 ........ 0
//! ┌─────────┬─────┬─────┬────────┬─────────┬─────────────┐
//! │ unused  │soft │ TxD │ device │ channel │  sub index  │
//! └─────────┴─────┴─────┴────────┴─────────┴─────────────┘
//! ```
//!
//! Device and channel are reserved by the driver and currently always 0.

use std::fmt;

/// Software filter flag
pub const INDEX_SOFT_FLAG: u32 = 1 << 25;
/// Transmit buffer flag
pub const INDEX_TXD_FLAG: u32 = 1 << 24;
/// Device id shift
pub const INDEX_DEVICE_SHIFT: u32 = 20;
/// Channel id shift
pub const INDEX_CHANNEL_SHIFT: u32 = 16;
/// Mask for the 4-bit device and channel fields (before shifting)
pub const INDEX_NIBBLE_MASK: u32 = 0xF;
/// Sub index mask
pub const INDEX_SUB_INDEX_MASK: u32 = 0xFFFF;

/// Address of a buffer or filter on a device channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index {
    /// True for a software filter, false for a hardware filter
    pub is_soft: bool,
    /// True for a transmit buffer, false for a receive buffer
    pub is_tx: bool,
    /// Device id (4 bits)
    pub device: u8,
    /// Channel id (4 bits)
    pub channel: u8,
    /// Buffer index on the device channel
    pub sub_index: u16,
}

impl Index {
    /// Create a new index. Device and channel are truncated to 4 bits.
    pub fn new(is_soft: bool, is_tx: bool, device: u8, channel: u8, sub_index: u16) -> Self {
        Self {
            is_soft,
            is_tx,
            device: device & INDEX_NIBBLE_MASK as u8,
            channel: channel & INDEX_NIBBLE_MASK as u8,
            sub_index,
        }
    }

    /// Index of the hardware receive buffer 0 on device 0, channel 0
    pub fn receive_default() -> Self {
        Self::new(false, false, 0, 0, 0)
    }

    /// Pack into the native 32-bit representation
    pub fn encode(&self) -> u32 {
        let mut value = 0;
        if self.is_soft {
            value |= INDEX_SOFT_FLAG;
        }
        if self.is_tx {
            value |= INDEX_TXD_FLAG;
        }
        value |= (u32::from(self.device) & INDEX_NIBBLE_MASK) << INDEX_DEVICE_SHIFT;
        value |= (u32::from(self.channel) & INDEX_NIBBLE_MASK) << INDEX_CHANNEL_SHIFT;
        value |= u32::from(self.sub_index) & INDEX_SUB_INDEX_MASK;
        value
    }

    /// Unpack from the native 32-bit representation
    pub fn decode(value: u32) -> Self {
        Self {
            is_soft: value & INDEX_SOFT_FLAG != 0,
            is_tx: value & INDEX_TXD_FLAG != 0,
            device: ((value >> INDEX_DEVICE_SHIFT) & INDEX_NIBBLE_MASK) as u8,
            channel: ((value >> INDEX_CHANNEL_SHIFT) & INDEX_NIBBLE_MASK) as u8,
            sub_index: (value & INDEX_SUB_INDEX_MASK) as u16,
        }
    }
}

impl From<Index> for u32 {
    fn from(index: Index) -> u32 {
        index.encode()
    }
}

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index::decode(value)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, Device {}, Channel {}, Sub Index {}",
            if self.is_soft {
                "Software Filter"
            } else {
                "Hardware Filter"
            },
            if self.is_tx { "TxD" } else { "RxD" },
            self.device,
            self.channel,
            self.sub_index
        )
    }
}
