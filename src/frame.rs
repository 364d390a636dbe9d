//! Tiny-CAN frame implementation
//!
//! This module provides the public [`Frame`] type and the native
//! [`RawCanMsg`] record exchanged with the driver, plus the conversions
//! between the two.
//!
//! The flags word is written by two different actors. The host encodes the
//! payload length in the low nibble and marks RTR / extended format with bits
//! 6 and 7 when it submits a frame. The driver reports its own markers in
//! bits 16 to 19 on frames it places in the receive queue.

use std::fmt;

use crate::constants::{
    CAN_MAX_DLEN, MSG_FLAG_EFF, MSG_FLAG_LENGTH_MASK, MSG_FLAG_RESERVED, MSG_FLAG_RTR,
    MSG_FLAG_RX_EFF, MSG_FLAG_RX_RTR, MSG_FLAG_TXD, NATIVE_MSG_SIZE,
};
use crate::error::{Result, TinyCanError};

/// Native timestamp (TTime)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawTime {
    pub sec: u32,
    pub usec: u32,
}

/// Native CAN message record (TCanMsg)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCanMsg {
    pub id: u32,
    pub flags: u32,
    pub data: [u8; CAN_MAX_DLEN],
    pub time: RawTime,
}

impl RawCanMsg {
    /// Pack into the native little-endian layout
    pub fn pack(&self) -> [u8; NATIVE_MSG_SIZE] {
        let mut buf = [0u8; NATIVE_MSG_SIZE];
        buf[0..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..16].copy_from_slice(&self.data);
        buf[16..20].copy_from_slice(&self.time.sec.to_le_bytes());
        buf[20..24].copy_from_slice(&self.time.usec.to_le_bytes());
        buf
    }

    /// Unpack from the native little-endian layout
    pub fn unpack(buf: &[u8; NATIVE_MSG_SIZE]) -> Self {
        let mut data = [0u8; CAN_MAX_DLEN];
        data.copy_from_slice(&buf[8..16]);
        Self {
            id: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            flags: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            data,
            time: RawTime {
                sec: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
                usec: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
            },
        }
    }

    /// View the flags word
    pub fn wire_flags(&self) -> WireFlags {
        WireFlags(self.flags)
    }
}

/// Accessors for the native flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFlags(pub u32);

impl WireFlags {
    /// Payload length nibble as stored (may exceed 8 on corrupt input)
    pub fn length(&self) -> u8 {
        (self.0 & MSG_FLAG_LENGTH_MASK) as u8
    }

    /// Host-side RTR bit (bit 6)
    pub fn tx_remote_request(&self) -> bool {
        self.0 & MSG_FLAG_RTR != 0
    }

    /// Host-side extended format bit (bit 7)
    pub fn tx_extended_format(&self) -> bool {
        self.0 & MSG_FLAG_EFF != 0
    }

    /// Driver-set transmit acknowledgement (bit 19)
    pub fn is_transmitted(&self) -> bool {
        self.0 & MSG_FLAG_TXD != 0
    }

    /// Driver-set reserved bit (bit 18), expected to be zero
    pub fn is_reserved(&self) -> bool {
        self.0 & MSG_FLAG_RESERVED != 0
    }

    /// Driver-set RTR marker (bit 17)
    pub fn remote_request_mirror(&self) -> bool {
        self.0 & MSG_FLAG_RX_RTR != 0
    }

    /// Driver-set extended format marker (bit 16).
    ///
    /// Not used when decoding a [`Frame`]; the bit has not been checked
    /// against hardware captures.
    pub fn extended_mirror(&self) -> bool {
        self.0 & MSG_FLAG_RX_EFF != 0
    }
}

/// Tiny-CAN frame
///
/// A classic CAN frame with up to 8 payload bytes. Received frames also
/// carry the driver timestamp and the transmit acknowledgement marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// CAN identifier
    pub id: u32,
    /// Remote transmission request
    pub is_remote_request: bool,
    /// Extended frame format (29-bit identifier)
    pub is_extended_format: bool,
    /// Set by the driver when a transmitted frame is echoed into the receive queue
    pub is_transmitted_ack: bool,
    /// Timestamp seconds
    pub seconds: u32,
    /// Timestamp microseconds
    pub microseconds: u32,
    length: u8,
    data: [u8; CAN_MAX_DLEN],
}

impl Frame {
    /// Create a standard format data frame
    ///
    /// Fails with [`TinyCanError::PayloadTooLong`] if `data` is longer than 8 bytes.
    pub fn new(id: u32, data: &[u8]) -> Result<Self> {
        if data.len() > CAN_MAX_DLEN {
            return Err(TinyCanError::PayloadTooLong { length: data.len() });
        }

        let mut payload = [0u8; CAN_MAX_DLEN];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            id,
            is_remote_request: false,
            is_extended_format: false,
            is_transmitted_ack: false,
            seconds: 0,
            microseconds: 0,
            length: data.len() as u8,
            data: payload,
        })
    }

    /// Create an extended format (29-bit) data frame
    pub fn new_extended(id: u32, data: &[u8]) -> Result<Self> {
        let mut frame = Self::new(id, data)?;
        frame.is_extended_format = true;
        Ok(frame)
    }

    /// Create a remote transmission request for `length` bytes
    pub fn new_remote(id: u32, length: u8) -> Result<Self> {
        if length as usize > CAN_MAX_DLEN {
            return Err(TinyCanError::PayloadTooLong {
                length: length as usize,
            });
        }
        let mut frame = Self::new(id, &[])?;
        frame.length = length;
        frame.is_remote_request = true;
        Ok(frame)
    }

    /// Payload length (0 to 8)
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Meaningful payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }

    /// Encode for transmission
    pub fn to_raw(&self) -> RawCanMsg {
        let mut flags = u32::from(self.length) & MSG_FLAG_LENGTH_MASK;
        if self.is_remote_request {
            flags |= MSG_FLAG_RTR;
        }
        if self.is_extended_format {
            flags |= MSG_FLAG_EFF;
        }

        RawCanMsg {
            id: self.id,
            flags,
            data: self.data,
            time: RawTime {
                sec: self.seconds,
                usec: self.microseconds,
            },
        }
    }

    /// Decode a frame taken from the receive queue
    pub fn from_raw(raw: &RawCanMsg) -> Self {
        let flags = raw.wire_flags();
        let length = flags.length().min(CAN_MAX_DLEN as u8);

        let mut data = [0u8; CAN_MAX_DLEN];
        data[..length as usize].copy_from_slice(&raw.data[..length as usize]);

        Self {
            id: raw.id,
            is_remote_request: flags.remote_request_mirror(),
            // TODO: decode the extended format marker once bit 16 has been
            // confirmed on hardware captures; see WireFlags::extended_mirror.
            is_extended_format: false,
            is_transmitted_ack: flags.is_transmitted(),
            seconds: raw.time.sec,
            microseconds: raw.time.usec,
            length,
            data,
        }
    }

    /// Timestamp in seconds
    pub fn timestamp(&self) -> f64 {
        self.seconds as f64 + self.microseconds as f64 / 1_000_000.0
    }
}

impl From<&Frame> for RawCanMsg {
    fn from(frame: &Frame) -> Self {
        frame.to_raw()
    }
}

impl From<&RawCanMsg> for Frame {
    fn from(raw: &RawCanMsg) -> Self {
        Frame::from_raw(raw)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ext_indicator = if self.is_extended_format { " EXT" } else { "" };
        let ack_indicator = if self.is_transmitted_ack { " TX" } else { "" };

        let data_str = if self.is_remote_request {
            "remote request".to_string()
        } else {
            self.data()
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ")
        };

        write!(
            f,
            "{:>8X}{}{}   [{}]  {}",
            self.id, ext_indicator, ack_indicator, self.length, data_str
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(0x123, &[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.id, 0x123);
        assert_eq!(frame.length(), 4);
        assert_eq!(frame.data(), &[1, 2, 3, 4]);
        assert!(!frame.is_extended_format);
        assert!(!frame.is_remote_request);
    }

    #[test]
    fn test_payload_too_long() {
        let err = Frame::new(0x123, &[0u8; 9]).unwrap_err();
        assert!(matches!(err, TinyCanError::PayloadTooLong { length: 9 }));
        assert!(Frame::new_extended(0x123, &[0u8; 64]).is_err());
        assert!(Frame::new_remote(0x123, 9).is_err());
    }

    #[test]
    fn test_to_raw_flags() {
        let frame = Frame::new(0x7FF, &[0xAA; 8]).unwrap();
        assert_eq!(frame.to_raw().flags, 0x08);

        let frame = Frame::new_extended(0x1234_5678, &[1, 2]).unwrap();
        assert_eq!(frame.to_raw().flags, 0x82);

        let frame = Frame::new_remote(0x100, 3).unwrap();
        let raw = frame.to_raw();
        assert_eq!(raw.flags, 0x43);
        assert!(raw.wire_flags().tx_remote_request());
    }

    #[test]
    fn test_from_raw_driver_markers() {
        let raw = RawCanMsg {
            id: 0x123,
            flags: 4 | MSG_FLAG_TXD,
            data: [1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF],
            time: RawTime { sec: 7, usec: 500 },
        };
        let frame = Frame::from_raw(&raw);
        assert!(frame.is_transmitted_ack);
        assert!(!frame.is_remote_request);
        assert_eq!(frame.data(), &[1, 2, 3, 4]);
        assert_eq!(frame.seconds, 7);
        assert_eq!(frame.microseconds, 500);

        let raw = RawCanMsg {
            flags: MSG_FLAG_RX_RTR,
            ..raw
        };
        assert!(Frame::from_raw(&raw).is_remote_request);
    }

    #[test]
    fn test_from_raw_extended_mirror_not_decoded() {
        let raw = RawCanMsg {
            id: 0x1FFF_FFFF,
            flags: 2 | MSG_FLAG_RX_EFF,
            ..Default::default()
        };
        assert!(raw.wire_flags().extended_mirror());
        assert!(!Frame::from_raw(&raw).is_extended_format);
    }

    #[test]
    fn test_from_raw_clamps_length() {
        let raw = RawCanMsg {
            flags: 0x0F,
            data: [9; 8],
            ..Default::default()
        };
        let frame = Frame::from_raw(&raw);
        assert_eq!(frame.length(), 8);
        assert_eq!(frame.data(), &[9; 8]);
    }

    #[test]
    fn test_pack_layout() {
        let frame = Frame::new(0x0102_0304, &[0xDE, 0xAD]).unwrap();
        let packed = frame.to_raw().pack();
        assert_eq!(packed.len(), NATIVE_MSG_SIZE);
        assert_eq!(packed[0..4], [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(packed[4..8], [0x02, 0, 0, 0]);
        assert_eq!(packed[8..10], [0xDE, 0xAD]);

        let unpacked = RawCanMsg::unpack(&packed);
        assert_eq!(unpacked, frame.to_raw());
    }

    #[test]
    fn test_display() {
        let frame = Frame::new(0x7FF, &[0x12, 0x34]).unwrap();
        assert_eq!(frame.to_string(), "     7FF   [2]  12 34");

        let frame = Frame::new_remote(0x10, 0).unwrap();
        assert_eq!(frame.to_string(), "      10   [0]  remote request");
    }
}
