//! Adapter descriptors
//!
//! The driver's device list is a packed array of 363-byte records
//! (TCanDevicesList). Integers are big-endian, strings are fixed-width and
//! NUL/space padded:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 4    | channel index (`INDEX_INVALID` if not open) |
//! | 4      | 4    | hardware id (0 = no module features)    |
//! | 8      | 255  | device name                             |
//! | 263    | 16   | serial number                           |
//! | 279    | 64   | description                             |
//! | 343    | 4    | CAN clock                               |
//! | 347    | 4    | feature flags                           |
//! | 351    | 4    | CAN channel count                       |
//! | 355    | 4    | hardware receive filter count           |
//! | 359    | 4    | hardware transmit buffer count          |

use std::fmt;

use crate::constants::{DEVICE_RECORD_SIZE, INDEX_INVALID};
use crate::error::{Result, TinyCanError};

const CHANNEL_INDEX_OFFSET: usize = 0;
const HARDWARE_ID_OFFSET: usize = 4;
const DEVICE_NAME_OFFSET: usize = 8;
const DEVICE_NAME_LEN: usize = 255;
const SERIAL_NUMBER_OFFSET: usize = DEVICE_NAME_OFFSET + DEVICE_NAME_LEN;
const SERIAL_NUMBER_LEN: usize = 16;
const DESCRIPTION_OFFSET: usize = SERIAL_NUMBER_OFFSET + SERIAL_NUMBER_LEN;
const DESCRIPTION_LEN: usize = 64;
const MODULE_FEATURES_OFFSET: usize = DESCRIPTION_OFFSET + DESCRIPTION_LEN;

fn read_u32_be(record: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        record[offset],
        record[offset + 1],
        record[offset + 2],
        record[offset + 3],
    ])
}

fn read_string(record: &[u8], offset: usize, len: usize) -> String {
    let field = &record[offset..offset + len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(len);
    String::from_utf8_lossy(&field[..end])
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Identity fields common to every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCore {
    /// Device index if the adapter is open, [`INDEX_INVALID`] otherwise
    pub channel_index: u32,
    /// 32-bit hardware key; some adapters report it only once opened
    pub hardware_id: u32,
    /// Device name, e.g. `/dev/ttyUSB0`
    pub device_name: String,
    /// Serial number
    pub serial_number: String,
    /// Description, e.g. "Tiny-CAN IV-XL"
    pub description: String,
}

/// Module features reported by adapters with a hardware id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleFeatures {
    /// CAN controller clock frequency
    pub can_clock: u32,
    /// Feature flags
    pub flags: u32,
    /// Number of CAN interfaces
    pub can_channel_count: u32,
    /// Number of hardware receive filters
    pub hw_rx_filter_count: u32,
    /// Number of hardware transmit buffers with timer support
    pub hw_tx_buffer_count: u32,
}

impl ModuleFeatures {
    fn unpack(record: &[u8]) -> Self {
        let base = MODULE_FEATURES_OFFSET;
        Self {
            can_clock: read_u32_be(record, base),
            flags: read_u32_be(record, base + 4),
            can_channel_count: read_u32_be(record, base + 8),
            hw_rx_filter_count: read_u32_be(record, base + 12),
            hw_tx_buffer_count: read_u32_be(record, base + 16),
        }
    }
}

/// One adapter from the driver's device list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adapter {
    /// Adapter without module features (`hardware_id == 0`)
    Basic(AdapterCore),
    /// Adapter reporting module features
    Extended(AdapterCore, ModuleFeatures),
}

impl Adapter {
    /// Parse record `record_index` of a device list buffer
    pub fn parse(buffer: &[u8], record_index: usize) -> Result<Self> {
        let end = record_index
            .checked_mul(DEVICE_RECORD_SIZE)
            .and_then(|start| start.checked_add(DEVICE_RECORD_SIZE))
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| TinyCanError::MalformedDescriptor {
                record: record_index,
                expected: record_index
                    .saturating_add(1)
                    .saturating_mul(DEVICE_RECORD_SIZE),
                actual: buffer.len(),
            })?;
        let start = end - DEVICE_RECORD_SIZE;

        let record = &buffer[start..end];
        let core = AdapterCore {
            channel_index: read_u32_be(record, CHANNEL_INDEX_OFFSET),
            hardware_id: read_u32_be(record, HARDWARE_ID_OFFSET),
            device_name: read_string(record, DEVICE_NAME_OFFSET, DEVICE_NAME_LEN),
            serial_number: read_string(record, SERIAL_NUMBER_OFFSET, SERIAL_NUMBER_LEN),
            description: read_string(record, DESCRIPTION_OFFSET, DESCRIPTION_LEN),
        };

        if core.hardware_id > 0 {
            Ok(Adapter::Extended(core, ModuleFeatures::unpack(record)))
        } else {
            Ok(Adapter::Basic(core))
        }
    }

    /// Identity fields
    pub fn core(&self) -> &AdapterCore {
        match self {
            Adapter::Basic(core) | Adapter::Extended(core, _) => core,
        }
    }

    /// Module features, if the adapter reports them
    pub fn module_features(&self) -> Option<&ModuleFeatures> {
        match self {
            Adapter::Basic(_) => None,
            Adapter::Extended(_, features) => Some(features),
        }
    }

    /// Check if the adapter reports module features
    pub fn has_module_features(&self) -> bool {
        matches!(self, Adapter::Extended(..))
    }

    /// Get the device index reported by the driver
    pub fn channel_index(&self) -> u32 {
        self.core().channel_index
    }

    /// Check if the driver reports this adapter as open
    pub fn is_open(&self) -> bool {
        self.channel_index() != INDEX_INVALID
    }

    /// Get the hardware id
    pub fn hardware_id(&self) -> u32 {
        self.core().hardware_id
    }

    /// Get the device name
    pub fn device_name(&self) -> &str {
        &self.core().device_name
    }

    /// Get the serial number
    pub fn serial_number(&self) -> &str {
        &self.core().serial_number
    }

    /// Get the description
    pub fn description(&self) -> &str {
        &self.core().description
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} # {}", self.description(), self.serial_number())
    }
}

/// Build a device list record. Shared with the mock driver.
#[cfg(test)]
pub(crate) fn encode_record(core: &AdapterCore, features: Option<&ModuleFeatures>) -> Vec<u8> {
    let mut record = vec![0u8; DEVICE_RECORD_SIZE];
    record[0..4].copy_from_slice(&core.channel_index.to_be_bytes());
    record[4..8].copy_from_slice(&core.hardware_id.to_be_bytes());
    let mut put = |offset: usize, len: usize, value: &str| {
        let bytes = value.as_bytes();
        let n = bytes.len().min(len);
        record[offset..offset + n].copy_from_slice(&bytes[..n]);
    };
    put(DEVICE_NAME_OFFSET, DEVICE_NAME_LEN, &core.device_name);
    put(SERIAL_NUMBER_OFFSET, SERIAL_NUMBER_LEN, &core.serial_number);
    put(DESCRIPTION_OFFSET, DESCRIPTION_LEN, &core.description);
    if let Some(features) = features {
        let base = MODULE_FEATURES_OFFSET;
        for (i, value) in [
            features.can_clock,
            features.flags,
            features.can_channel_count,
            features.hw_rx_filter_count,
            features.hw_tx_buffer_count,
        ]
        .iter()
        .enumerate()
        {
            record[base + i * 4..base + i * 4 + 4].copy_from_slice(&value.to_be_bytes());
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(serial: &str, hardware_id: u32) -> AdapterCore {
        AdapterCore {
            channel_index: INDEX_INVALID,
            hardware_id,
            device_name: "/dev/ttyUSB0".to_string(),
            serial_number: serial.to_string(),
            description: "Tiny-CAN IV-XL".to_string(),
        }
    }

    fn features() -> ModuleFeatures {
        ModuleFeatures {
            can_clock: 16_000_000,
            flags: 0x0000_0103,
            can_channel_count: 1,
            hw_rx_filter_count: 4,
            hw_tx_buffer_count: 8,
        }
    }

    #[test]
    fn test_layout_offsets() {
        assert_eq!(SERIAL_NUMBER_OFFSET, 263);
        assert_eq!(DESCRIPTION_OFFSET, 279);
        assert_eq!(MODULE_FEATURES_OFFSET, 343);
        assert_eq!(MODULE_FEATURES_OFFSET + 20, DEVICE_RECORD_SIZE);
    }

    #[test]
    fn test_parse_basic() {
        let record = encode_record(&core("SN123", 0), None);
        let adapter = Adapter::parse(&record, 0).unwrap();
        assert!(!adapter.has_module_features());
        assert!(adapter.module_features().is_none());
        assert_eq!(adapter.serial_number(), "SN123");
        assert_eq!(adapter.device_name(), "/dev/ttyUSB0");
        assert_eq!(adapter.description(), "Tiny-CAN IV-XL");
        assert_eq!(adapter.channel_index(), INDEX_INVALID);
        assert!(!adapter.is_open());
    }

    #[test]
    fn test_parse_extended() {
        let record = encode_record(&core("SN9", 0x0102_0304), Some(&features()));
        let adapter = Adapter::parse(&record, 0).unwrap();
        assert_eq!(adapter.hardware_id(), 0x0102_0304);
        assert_eq!(adapter.module_features(), Some(&features()));
    }

    #[test]
    fn test_parse_record_index() {
        let mut buffer = encode_record(&core("FIRST", 0), None);
        buffer.extend(encode_record(&core("SECOND", 7), Some(&features())));

        let second = Adapter::parse(&buffer, 1).unwrap();
        assert_eq!(second.serial_number(), "SECOND");
        assert!(second.has_module_features());

        // Parsing is deterministic
        assert_eq!(Adapter::parse(&buffer, 1).unwrap(), second);
    }

    #[test]
    fn test_parse_strips_padding() {
        let mut record = encode_record(&core("", 0), None);
        record[SERIAL_NUMBER_OFFSET..SERIAL_NUMBER_OFFSET + 8].copy_from_slice(b"AB12  \0 ");
        record[DESCRIPTION_OFFSET..DESCRIPTION_OFFSET + 6].copy_from_slice(b"Tiny\t ");
        let adapter = Adapter::parse(&record, 0).unwrap();
        assert_eq!(adapter.serial_number(), "AB12");
        assert_eq!(adapter.description(), "Tiny");
    }

    #[test]
    fn test_parse_short_buffer() {
        let record = encode_record(&core("SN1", 0), None);
        let err = Adapter::parse(&record, 1).unwrap_err();
        assert!(matches!(
            err,
            TinyCanError::MalformedDescriptor {
                record: 1,
                expected: 726,
                actual: 363
            }
        ));
        assert!(Adapter::parse(&record[..362], 0).is_err());
    }

    #[test]
    fn test_parse_huge_record_index() {
        let record = encode_record(&core("SN1", 0), None);

        let err = Adapter::parse(&record, usize::MAX / 300).unwrap_err();
        assert!(matches!(
            err,
            TinyCanError::MalformedDescriptor {
                expected: usize::MAX,
                actual: 363,
                ..
            }
        ));
        assert!(Adapter::parse(&record, usize::MAX).is_err());
    }

    #[test]
    fn test_display() {
        let record = encode_record(&core("SN123", 0), None);
        let adapter = Adapter::parse(&record, 0).unwrap();
        assert_eq!(adapter.to_string(), "Tiny-CAN IV-XL # SN123");
    }
}
