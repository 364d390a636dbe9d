//! Tiny-CAN configuration and status structures
//!
//! This module contains the typed values used to configure a channel
//! (bit rate, operating mode, event masks) and the device status record.

use std::fmt;

use crate::constants::*;

/// CAN bit rates supported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitrate {
    Kbps10,
    Kbps20,
    Kbps50,
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps800,
    Mbps1,
}

impl Bitrate {
    /// All supported bit rates, slowest first
    pub const ALL: [Bitrate; 9] = [
        Bitrate::Kbps10,
        Bitrate::Kbps20,
        Bitrate::Kbps50,
        Bitrate::Kbps100,
        Bitrate::Kbps125,
        Bitrate::Kbps250,
        Bitrate::Kbps500,
        Bitrate::Kbps800,
        Bitrate::Mbps1,
    ];

    /// Speed code passed to the driver (kbps)
    pub fn code(&self) -> u16 {
        match self {
            Bitrate::Kbps10 => 10,
            Bitrate::Kbps20 => 20,
            Bitrate::Kbps50 => 50,
            Bitrate::Kbps100 => 100,
            Bitrate::Kbps125 => 125,
            Bitrate::Kbps250 => 250,
            Bitrate::Kbps500 => 500,
            Bitrate::Kbps800 => 800,
            Bitrate::Mbps1 => 1000,
        }
    }

    /// Look up a bit rate by its kbps value
    pub fn from_kbps(kbps: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.code() == kbps)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.code())
    }
}

/// Device list selection passed to enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceListFilter {
    /// Every compatible (FTDI based) device
    AllCompatible,
    /// Tiny-CAN devices only
    TinyCanOnly,
}

impl DeviceListFilter {
    /// Flags passed to the device list call
    pub fn code(&self) -> i32 {
        match self {
            DeviceListFilter::AllCompatible => DEVICE_LIST_ALL_FTDI,
            DeviceListFilter::TinyCanOnly => DEVICE_LIST_TINY_CAN,
        }
    }
}

/// CAN operating mode for `CanSetMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    NoChange,
    Start,
    Stop,
    /// Reset the controller, clearing bus off
    Reset,
    StartListenOnly,
    StartNoRetransmit,
}

impl OperatingMode {
    /// Mode code passed to `CanSetMode`
    pub fn code(&self) -> u8 {
        match self {
            OperatingMode::NoChange => OP_CAN_NO_CHANGE,
            OperatingMode::Start => OP_CAN_START,
            OperatingMode::Stop => OP_CAN_STOP,
            OperatingMode::Reset => OP_CAN_RESET,
            OperatingMode::StartListenOnly => OP_CAN_START_LOM,
            OperatingMode::StartNoRetransmit => OP_CAN_START_NO_RETRANS,
        }
    }
}

/// Event masks for `CanSetEvents`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMask {
    EnablePnpChange,
    EnableStatusChange,
    EnableReceiveFilterMessages,
    EnableReceiveMessages,
    EnableAll,
    DisablePnpChange,
    DisableStatusChange,
    DisableReceiveFilterMessages,
    DisableReceiveMessages,
    DisableAll,
}

impl EventMask {
    /// Mask passed to `CanSetEvents`
    pub fn code(&self) -> u16 {
        match self {
            EventMask::EnablePnpChange => EVENT_ENABLE_PNP_CHANGE,
            EventMask::EnableStatusChange => EVENT_ENABLE_STATUS_CHANGE,
            EventMask::EnableReceiveFilterMessages => EVENT_ENABLE_RX_FILTER_MESSAGES,
            EventMask::EnableReceiveMessages => EVENT_ENABLE_RX_MESSAGES,
            EventMask::EnableAll => EVENT_ENABLE_ALL,
            EventMask::DisablePnpChange => EVENT_DISABLE_PNP_CHANGE,
            EventMask::DisableStatusChange => EVENT_DISABLE_STATUS_CHANGE,
            EventMask::DisableReceiveFilterMessages => EVENT_DISABLE_RX_FILTER_MESSAGES,
            EventMask::DisableReceiveMessages => EVENT_DISABLE_RX_MESSAGES,
            EventMask::DisableAll => EVENT_DISABLE_ALL,
        }
    }
}

/// Native device status record (TDeviceStatus)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawDeviceStatus {
    pub drv_status: i32,
    pub can_status: u8,
    pub fifo_status: u8,
}

/// Adapter status as reported for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    raw: RawDeviceStatus,
}

impl Status {
    /// Driver status code (`DRV_STATUS_*`)
    pub fn driver_status(&self) -> i32 {
        self.raw.drv_status
    }

    /// CAN controller status code (`CAN_STATUS_*`)
    pub fn can_status(&self) -> u8 {
        self.raw.can_status
    }

    /// FIFO status code (`FIFO_*`)
    pub fn fifo_status(&self) -> u8 {
        self.raw.fifo_status
    }

    /// Name of the driver status, e.g. `CAN_RUN`
    pub fn driver_status_name(&self) -> &'static str {
        driver_status_name(self.raw.drv_status)
    }

    /// Name of the CAN controller status
    pub fn can_status_name(&self) -> &'static str {
        can_status_name(self.raw.can_status)
    }

    /// Name of the FIFO status
    pub fn fifo_status_name(&self) -> &'static str {
        fifo_status_name(self.raw.fifo_status)
    }

    /// Check if the device is open or running with a healthy controller and FIFO
    pub fn is_ok(&self) -> bool {
        matches!(
            self.raw.drv_status,
            DRV_STATUS_CAN_OPEN | DRV_STATUS_CAN_RUN
        ) && self.raw.can_status == CAN_STATUS_OK
            && self.raw.fifo_status == FIFO_OK
    }
}

impl From<RawDeviceStatus> for Status {
    fn from(raw: RawDeviceStatus) -> Self {
        Self { raw }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[0x{:x}, 0x{:x}, 0x{:x}]",
            if self.is_ok() { "OK, " } else { "" },
            self.raw.drv_status,
            self.raw.can_status,
            self.raw.fifo_status
        )
    }
}
