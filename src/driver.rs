//! Native driver collaborator
//!
//! [`NativeDriver`] mirrors the exported entry points of the vendor driver
//! library. Implementations return raw codes unchanged; this crate classifies
//! them. Locating and loading the library is left to the implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::{classify, Result};
use crate::frame::RawCanMsg;
use crate::structures::RawDeviceStatus;

/// Receive event callback: `(index, pending_count)`.
///
/// Invoked by the driver on its own thread whenever frames arrive.
pub type RxEventCallback = Arc<dyn Fn(u32, i32) + Send + Sync>;

/// Device list returned by `get_device_list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeviceList {
    /// Number of records, or a negative error code
    pub code: i32,
    /// Packed 363-byte records
    pub data: Vec<u8>,
}

/// Exported entry points of the native Tiny-CAN driver
pub trait NativeDriver: Send + Sync {
    /// `CanInitDriver`
    fn init_driver(&self, options: Option<&str>) -> i32;

    /// `CanDownDriver`
    fn down_driver(&self);

    /// `CanExGetDeviceList`
    fn get_device_list(&self, flags: i32) -> RawDeviceList;

    /// `CanExDataFree`
    fn free_device_list(&self, list: RawDeviceList);

    /// `CanDeviceOpen`
    fn open_device(&self, index: u32, parameter: &str) -> i32;

    /// `CanDeviceClose`
    fn close_device(&self, index: u32) -> i32;

    /// `CanGetDeviceStatus`
    fn get_device_status(&self, index: u32, status: &mut RawDeviceStatus) -> i32;

    /// `CanReceive`: number of frames written to `msgs`, or a negative code
    fn receive(&self, index: u32, msgs: &mut [RawCanMsg]) -> i32;

    /// `CanReceiveGetCount`
    fn receive_count(&self, index: u32) -> i32;

    /// `CanTransmit`: number of frames accepted, or a negative code
    fn transmit(&self, index: u32, msgs: &[RawCanMsg]) -> i32;

    /// `CanTransmitGetCount`
    fn transmit_count(&self, index: u32) -> i32;

    /// `CanSetSpeed`, speed in kbps
    fn set_speed(&self, index: u32, speed: u16) -> i32;

    /// `CanSetMode`
    fn set_mode(&self, index: u32, mode: u8, command: u16) -> i32;

    /// `CanSetRxEventCallback`; `None` removes the callback
    fn set_rx_event_callback(&self, callback: Option<RxEventCallback>);

    /// `CanSetEvents`
    fn set_events(&self, mask: u16);
}

impl<T: NativeDriver + ?Sized> NativeDriver for Arc<T> {
    fn init_driver(&self, options: Option<&str>) -> i32 {
        (**self).init_driver(options)
    }

    fn down_driver(&self) {
        (**self).down_driver()
    }

    fn get_device_list(&self, flags: i32) -> RawDeviceList {
        (**self).get_device_list(flags)
    }

    fn free_device_list(&self, list: RawDeviceList) {
        (**self).free_device_list(list)
    }

    fn open_device(&self, index: u32, parameter: &str) -> i32 {
        (**self).open_device(index, parameter)
    }

    fn close_device(&self, index: u32) -> i32 {
        (**self).close_device(index)
    }

    fn get_device_status(&self, index: u32, status: &mut RawDeviceStatus) -> i32 {
        (**self).get_device_status(index, status)
    }

    fn receive(&self, index: u32, msgs: &mut [RawCanMsg]) -> i32 {
        (**self).receive(index, msgs)
    }

    fn receive_count(&self, index: u32) -> i32 {
        (**self).receive_count(index)
    }

    fn transmit(&self, index: u32, msgs: &[RawCanMsg]) -> i32 {
        (**self).transmit(index, msgs)
    }

    fn transmit_count(&self, index: u32) -> i32 {
        (**self).transmit_count(index)
    }

    fn set_speed(&self, index: u32, speed: u16) -> i32 {
        (**self).set_speed(index, speed)
    }

    fn set_mode(&self, index: u32, mode: u8, command: u16) -> i32 {
        (**self).set_mode(index, mode, command)
    }

    fn set_rx_event_callback(&self, callback: Option<RxEventCallback>) {
        (**self).set_rx_event_callback(callback)
    }

    fn set_events(&self, mask: u16) {
        (**self).set_events(mask)
    }
}

/// An initialized driver.
///
/// Shared by the registry and every channel; the driver is shut down when
/// the last holder is dropped.
///
/// The driver has a single receive callback, so at most one channel owns it
/// at a time. Channel ids start at 1; 0 means no owner.
pub(crate) struct DriverSession<D: NativeDriver> {
    driver: D,
    next_channel_id: AtomicUsize,
    rx_owner: AtomicUsize,
    install_lock: Mutex<()>,
}

impl<D: NativeDriver> DriverSession<D> {
    pub(crate) fn init(driver: D, options: Option<&str>) -> Result<Self> {
        classify(driver.init_driver(options), || {
            "Can't init driver".to_string()
        })?;
        debug!("driver initialized (options: {:?})", options);
        Ok(Self {
            driver,
            next_channel_id: AtomicUsize::new(1),
            rx_owner: AtomicUsize::new(0),
            install_lock: Mutex::new(()),
        })
    }

    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }

    /// Allocate an id for a newly opened channel
    pub(crate) fn next_channel_id(&self) -> usize {
        self.next_channel_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Serializes changes to the receive callback across channels
    pub(crate) fn lock_install(&self) -> MutexGuard<'_, ()> {
        self.install_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Id of the channel whose callback is installed
    pub(crate) fn rx_owner(&self) -> Option<usize> {
        match self.rx_owner.load(Ordering::Acquire) {
            0 => None,
            id => Some(id),
        }
    }

    pub(crate) fn set_rx_owner(&self, owner: Option<usize>) {
        self.rx_owner.store(owner.unwrap_or(0), Ordering::Release);
    }
}

impl<D: NativeDriver> Drop for DriverSession<D> {
    fn drop(&mut self) {
        debug!("shutting down driver");
        self.driver.down_driver();
    }
}
