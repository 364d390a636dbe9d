//! Adapter enumeration
//!
//! [`AdapterRegistry`] owns the initialized driver. It lists the connected
//! adapters, looks them up by serial number, and opens channels to them.

use std::sync::Arc;

use log::{debug, warn};

use crate::adapter::Adapter;
use crate::channel::Channel;
use crate::driver::{DriverSession, NativeDriver, RawDeviceList};
use crate::error::{classify, Result, TinyCanError};
use crate::structures::{Bitrate, DeviceListFilter};

/// Entry point to a Tiny-CAN driver
///
/// The driver is initialized on construction and shut down once the registry
/// and every channel opened through it have been dropped.
pub struct AdapterRegistry<D: NativeDriver> {
    session: Arc<DriverSession<D>>,
}

impl<D: NativeDriver> AdapterRegistry<D> {
    /// Initialize the driver with default options
    pub fn new(driver: D) -> Result<Self> {
        Self::with_options(driver, None)
    }

    /// Initialize the driver with an option string, e.g. `"CanRxDFifoSize=16384"`
    pub fn with_options(driver: D, options: Option<&str>) -> Result<Self> {
        let session = DriverSession::init(driver, options)?;
        Ok(Self {
            session: Arc::new(session),
        })
    }

    /// Get the underlying driver
    pub fn driver(&self) -> &D {
        self.session.driver()
    }

    /// List connected Tiny-CAN adapters
    pub fn scan(&self) -> Result<Vec<Adapter>> {
        self.scan_with(DeviceListFilter::TinyCanOnly)
    }

    /// List adapters matching `filter`.
    ///
    /// The native device list is released after parsing, including when a
    /// record fails to parse.
    pub fn scan_with(&self, filter: DeviceListFilter) -> Result<Vec<Adapter>> {
        let driver = self.driver();
        let list = driver.get_device_list(filter.code());
        if list.code < 0 {
            classify(list.code, || "Can't get adapter list".to_string())?;
        }

        let adapters = parse_device_list(&list);
        driver.free_device_list(list);

        let adapters = adapters?;
        debug!("found {} adapter(s)", adapters.len());
        Ok(adapters)
    }

    /// Look up an adapter by serial number.
    ///
    /// If several adapters report the same serial number, the last one listed
    /// is returned.
    pub fn find(&self, serial_number: &str) -> Result<Option<Adapter>> {
        let found = self
            .scan()?
            .into_iter()
            .filter(|adapter| adapter.serial_number() == serial_number)
            .last();
        if found.is_none() {
            warn!("no adapter with serial number {}", serial_number);
        }
        Ok(found)
    }

    /// Like [`find`](Self::find), but a missing adapter is an error
    pub fn get(&self, serial_number: &str) -> Result<Adapter> {
        self.find(serial_number)?
            .ok_or_else(|| TinyCanError::AdapterNotFound(serial_number.to_string()))
    }

    /// Open a channel to `adapter` at `bitrate`
    pub fn open_channel(&self, adapter: &Adapter, bitrate: Bitrate) -> Result<Channel<D>> {
        Channel::open(Arc::clone(&self.session), adapter.clone(), bitrate)
    }
}

fn parse_device_list(list: &RawDeviceList) -> Result<Vec<Adapter>> {
    (0..list.code.max(0) as usize)
        .map(|record| Adapter::parse(&list.data, record))
        .collect()
}
