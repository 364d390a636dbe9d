//! Tiny-CAN channel implementation
//!
//! This module provides the [`Channel`] struct, one open and configured
//! connection to an adapter.
//!
//! Frames can be polled with [`Channel::read`] or delivered through a
//! receive handler. The driver calls back on its own thread when frames
//! arrive; the channel then drains the whole receive queue through the same
//! read path, handing each frame to the handler in queue order.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};

use crate::adapter::Adapter;
use crate::constants::CAN_CMD_ALL_CLEAR;
use crate::driver::{DriverSession, NativeDriver, RxEventCallback};
use crate::error::{classify, Result, TinyCanError};
use crate::frame::{Frame, RawCanMsg};
use crate::index::Index;
use crate::structures::{Bitrate, EventMask, OperatingMode, RawDeviceStatus, Status};

/// Result returned by a receive handler
pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receive handler, called once per received frame
pub type FrameHandler = Box<dyn Fn(&Frame) -> HandlerResult + Send + Sync>;

type SharedHandler = Arc<dyn Fn(&Frame) -> HandlerResult + Send + Sync>;

/// Lifecycle of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    /// Native handle open, bus not configured
    Open,
    /// Bit rate set and bus started
    Configured,
    /// At least one frame read or written
    Active,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ChannelInner<D: NativeDriver> {
    session: Arc<DriverSession<D>>,
    id: usize,
    adapter: Adapter,
    index: Index,
    state: Mutex<ChannelState>,
    /// Serializes access to the native receive queue
    rx_lock: Mutex<()>,
    /// Held for a whole drain pass
    drain_lock: Mutex<()>,
    handler: Mutex<Option<SharedHandler>>,
}

impl<D: NativeDriver> ChannelInner<D> {
    fn driver(&self) -> &D {
        self.session.driver()
    }

    fn raw_index(&self) -> u32 {
        self.index.encode()
    }

    fn set_state(&self, state: ChannelState) {
        *lock(&self.state) = state;
    }

    fn mark_active(&self) {
        let mut state = lock(&self.state);
        if *state == ChannelState::Configured {
            *state = ChannelState::Active;
        }
    }

    fn read(&self) -> Result<Frame> {
        let mut buffer = [RawCanMsg::default(); 1];
        let count = {
            let _guard = lock(&self.rx_lock);
            self.driver().receive(self.raw_index(), &mut buffer)
        };

        if count < 0 {
            classify(count, || {
                format!("Can't read message from adapter {}", self.adapter)
            })?;
        }
        if count == 0 {
            return Err(TinyCanError::NoMessage);
        }

        self.mark_active();
        let frame = Frame::from_raw(&buffer[0]);
        trace!("RX  {}", frame);
        Ok(frame)
    }

    fn close_native(&self) -> Result<()> {
        let code = self.driver().close_device(self.raw_index());
        self.set_state(ChannelState::Closed);
        classify(code, || {
            format!("Can't close channel to {}", self.adapter)
        })?;
        debug!("closed channel to {}", self.adapter);
        Ok(())
    }

    fn owns_rx_callback(&self) -> bool {
        self.session.rx_owner() == Some(self.id)
    }

    /// Remove this channel's handler, leaving another channel's callback in place
    fn uninstall_handler(&self) {
        let _install = self.session.lock_install();
        let had_handler = lock(&self.handler).take().is_some();
        if had_handler && self.owns_rx_callback() {
            let driver = self.driver();
            driver.set_events(EventMask::DisableReceiveMessages.code());
            driver.set_rx_event_callback(None);
            self.session.set_rx_owner(None);
            debug!("receive handler removed from {}", self.adapter);
        }
    }

    /// Drain the receive queue into the installed handler
    fn drain(&self) {
        let _drain = lock(&self.drain_lock);
        let handler = match lock(&self.handler).clone() {
            Some(handler) => handler,
            None => return,
        };

        let mut pending = self.driver().receive_count(self.raw_index());
        while pending > 0 {
            let mut delivered = 0;
            for _ in 0..pending {
                match self.read() {
                    Ok(frame) => {
                        delivered += 1;
                        deliver(&handler, &frame);
                    }
                    Err(TinyCanError::NoMessage) => break,
                    Err(err) => warn!("receive failed while draining: {}", err),
                }
            }
            if delivered == 0 {
                break;
            }
            pending = self.driver().receive_count(self.raw_index());
        }
    }
}

/// Call the handler, containing errors and panics to this frame
fn deliver(handler: &SharedHandler, frame: &Frame) {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(frame))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("receive handler failed on frame {}: {}", frame, err),
        Err(_) => warn!("receive handler panicked on frame {}", frame),
    }
}

/// An open channel to a Tiny-CAN adapter
///
/// Obtained from [`AdapterRegistry::open_channel`](crate::AdapterRegistry::open_channel).
/// Dropping an open channel removes its receive handler and closes the
/// native handle.
///
/// All operations block for the duration of the native call.
/// [`get_status`](Channel::get_status) is comparatively expensive; call it at
/// most about once every ten seconds.
pub struct Channel<D: NativeDriver> {
    inner: Arc<ChannelInner<D>>,
    closed: bool,
}

impl<D: NativeDriver> Channel<D> {
    /// Open and configure a channel.
    ///
    /// The adapter is addressed by serial number. On configuration failure the
    /// native handle is closed before the error is returned; if that close
    /// also fails, its error is returned instead.
    pub(crate) fn open(
        session: Arc<DriverSession<D>>,
        adapter: Adapter,
        bitrate: Bitrate,
    ) -> Result<Self> {
        let index = Index::receive_default();
        let parameter = format!("Snr={}", adapter.serial_number());

        let code = session.driver().open_device(index.encode(), &parameter);
        classify(code, || format!("Can't open channel to {}", adapter))?;
        debug!("opened channel to {} ({})", adapter, index);

        let id = session.next_channel_id();
        let mut channel = Self {
            inner: Arc::new(ChannelInner {
                session,
                id,
                adapter,
                index,
                state: Mutex::new(ChannelState::Open),
                rx_lock: Mutex::new(()),
                drain_lock: Mutex::new(()),
                handler: Mutex::new(None),
            }),
            closed: false,
        };

        if let Err(err) = channel.configure(bitrate) {
            channel.closed = true;
            if let Err(close_err) = channel.inner.close_native() {
                warn!(
                    "configuring {} failed ({}), then closing it failed",
                    channel.inner.adapter, err
                );
                return Err(close_err);
            }
            return Err(err);
        }

        Ok(channel)
    }

    /// Set the bit rate and start the bus, clearing FIFOs, filters, buffers and errors
    fn configure(&self, bitrate: Bitrate) -> Result<()> {
        self.set_bitrate(bitrate)?;
        self.set_mode(OperatingMode::Start, CAN_CMD_ALL_CLEAR)?;
        self.inner.set_state(ChannelState::Configured);
        debug!("channel to {} running at {}", self.inner.adapter, bitrate);
        Ok(())
    }

    /// Close this channel
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.inner.uninstall_handler();
        self.inner.close_native()
    }

    /// Set the CAN bit rate
    pub fn set_bitrate(&self, bitrate: Bitrate) -> Result<()> {
        let code = self
            .inner
            .driver()
            .set_speed(self.inner.raw_index(), bitrate.code());
        classify(code, || {
            format!("Can't set bitrate to {} on {}", bitrate, self.inner.adapter)
        })
    }

    /// Change the operating mode and issue clear commands (`CAN_CMD_*`)
    pub fn set_mode(&self, mode: OperatingMode, command: u16) -> Result<()> {
        let code = self
            .inner
            .driver()
            .set_mode(self.inner.raw_index(), mode.code(), command);
        classify(code, || {
            format!("Can't set mode {:?} on {}", mode, self.inner.adapter)
        })
    }

    /// Read one frame from the receive queue.
    ///
    /// Returns [`TinyCanError::NoMessage`] if the queue is empty; never blocks
    /// waiting for traffic.
    pub fn read(&self) -> Result<Frame> {
        self.inner.read()
    }

    /// Write one frame
    pub fn write(&self, frame: &Frame) -> Result<()> {
        let buffer = [frame.to_raw()];
        let count = self.inner.driver().transmit(self.inner.raw_index(), &buffer);
        if count < 0 {
            classify(count, || {
                format!("Can't write to adapter {}", self.inner.adapter)
            })?;
        }
        self.inner.mark_active();
        trace!("TX  {}", frame);
        Ok(())
    }

    /// Get adapter status for this channel
    pub fn get_status(&self) -> Result<Status> {
        let mut raw = RawDeviceStatus::default();
        let code = self
            .inner
            .driver()
            .get_device_status(self.inner.raw_index(), &mut raw);
        classify(code, || {
            format!("Can't get status from {}", self.inner.adapter)
        })?;
        Ok(Status::from(raw))
    }

    /// Number of frames waiting in the receive queue
    pub fn pending_receive_count(&self) -> Result<usize> {
        let count = self.inner.driver().receive_count(self.inner.raw_index());
        classify(count.min(0), || {
            format!("Can't get receive count from {}", self.inner.adapter)
        })?;
        Ok(count as usize)
    }

    /// Number of frames waiting in the transmit queue
    pub fn pending_transmit_count(&self) -> Result<usize> {
        let count = self.inner.driver().transmit_count(self.inner.raw_index());
        classify(count.min(0), || {
            format!("Can't get transmit count from {}", self.inner.adapter)
        })?;
        Ok(count as usize)
    }

    /// Check if this channel's receive handler is installed in the driver
    pub fn is_receive_handler_set(&self) -> bool {
        lock(&self.inner.handler).is_some() && self.inner.owns_rx_callback()
    }

    /// Get the channel index
    pub fn index(&self) -> Index {
        self.inner.index
    }

    /// Get the adapter this channel is connected to
    pub fn adapter(&self) -> &Adapter {
        &self.inner.adapter
    }

    /// Get the lifecycle state
    pub fn state(&self) -> ChannelState {
        *lock(&self.inner.state)
    }
}

impl<D: NativeDriver + 'static> Channel<D> {
    /// Install or remove the receive handler.
    ///
    /// Receive events are disabled and any previous callback is removed first.
    /// With `Some(handler)` a new callback is installed and receive events are
    /// enabled again. On each event the whole receive queue is drained and
    /// `handler` runs once per frame; a failing or panicking handler is logged
    /// and draining continues with the next frame.
    ///
    /// The handler runs on the driver's thread. Concurrent drains and reads on
    /// this channel are serialized.
    ///
    /// The driver holds one receive callback for all channels. Installing a
    /// handler here takes the callback over from any other channel on the same
    /// driver, which then reports no handler set.
    pub fn set_receive_handler(&self, handler: Option<FrameHandler>) {
        let session = &self.inner.session;
        let _install = session.lock_install();
        let driver = self.inner.driver();

        driver.set_events(EventMask::DisableReceiveMessages.code());
        driver.set_rx_event_callback(None);
        session.set_rx_owner(None);
        *lock(&self.inner.handler) = None;

        if let Some(handler) = handler {
            *lock(&self.inner.handler) = Some(Arc::from(handler));

            let channel = Arc::downgrade(&self.inner);
            let translator: RxEventCallback = Arc::new(move |_index: u32, _count: i32| {
                if let Some(inner) = channel.upgrade() {
                    inner.drain();
                }
            });
            driver.set_rx_event_callback(Some(translator));
            session.set_rx_owner(Some(self.inner.id));
            driver.set_events(EventMask::EnableReceiveMessages.code());
            debug!("receive handler installed on {}", self.inner.adapter);
        }
    }
}

impl<D: NativeDriver> fmt::Display for Channel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel {} to {}", self.inner.index, self.inner.adapter)
    }
}

impl<D: NativeDriver> fmt::Debug for Channel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("adapter", &self.inner.adapter.serial_number())
            .field("index", &format_args!("0x{:08x}", self.inner.raw_index()))
            .field("state", &self.state())
            .field("receive_handler", &self.is_receive_handler_set())
            .finish()
    }
}

impl<D: NativeDriver> Drop for Channel<D> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.inner.uninstall_handler();
        if let Err(err) = self.inner.close_native() {
            warn!("{}", err);
        }
    }
}
