//! Scripted in-memory driver for unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::adapter::{encode_record, AdapterCore, ModuleFeatures};
use crate::constants::*;
use crate::driver::{NativeDriver, RawDeviceList, RxEventCallback};
use crate::frame::RawCanMsg;
use crate::structures::RawDeviceStatus;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Driver call, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Init(Option<String>),
    Down,
    GetDeviceList(i32),
    FreeDeviceList,
    Open(u32, String),
    Close(u32),
    GetStatus(u32),
    SetSpeed(u32, u16),
    SetMode(u32, u8, u16),
    SetCallback(bool),
    SetEvents(u16),
}

pub(crate) struct MockState {
    pub init_code: i32,
    pub open_code: i32,
    pub close_code: i32,
    pub speed_code: i32,
    pub mode_code: i32,
    pub status_code: i32,
    pub status: RawDeviceStatus,
    /// Overrides `receive` with a fixed return code
    pub receive_code: Option<i32>,
    /// Overrides `transmit` with a fixed return code
    pub transmit_code: Option<i32>,
    /// Echo transmitted frames into the receive queue with the TXD marker
    pub echo_tx: bool,
    pub device_list_code: Option<i32>,
    pub devices: Vec<u8>,
    pub device_count: i32,
    pub rx_queue: VecDeque<RawCanMsg>,
    pub transmitted: Vec<RawCanMsg>,
    pub callback: Option<RxEventCallback>,
    pub calls: Vec<Call>,
}

pub(crate) struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                init_code: ERROR_OK,
                open_code: ERROR_OK,
                close_code: ERROR_OK,
                speed_code: ERROR_OK,
                mode_code: ERROR_OK,
                status_code: ERROR_OK,
                status: RawDeviceStatus {
                    drv_status: DRV_STATUS_CAN_RUN,
                    can_status: CAN_STATUS_OK,
                    fifo_status: FIFO_OK,
                },
                receive_code: None,
                transmit_code: None,
                echo_tx: true,
                device_list_code: None,
                devices: Vec::new(),
                device_count: 0,
                rx_queue: VecDeque::new(),
                transmitted: Vec::new(),
                callback: None,
                calls: Vec::new(),
            }),
        })
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn add_adapter(&self, core: &AdapterCore, features: Option<&ModuleFeatures>) {
        let mut state = self.state();
        state.devices.extend(encode_record(core, features));
        state.device_count += 1;
    }

    pub(crate) fn push_rx(&self, msg: RawCanMsg) {
        self.state().rx_queue.push_back(msg);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Invoke the installed receive callback, as the driver thread would
    pub(crate) fn fire_rx_event(&self, index: u32) -> bool {
        let (callback, count) = {
            let state = self.state();
            (state.callback.clone(), state.rx_queue.len() as i32)
        };
        match callback {
            Some(callback) => {
                callback(index, count);
                true
            }
            None => false,
        }
    }
}

impl NativeDriver for MockDriver {
    fn init_driver(&self, options: Option<&str>) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::Init(options.map(str::to_string)));
        state.init_code
    }

    fn down_driver(&self) {
        self.state().calls.push(Call::Down);
    }

    fn get_device_list(&self, flags: i32) -> RawDeviceList {
        let mut state = self.state();
        state.calls.push(Call::GetDeviceList(flags));
        RawDeviceList {
            code: state.device_list_code.unwrap_or(state.device_count),
            data: state.devices.clone(),
        }
    }

    fn free_device_list(&self, _list: RawDeviceList) {
        self.state().calls.push(Call::FreeDeviceList);
    }

    fn open_device(&self, index: u32, parameter: &str) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::Open(index, parameter.to_string()));
        state.open_code
    }

    fn close_device(&self, index: u32) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::Close(index));
        state.close_code
    }

    fn get_device_status(&self, index: u32, status: &mut RawDeviceStatus) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::GetStatus(index));
        *status = state.status;
        state.status_code
    }

    fn receive(&self, _index: u32, msgs: &mut [RawCanMsg]) -> i32 {
        let mut state = self.state();
        if let Some(code) = state.receive_code {
            return code;
        }
        let mut count = 0;
        for slot in msgs.iter_mut() {
            match state.rx_queue.pop_front() {
                Some(msg) => {
                    *slot = msg;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    fn receive_count(&self, _index: u32) -> i32 {
        let state = self.state();
        match state.receive_code {
            Some(code) if code < 0 => code,
            _ => state.rx_queue.len() as i32,
        }
    }

    fn transmit(&self, _index: u32, msgs: &[RawCanMsg]) -> i32 {
        let mut state = self.state();
        if let Some(code) = state.transmit_code {
            return code;
        }
        for msg in msgs {
            state.transmitted.push(*msg);
            if state.echo_tx {
                let mut flags = (msg.flags & MSG_FLAG_LENGTH_MASK) | MSG_FLAG_TXD;
                if msg.flags & MSG_FLAG_RTR != 0 {
                    flags |= MSG_FLAG_RX_RTR;
                }
                if msg.flags & MSG_FLAG_EFF != 0 {
                    flags |= MSG_FLAG_RX_EFF;
                }
                state.rx_queue.push_back(RawCanMsg { flags, ..*msg });
            }
        }
        msgs.len() as i32
    }

    fn transmit_count(&self, _index: u32) -> i32 {
        0
    }

    fn set_speed(&self, index: u32, speed: u16) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::SetSpeed(index, speed));
        state.speed_code
    }

    fn set_mode(&self, index: u32, mode: u8, command: u16) -> i32 {
        let mut state = self.state();
        state.calls.push(Call::SetMode(index, mode, command));
        state.mode_code
    }

    fn set_rx_event_callback(&self, callback: Option<RxEventCallback>) {
        let mut state = self.state();
        state.calls.push(Call::SetCallback(callback.is_some()));
        state.callback = callback;
    }

    fn set_events(&self, mask: u16) {
        self.state().calls.push(Call::SetEvents(mask));
    }
}
