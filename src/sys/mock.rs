//! In-memory bus and UART used by the unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write(u8, Vec<u8>),
    Read(u8, usize),
    WriteRead(u8, Vec<u8>, usize),
}

#[derive(Debug)]
struct Registers {
    data: [u8; 256],
    pointer: u8,
}

impl Registers {
    fn write(&mut self, bytes: &[u8]) {
        if let Some((&pointer, values)) = bytes.split_first() {
            self.pointer = pointer;
            for &value in values {
                self.data[self.pointer as usize] = value;
                self.pointer = self.pointer.wrapping_add(1);
            }
        }
    }

    fn read(&mut self, bytes: &mut [u8]) {
        for byte in bytes {
            *byte = self.data[self.pointer as usize];
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

#[derive(Debug, Default)]
struct I2cState {
    devices: BTreeMap<u8, Registers>,
    log: Vec<Op>,
}

/// A bus of register-file devices with an auto-incrementing register pointer, the way
/// most I2C peripherals behave: the first written byte selects the register.
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    state: Arc<Mutex<I2cState>>,
}

impl MockI2c {
    pub fn new() -> MockI2c {
        Default::default()
    }

    pub fn with_device(self, address: u8, registers: &[(u8, u8)]) -> MockI2c {
        {
            let mut state = self.state.lock().unwrap();
            let device = state.devices.entry(address)
                .or_insert(Registers { data: [0; 256], pointer: 0 });
            for &(reg, value) in registers {
                device.data[reg as usize] = value;
            }
        }
        self
    }

    pub fn remove_device(&self, address: u8) {
        self.state.lock().unwrap().devices.remove(&address);
    }

    pub fn set_register(&self, address: u8, reg: u8, value: u8) {
        let mut state = self.state.lock().unwrap();
        state.devices.get_mut(&address).expect("no such device").data[reg as usize] = value;
    }

    pub fn register(&self, address: u8, reg: u8) -> u8 {
        let state = self.state.lock().unwrap();
        state.devices.get(&address).expect("no such device").data[reg as usize]
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear()
    }

    /// Payloads of every plain write to `address`, in order.
    pub fn writes_to(&self, address: u8) -> Vec<Vec<u8>> {
        self.log().into_iter()
            .filter_map(|op| match op {
                Op::Write(op_address, data) if op_address == address => Some(data),
                _ => None
            })
            .collect()
    }

    fn device<'a>(state: &'a mut I2cState, address: u8) -> Result<&'a mut Registers> {
        state.devices.get_mut(&address)
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::Other,
                format!("no acknowledge from {:#04x}", address))))
    }
}

impl super::I2cBus for MockI2c {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Op::Write(address, data.to_vec()));
        Self::device(&mut state, address)?.write(data);
        Ok(())
    }

    fn read(&mut self, address: u8, data: &mut [u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Op::Read(address, data.len()));
        Self::device(&mut state, address)?.read(data);
        Ok(())
    }

    fn write_read(&mut self, address: u8, output: &[u8], input: &mut [u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Op::WriteRead(address, output.to_vec(), input.len()));
        let device = Self::device(&mut state, address)?;
        device.write(output);
        device.read(input);
        Ok(())
    }
}

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

struct SerialState {
    rx: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    responder: Responder,
}

/// A UART whose peer answers every `write` call through a closure.
#[derive(Clone)]
pub struct MockSerial {
    state: Arc<Mutex<SerialState>>,
}

impl MockSerial {
    pub fn new<F: FnMut(&[u8]) -> Vec<u8> + Send + 'static>(responder: F) -> MockSerial {
        MockSerial {
            state: Arc::new(Mutex::new(SerialState {
                rx: VecDeque::new(),
                written: Vec::new(),
                responder: Box::new(responder),
            }))
        }
    }

    /// Every `write` call except wake-up padding (all-zero frames).
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.iter()
            .filter(|frame| frame.iter().any(|&byte| byte != 0))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().written.clear()
    }
}

impl super::SerialPort for MockSerial {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.written.push(data.to_vec());
        let response = (state.responder)(data);
        state.rx.extend(response);
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let count = data.len().min(state.rx.len());
        for (byte, received) in data.iter_mut().zip(state.rx.drain(..count)) {
            *byte = received;
        }
        Ok(count)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.state.lock().unwrap().rx.len())
    }
}
