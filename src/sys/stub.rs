use std::io;
use crate::Result;
use crate::encoder::Encoder;

fn unsupported<T>() -> Result<T> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "no I2C/UART/input backend for this OS").into())
}

#[derive(Debug)]
pub struct I2cDevImpl;

impl I2cDevImpl {
    pub fn open(_device_path: &str) -> Result<I2cDevImpl> {
        unsupported()
    }
}

impl super::I2cBus for I2cDevImpl {
    fn write(&mut self, _address: u8, _data: &[u8]) -> Result<()> {
        unsupported()
    }

    fn read(&mut self, _address: u8, _data: &mut [u8]) -> Result<()> {
        unsupported()
    }

    fn write_read(&mut self, _address: u8, _output: &[u8], _input: &mut [u8]) -> Result<()> {
        unsupported()
    }
}

#[derive(Debug)]
pub struct SerialImpl;

impl SerialImpl {
    pub fn open(_device_path: &str, _baud_rate: u32) -> Result<SerialImpl> {
        unsupported()
    }
}

impl super::SerialPort for SerialImpl {
    fn write(&mut self, _data: &[u8]) -> Result<()> {
        unsupported()
    }

    fn read(&mut self, _data: &mut [u8]) -> Result<usize> {
        unsupported()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        unsupported()
    }
}

#[derive(Debug)]
pub struct InputEncoderImpl;

impl InputEncoderImpl {
    pub fn open(_device_path: &str, _axis: u16) -> Result<InputEncoderImpl> {
        unsupported()
    }
}

impl Encoder for InputEncoderImpl {
    fn position(&mut self) -> Result<i32> {
        unsupported()
    }
}
