//! 16-bit I/O expander driver.

use crate::{Error, Result};
use crate::bus::I2cDevice;
use crate::regs::RegisterAccess;
use crate::regs::tcal6416 as regs;
use crate::sys::I2cBus;

/// Direction of port 0 on the Yoto Mini: P0_7, P0_5 and P0_4 are inputs, the rest are
/// outputs (P0_2 holds the amplifier in reset while low).
const YOTO_MINI_DIRECTION_P0: u8 = 0xb0;
/// Direction of port 1 on the Yoto Mini: P1_6 and P1_4 are outputs.
const YOTO_MINI_DIRECTION_P1: u8 = 0xaf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    P0 = 0,
    P1 = 1,
}

impl Port {
    /// Port and bit index of pin `0..=15`.
    pub fn of_pin(pin: u8) -> Result<(Port, u8)> {
        match pin {
            0..=7  => Ok((Port::P0, pin)),
            8..=15 => Ok((Port::P1, pin - 8)),
            _ => Err(Error::InvalidArgument("pin out of range"))
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug)]
pub struct Tcal6416<B: I2cBus> {
    device: I2cDevice<B>,
    output: [u8; 2],
}

impl<B: I2cBus> Tcal6416<B> {
    pub fn new(device: I2cDevice<B>) -> Tcal6416<B> {
        Tcal6416 { device, output: [0x00; 2] }
    }

    /// Set the direction of each pin of `port`; 1 makes the pin an input.
    pub fn configure_port_direction(&mut self, port: Port, direction: u8) -> Result<()> {
        self.device.write_u8(&regs::CONFIGURATION[port.index()], direction)
    }

    pub fn port_direction(&mut self, port: Port) -> Result<u8> {
        self.device.read_u8(&regs::CONFIGURATION[port.index()])
    }

    pub fn set_port_output(&mut self, port: Port, value: u8) -> Result<()> {
        self.output[port.index()] = value;
        self.device.write_u8(&regs::OUTPUT_PORT[port.index()], value)
    }

    pub fn port_output(&self, port: Port) -> u8 {
        self.output[port.index()]
    }

    /// Invert the sense of input pins of `port` whose bit is 1.
    pub fn set_polarity_inversion(&mut self, port: Port, value: u8) -> Result<()> {
        self.device.write_u8(&regs::POLARITY_INVERSION[port.index()], value)
    }

    pub fn read_port(&mut self, port: Port) -> Result<u8> {
        self.device.read_u8(&regs::INPUT_PORT[port.index()])
    }

    pub fn set_pin(&mut self, pin: u8, high: bool) -> Result<()> {
        let (port, bit) = Port::of_pin(pin)?;
        let mut value = self.output[port.index()];
        if high {
            value |= 1 << bit;
        } else {
            value &= !(1 << bit);
        }
        self.set_port_output(port, value)
    }

    pub fn pin(&mut self, pin: u8) -> Result<bool> {
        let (port, bit) = Port::of_pin(pin)?;
        Ok(self.read_port(port)? & (1 << bit) != 0)
    }

    pub fn configure_yoto_mini_defaults(&mut self) -> Result<()> {
        let previous = (self.port_direction(Port::P0)?, self.port_direction(Port::P1)?);
        log::debug!("configuring I/O expander: was {:#04x}/{:#04x}", previous.0, previous.1);
        self.configure_port_direction(Port::P0, YOTO_MINI_DIRECTION_P0)?;
        self.configure_port_direction(Port::P1, YOTO_MINI_DIRECTION_P1)?;
        if self.port_direction(Port::P0)? != YOTO_MINI_DIRECTION_P0 ||
                self.port_direction(Port::P1)? != YOTO_MINI_DIRECTION_P1 {
            return Err(Error::InvalidData("I/O expander direction did not read back"))
        }
        // all outputs low; this keeps the amplifier in reset
        self.set_port_output(Port::P0, 0x00)?;
        self.set_port_output(Port::P1, 0x00)?;
        Ok(())
    }
}
