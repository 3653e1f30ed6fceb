//! Register access layer: maps logical device registers onto I2C transactions.

use crate::{Error, Result};
use crate::bus::I2cDevice;
use crate::sys::I2cBus;

pub mod pcf8563;
pub mod tcal6416;
pub mod es8156;
pub mod sgm41513;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    pub fn readable(self) -> bool {
        self != Access::WriteOnly
    }

    pub fn writable(self) -> bool {
        self != Access::ReadOnly
    }
}

/// A device register. Registers wider than one byte are transferred big-endian, in one
/// transaction starting at `addr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub addr: u8,
    pub width: u8,
    pub access: Access,
    pub name: &'static str,
}

impl Register {
    pub const fn new(addr: u8, width: u8, access: Access, name: &'static str) -> Register {
        assert!(width >= 1 && width <= 4);
        Register { addr, width, access, name }
    }

    pub const fn ro(addr: u8, name: &'static str) -> Register {
        Register::new(addr, 1, Access::ReadOnly, name)
    }

    pub const fn wo(addr: u8, name: &'static str) -> Register {
        Register::new(addr, 1, Access::WriteOnly, name)
    }

    pub const fn rw(addr: u8, name: &'static str) -> Register {
        Register::new(addr, 1, Access::ReadWrite, name)
    }

    fn max_value(&self) -> u32 {
        u32::MAX >> (32 - 8 * self.width as u32)
    }

    fn check(&self, needed: Access) -> Result<()> {
        let allowed = match needed {
            Access::ReadOnly => self.access.readable(),
            Access::WriteOnly => self.access.writable(),
            Access::ReadWrite => self.access == Access::ReadWrite,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::RegisterAccess { register: self.name, access: self.access })
        }
    }
}

/// A contiguous bit-field of a single-byte register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub reg: Register,
    pub shift: u8,
    pub bits: u8,
}

impl Field {
    pub const fn new(reg: Register, shift: u8, bits: u8) -> Field {
        assert!(reg.width == 1 && bits >= 1 && shift + bits <= 8);
        Field { reg, shift, bits }
    }

    pub const fn flag(reg: Register, bit: u8) -> Field {
        Field::new(reg, bit, 1)
    }

    pub fn mask(&self) -> u8 {
        (((1u16 << self.bits) - 1) << self.shift) as u8
    }

    pub fn extract(&self, value: u8) -> u8 {
        (value & self.mask()) >> self.shift
    }

    pub fn insert(&self, value: u8, field: u8) -> u8 {
        (value & !self.mask()) | ((field << self.shift) & self.mask())
    }
}

pub trait RegisterAccess {
    fn read_block(&self, start: u8, data: &mut [u8]) -> Result<()>;
    fn write_block(&self, start: u8, data: &[u8]) -> Result<()>;

    fn read_register(&self, reg: &Register) -> Result<u32> {
        reg.check(Access::ReadOnly)?;
        let mut bytes = [0u8; 4];
        let bytes = &mut bytes[4 - reg.width as usize..];
        self.read_block(reg.addr, bytes)?;
        let value = bytes.iter().fold(0u32, |acc, &byte| acc << 8 | byte as u32);
        log::debug!("read_register({}@{:#04x}) = {:#x}", reg.name, reg.addr, value);
        Ok(value)
    }

    fn write_register(&self, reg: &Register, value: u32) -> Result<()> {
        reg.check(Access::WriteOnly)?;
        if value > reg.max_value() {
            return Err(Error::InvalidArgument("value does not fit register"))
        }
        log::debug!("write_register({}@{:#04x}, {:#x})", reg.name, reg.addr, value);
        let bytes = value.to_be_bytes();
        self.write_block(reg.addr, &bytes[4 - reg.width as usize..])
    }

    fn modify_register<F: FnOnce(u32) -> u32>(&self, reg: &Register, f: F) -> Result<()> {
        reg.check(Access::ReadWrite)?;
        let value = self.read_register(reg)?;
        self.write_register(reg, f(value))
    }

    fn read_u8(&self, reg: &Register) -> Result<u8> {
        Ok(self.read_register(reg)? as u8)
    }

    fn write_u8(&self, reg: &Register, value: u8) -> Result<()> {
        self.write_register(reg, value as u32)
    }

    fn read_field(&self, field: &Field) -> Result<u8> {
        Ok(field.extract(self.read_u8(&field.reg)?))
    }

    fn write_field(&self, field: &Field, value: u8) -> Result<()> {
        if value as u16 >= 1 << field.bits {
            return Err(Error::InvalidArgument("value does not fit field"))
        }
        self.modify_register(&field.reg, |reg| field.insert(reg as u8, value) as u32)
    }

    fn read_flag(&self, field: &Field) -> Result<bool> {
        Ok(self.read_field(field)? != 0)
    }

    fn write_flag(&self, field: &Field, value: bool) -> Result<()> {
        self.write_field(field, value as u8)
    }
}

impl<B: I2cBus> RegisterAccess for I2cDevice<B> {
    fn read_block(&self, start: u8, data: &mut [u8]) -> Result<()> {
        self.write_read(&[start], data)
    }

    fn write_block(&self, start: u8, data: &[u8]) -> Result<()> {
        let mut packet = Vec::with_capacity(data.len() + 1);
        packet.push(start);
        packet.extend_from_slice(data);
        self.write(&packet)
    }
}
