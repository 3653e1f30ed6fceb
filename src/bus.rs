//! Serialized access to a shared I2C bus and arbitration of device addresses.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Error, Result};
use crate::sys::I2cBus;

struct BusState<B: I2cBus> {
    bus: B,
    claimed: u128, // one bit per 7-bit address
}

/// A handle to one physical I2C bus. Clones refer to the same bus.
pub struct SharedBus<B: I2cBus> {
    state: Arc<Mutex<BusState<B>>>,
}

impl<B: I2cBus> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        SharedBus { state: self.state.clone() }
    }
}

impl<B: I2cBus> fmt::Debug for SharedBus<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let claimed = self.claimed();
        f.debug_struct("SharedBus").field("claimed", &claimed).finish()
    }
}

fn validate_address(address: u8) -> Result<()> {
    // 0x00..=0x07 and 0x78..=0x7f are reserved I2C addresses
    if (0x08..=0x77).contains(&address) {
        Ok(())
    } else {
        Err(Error::InvalidAddress(address))
    }
}

impl<B: I2cBus> SharedBus<B> {
    pub fn new(bus: B) -> SharedBus<B> {
        SharedBus {
            state: Arc::new(Mutex::new(BusState { bus, claimed: 0 }))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusState<B>>> {
        self.state.lock().map_err(|_| Error::BusPoisoned)
    }

    /// Claim `address` for exclusive use by the returned device handle.
    pub fn device(&self, address: u8) -> Result<I2cDevice<B>> {
        validate_address(address)?;
        let mut state = self.lock()?;
        if state.claimed & (1 << address) != 0 {
            return Err(Error::AddressInUse(address))
        }
        state.claimed |= 1 << address;
        log::debug!("claimed I2C address {:#04x}", address);
        Ok(I2cDevice { bus: self.clone(), address })
    }

    // readable on a poisoned bus; the bitmap is never changed inside a transaction
    fn claims(&self) -> u128 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).claimed
    }

    pub fn is_claimed(&self, address: u8) -> bool {
        address < 0x80 && self.claims() & (1 << address) != 0
    }

    /// Claimed addresses in ascending order.
    pub fn claimed(&self) -> Vec<u8> {
        let claims = self.claims();
        (0..0x80u8).filter(|&addr| claims & (1 << addr) != 0).collect()
    }

    fn release(&self, address: u8) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.claimed &= !(1 << address);
        log::debug!("released I2C address {:#04x}", address);
    }
}

/// Exclusive handle to the device at one address on a [`SharedBus`].
///
/// The address is released when the handle is dropped.
pub struct I2cDevice<B: I2cBus> {
    bus: SharedBus<B>,
    address: u8,
}

impl<B: I2cBus> fmt::Debug for I2cDevice<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("I2cDevice").field("address", &format_args!("{:#04x}", self.address)).finish()
    }
}

impl<B: I2cBus> Drop for I2cDevice<B> {
    fn drop(&mut self) {
        self.bus.release(self.address)
    }
}

impl<B: I2cBus> I2cDevice<B> {
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Run `f` with the bus locked, so that no other device can interleave transfers.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
        where F: FnOnce(&mut Transaction<'_, B>) -> Result<T>
    {
        let mut state = self.bus.lock()?;
        let mut transaction = Transaction { bus: &mut state.bus, address: self.address };
        f(&mut transaction)
    }

    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.transaction(|t| t.write(data))
    }

    pub fn read(&self, data: &mut [u8]) -> Result<()> {
        self.transaction(|t| t.read(data))
    }

    pub fn write_read(&self, output: &[u8], input: &mut [u8]) -> Result<()> {
        self.transaction(|t| t.write_read(output, input))
    }
}

/// Transfers to one device while the bus is locked.
pub struct Transaction<'a, B: I2cBus> {
    bus: &'a mut B,
    address: u8,
}

impl<'a, B: I2cBus> Transaction<'a, B> {
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        log::trace!("i2c_write({:#04x}, {:02x?})", self.address, data);
        self.bus.write(self.address, data)
    }

    pub fn read(&mut self, data: &mut [u8]) -> Result<()> {
        self.bus.read(self.address, data)?;
        log::trace!("i2c_read({:#04x}) = {:02x?}", self.address, data);
        Ok(())
    }

    pub fn write_read(&mut self, output: &[u8], input: &mut [u8]) -> Result<()> {
        self.bus.write_read(self.address, output, input)?;
        log::trace!("i2c_write_read({:#04x}, {:02x?}) = {:02x?}", self.address, output, input);
        Ok(())
    }
}
