use crate::Result;

/// Raw access to an I2C bus controller.
///
/// Addresses are 7-bit. Each method is a single bus transaction from START to STOP.
pub trait I2cBus: Send {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<()>;
    fn read(&mut self, address: u8, data: &mut [u8]) -> Result<()>;

    /// Write `output`, then read into `input` after a repeated START.
    fn write_read(&mut self, address: u8, output: &[u8], input: &mut [u8]) -> Result<()>;
}

/// Raw access to a UART.
pub trait SerialPort: Send {
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever is available without blocking; returns the number of bytes read.
    fn read(&mut self, data: &mut [u8]) -> Result<usize>;

    fn bytes_available(&mut self) -> Result<usize>;
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
#[path = "linux.rs"]
pub mod imp;

#[cfg(all(feature = "hardware", not(target_os = "linux")))]
#[path = "stub.rs"]
pub mod imp;

#[cfg(test)]
pub mod mock;
