use std::ffi::{CStr, CString};
use std::io;
use std::mem::{self, MaybeUninit};
use libc::{c_int, c_void};
use crate::{Error, Result};
use crate::encoder::{Encoder, InputAxis};

// From <linux/i2c-dev.h> and <linux/i2c.h>.
const I2C_RDWR: libc::c_ulong = 0x0707;
const I2C_M_RD: u16 = 0x0001;

const WRITE_TIMEOUT_MS: c_int = 1000;

// _IOR('E', 0x40 + axis, struct input_absinfo), from <linux/input.h>.
fn eviocgabs(axis: u16) -> libc::c_ulong {
    const IOC_READ: libc::c_ulong = 2;
    let size = mem::size_of::<libc::input_absinfo>() as libc::c_ulong;
    IOC_READ << 30 | size << 16 | (b'E' as libc::c_ulong) << 8 | (0x40 + axis as libc::c_ulong)
}

#[repr(C)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

#[derive(Debug)]
struct Fd(c_int);

impl Fd {
    fn open(path: &CStr, flags: c_int) -> io::Result<Fd> {
        unsafe {
            let fd = libc::open(path.as_ptr(), flags);
            if fd == -1 {
                Err(io::Error::last_os_error())
            } else {
                Ok(Fd(fd))
            }
        }
    }

    fn read(&self, data: &mut [u8]) -> io::Result<usize> {
        unsafe {
            let bytes_read = libc::read(self.0, data.as_mut_ptr() as *mut c_void, data.len());
            if bytes_read == -1 {
                let error = io::Error::last_os_error();
                match error.kind() {
                    io::ErrorKind::WouldBlock => Ok(0),
                    _ => Err(error)
                }
            } else {
                Ok(bytes_read as usize)
            }
        }
    }

    fn write_all(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            let bytes_written = unsafe {
                libc::write(self.0, data.as_ptr() as *const c_void, data.len())
            };
            if bytes_written == -1 {
                let error = io::Error::last_os_error();
                match error.kind() {
                    io::ErrorKind::WouldBlock => {
                        self.wait_writable(WRITE_TIMEOUT_MS)?;
                        continue
                    }
                    io::ErrorKind::Interrupted => continue,
                    _ => return Err(error)
                }
            }
            data = &data[bytes_written as usize..];
        }
        Ok(())
    }

    fn wait_writable(&self, timeout_ms: c_int) -> io::Result<()> {
        let mut pollfd = libc::pollfd { fd: self.0, events: libc::POLLOUT, revents: 0 };
        match unsafe { libc::poll(&mut pollfd, 1, timeout_ms) } {
            -1 => {
                let error = io::Error::last_os_error();
                match error.kind() {
                    io::ErrorKind::Interrupted => Ok(()),
                    _ => Err(error)
                }
            }
            0 => Err(io::Error::new(io::ErrorKind::TimedOut, "device not ready for writing")),
            _ => Ok(())
        }
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe {
            if libc::close(self.0) == -1 {
                panic!("error closing fd: {}", io::Error::last_os_error())
            }
        }
    }
}

fn c_path(path: &str) -> Result<CString> {
    CString::new(path).map_err(|_| Error::InvalidArgument("device path contains NUL"))
}

/// An I2C adapter exposed by the `i2c-dev` kernel module, e.g. `/dev/i2c-0`.
#[derive(Debug)]
pub struct I2cDevImpl {
    fd: Fd,
}

impl I2cDevImpl {
    pub fn open(device_path: &str) -> Result<I2cDevImpl> {
        let fd = Fd::open(c_path(device_path)?.as_ref(), libc::O_RDWR)?;
        log::debug!("opened I2C adapter {}", device_path);
        Ok(I2cDevImpl { fd })
    }

    fn transfer(&self, msgs: &mut [I2cMsg]) -> Result<()> {
        let mut data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };
        unsafe {
            if libc::ioctl(self.fd.0, I2C_RDWR as _, &mut data as *mut I2cRdwrIoctlData) == -1 {
                return Err(io::Error::last_os_error().into())
            }
        }
        Ok(())
    }

    fn message(address: u8, flags: u16, buf: *mut u8, len: usize) -> Result<I2cMsg> {
        let len = u16::try_from(len).map_err(|_| Error::InvalidArgument("I2C message too long"))?;
        Ok(I2cMsg { addr: address as u16, flags, len, buf })
    }
}

impl super::I2cBus for I2cDevImpl {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        // the kernel never writes through the buffer of a message without I2C_M_RD
        self.transfer(&mut [
            Self::message(address, 0, data.as_ptr() as *mut u8, data.len())?,
        ])
    }

    fn read(&mut self, address: u8, data: &mut [u8]) -> Result<()> {
        self.transfer(&mut [
            Self::message(address, I2C_M_RD, data.as_mut_ptr(), data.len())?,
        ])
    }

    fn write_read(&mut self, address: u8, output: &[u8], input: &mut [u8]) -> Result<()> {
        self.transfer(&mut [
            Self::message(address, 0, output.as_ptr() as *mut u8, output.len())?,
            Self::message(address, I2C_M_RD, input.as_mut_ptr(), input.len())?,
        ])
    }
}

/// A termios UART in raw mode with two stop bits, e.g. `/dev/ttyS1`.
#[derive(Debug)]
pub struct SerialImpl {
    fd: Fd,
}

impl SerialImpl {
    pub fn open(device_path: &str, baud_rate: u32) -> Result<SerialImpl> {
        let speed = match baud_rate {
            9600 => libc::B9600,
            19200 => libc::B19200,
            38400 => libc::B38400,
            57600 => libc::B57600,
            115200 => libc::B115200,
            _ => return Err(Error::InvalidArgument("unsupported baud rate"))
        };
        let fd = Fd::open(c_path(device_path)?.as_ref(),
            libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK)?;
        unsafe {
            let mut termios = MaybeUninit::<libc::termios>::uninit();
            if libc::tcgetattr(fd.0, termios.as_mut_ptr()) == -1 {
                return Err(io::Error::last_os_error().into())
            }
            let mut termios = termios.assume_init();
            libc::cfmakeraw(&mut termios);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8 | libc::CSTOPB | libc::CLOCAL | libc::CREAD;
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 0;
            if libc::cfsetispeed(&mut termios, speed) == -1 ||
                    libc::cfsetospeed(&mut termios, speed) == -1 {
                return Err(io::Error::last_os_error().into())
            }
            if libc::tcsetattr(fd.0, libc::TCSANOW, &termios) == -1 {
                return Err(io::Error::last_os_error().into())
            }
        }
        log::debug!("opened UART {} at {} baud, 8N2", device_path, baud_rate);
        Ok(SerialImpl { fd })
    }
}

impl super::SerialPort for SerialImpl {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.fd.write_all(data)?;
        unsafe {
            if libc::tcdrain(self.fd.0) == -1 {
                return Err(io::Error::last_os_error().into())
            }
        }
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        Ok(self.fd.read(data)?)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut count: c_int = 0;
        unsafe {
            if libc::ioctl(self.fd.0, libc::FIONREAD as _, &mut count as *mut c_int) == -1 {
                return Err(io::Error::last_os_error().into())
            }
        }
        Ok(count.max(0) as usize)
    }
}

/// A rotary encoder bound to the kernel `rotary-encoder` input driver, e.g. `/dev/input/event1`.
#[derive(Debug)]
pub struct InputEncoderImpl {
    fd: Fd,
    axis: InputAxis,
}

impl InputEncoderImpl {
    pub fn open(device_path: &str, axis: u16) -> Result<InputEncoderImpl> {
        let fd = Fd::open(c_path(device_path)?.as_ref(), libc::O_RDONLY | libc::O_NONBLOCK)?;
        let mut input_axis = InputAxis::new(axis);
        // only absolute axes have a current value to start from
        let mut absinfo = MaybeUninit::<libc::input_absinfo>::uninit();
        unsafe {
            if libc::ioctl(fd.0, eviocgabs(axis) as _, absinfo.as_mut_ptr()) != -1 {
                input_axis.apply(crate::encoder::EV_ABS, axis, absinfo.assume_init().value);
            }
        }
        log::debug!("opened encoder {} axis {} at {}", device_path, axis, input_axis.position());
        Ok(InputEncoderImpl { fd, axis: input_axis })
    }
}

impl Encoder for InputEncoderImpl {
    fn position(&mut self) -> Result<i32> {
        const EVENT_SIZE: usize = mem::size_of::<libc::input_event>();
        let mut buffer = [0u8; EVENT_SIZE * 16];
        loop {
            let bytes_read = self.fd.read(&mut buffer)?;
            for chunk in buffer[..bytes_read].chunks_exact(EVENT_SIZE) {
                let event = unsafe {
                    std::ptr::read_unaligned(chunk.as_ptr() as *const libc::input_event)
                };
                self.axis.apply(event.type_, event.code, event.value);
            }
            if bytes_read < buffer.len() {
                break
            }
        }
        Ok(self.axis.position())
    }
}
