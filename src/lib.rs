mod sys;
mod bus;
mod regs;
mod config;
mod datetime;
mod pcf8563;
mod tcal6416;
mod es8156;
mod sgm41513;
mod cr95hf;
mod encoder;
mod board;

use std::io;

#[derive(Debug)]
pub enum Error {
    NotFound,
    Io(std::io::Error),
    BusPoisoned,
    InvalidAddress(u8),
    AddressInUse(u8),
    RegisterAccess { register: &'static str, access: regs::Access },
    InvalidArgument(&'static str),
    InvalidData(&'static str),
    UnexpectedChip { expected: u16, found: u16 },
    Timeout(&'static str),
    Nfc(String),
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NotFound =>
                write!(f, "device not connected"),
            Self::Io(io_error) =>
                write!(f, "bus I/O error: {}", io_error),
            Self::BusPoisoned =>
                write!(f, "bus lock poisoned by a panicking user"),
            Self::InvalidAddress(address) =>
                write!(f, "invalid 7-bit I2C address {:#04x}", address),
            Self::AddressInUse(address) =>
                write!(f, "I2C address {:#04x} is already claimed", address),
            Self::RegisterAccess { register, access } =>
                write!(f, "register {} is {:?}", register, access),
            Self::InvalidArgument(what) =>
                write!(f, "invalid argument: {}", what),
            Self::InvalidData(what) =>
                write!(f, "invalid data from device: {}", what),
            Self::UnexpectedChip { expected, found } =>
                write!(f, "unexpected chip ID {:#06x} (expected {:#06x})", found, expected),
            Self::Timeout(what) =>
                write!(f, "timeout waiting for {}", what),
            Self::Nfc(message) =>
                write!(f, "NFC transceiver: {}", message),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound => // converted from std::io::Error in first place
                Self::new(io::ErrorKind::NotFound, error),
            Error::Io(io_error) =>
                io_error,
            Error::Timeout(_) =>
                Self::new(io::ErrorKind::TimedOut, error),
            Error::Other(error) => {
                match error.downcast::<std::io::Error>() {
                    Ok(error) => *error,
                    Err(error) => std::io::Error::new(io::ErrorKind::Other, error)
                }
            }
            error =>
                Self::new(io::ErrorKind::Other, error),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Error::NotFound,
            _ => match error.downcast::<Self>() {
                Ok(error) => error,
                Err(error) => Error::Io(error),
            }
        }
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use sys::{I2cBus, SerialPort};

#[cfg(feature = "hardware")]
pub use sys::imp::{I2cDevImpl, SerialImpl, InputEncoderImpl};

pub use bus::{SharedBus, I2cDevice, Transaction};

pub use regs::{Access, Register, Field, RegisterAccess};

pub use config::{
    AudioConfiguration,
    BoardConfiguration,
    EncoderConfiguration,
    NfcConfiguration,
};

pub use datetime::{
    bcd_decode,
    bcd_encode,
    DateTime,
    Weekday,
};

pub use pcf8563::{
    Pcf8563,
    Alarm,
    TimerFrequency,
    ClockoutFrequency,
};

pub use tcal6416::{Tcal6416, Port};

pub use es8156::Es8156;

pub use sgm41513::{
    Sgm41513,
    PartInfo,
    VbusStatus,
    ChargeState,
    SystemStatus,
    ChargeFault,
    FaultStatus,
    VindpmStatus,
    WatchdogTimer,
    BoostVoltage,
};

pub use cr95hf::{Cr95hf, CardType, Tag};

pub use encoder::{Encoder, EncoderTracker};

pub use board::YotoMini;

#[cfg(feature = "hardware")]
pub type Board =
    board::YotoMini<sys::imp::I2cDevImpl, sys::imp::SerialImpl>;

#[cfg(test)]
mod test {
    const README: &str = include_str!("../README.md");

    fn list_after(heading: &str) -> Vec<&'static str> {
        README.lines()
            .skip_while(|line| !line.starts_with(heading))
            .skip(1)
            .skip_while(|line| line.trim().is_empty())
            .take_while(|line| line.starts_with("- "))
            .collect()
    }

    fn is_link(item: &str) -> bool {
        let item = item.trim_start_matches("- ");
        match (item.find("]("), item.ends_with(')')) {
            (Some(split), true) => {
                let url = &item[split + 2..item.len() - 1];
                item.starts_with('[') && url.starts_with("https://") && !url.contains(' ')
            }
            _ => false
        }
    }

    #[test]
    fn test_readme_single_title() {
        assert_eq!(README.lines().filter(|line| line.starts_with("# ")).count(), 1);
    }

    #[test]
    fn test_readme_dependencies() {
        let deps = list_after("## Dependencies");
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().all(|item| is_link(item)), "{:?}", deps);
    }

    #[test]
    fn test_readme_documentation() {
        let docs = list_after("## Documentation");
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|item| is_link(item)), "{:?}", docs);
    }

    #[test]
    fn test_io_error_round_trip() {
        let error = crate::Error::AddressInUse(0x51);
        let io_error = std::io::Error::from(error);
        match crate::Error::from(io_error) {
            crate::Error::AddressInUse(0x51) => (),
            error => panic!("unexpected {:?}", error),
        }
    }
}
