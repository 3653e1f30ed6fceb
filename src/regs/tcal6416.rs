//! TI TCAL6416 (TCA6416A compatible) 16-bit I/O expander.

use super::Register;

pub const I2C_ADDRESS: u8 = 0x20;

pub const INPUT_PORT: [Register; 2] = [
    Register::ro(0x00, "INPUT_PORT_0"),
    Register::ro(0x01, "INPUT_PORT_1"),
];

pub const OUTPUT_PORT: [Register; 2] = [
    Register::rw(0x02, "OUTPUT_PORT_0"),
    Register::rw(0x03, "OUTPUT_PORT_1"),
];

pub const POLARITY_INVERSION: [Register; 2] = [
    Register::rw(0x04, "POLARITY_INV_PORT_0"),
    Register::rw(0x05, "POLARITY_INV_PORT_1"),
];

/// Direction registers; a set bit makes the pin an input.
pub const CONFIGURATION: [Register; 2] = [
    Register::rw(0x06, "CONFIG_PORT_0"),
    Register::rw(0x07, "CONFIG_PORT_1"),
];
