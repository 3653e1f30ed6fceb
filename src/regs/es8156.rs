//! Everest ES8156 I2S DAC, page 0.

#![allow(dead_code)]

use super::{Field, Register};

pub const I2C_ADDRESS: u8 = 0x08;

pub const CHIP_ID: u16 = 0x8155;

pub const RESET_CONTROL: Register = Register::rw(0x00, "RESET_CONTROL");
pub const MAIN_CLOCK_CONTROL: Register = Register::rw(0x01, "MAIN_CLOCK_CONTROL");
pub const MODE_CONFIG_1: Register = Register::rw(0x02, "MODE_CONFIG_1");
pub const MISC_CONTROL_1: Register = Register::rw(0x07, "MISC_CONTROL_1");
pub const CLOCK_OFF: Register = Register::rw(0x08, "CLOCK_OFF");
pub const MISC_CONTROL_2: Register = Register::rw(0x09, "MISC_CONTROL_2");
pub const TIME_CONTROL_1: Register = Register::rw(0x0a, "TIME_CONTROL_1");
pub const TIME_CONTROL_2: Register = Register::rw(0x0b, "TIME_CONTROL_2");
pub const CHIP_STATUS: Register = Register::ro(0x0c, "CHIP_STATUS");
pub const P2S_CONTROL: Register = Register::rw(0x0d, "P2S_CONTROL");
pub const SDP_INTERFACE_CONFIG_1: Register = Register::rw(0x11, "SDP_INTERFACE_CONFIG_1");
pub const MUTE_CONTROL: Register = Register::rw(0x13, "MUTE_CONTROL");
pub const VOLUME_CONTROL: Register = Register::rw(0x14, "VOLUME_CONTROL");
pub const MISC_CONTROL_3: Register = Register::rw(0x18, "MISC_CONTROL_3");
pub const ANALOG_SYSTEM: [Register; 6] = [
    Register::rw(0x20, "ANALOG_SYSTEM_1"),
    Register::rw(0x21, "ANALOG_SYSTEM_2"),
    Register::rw(0x22, "ANALOG_SYSTEM_3"),
    Register::rw(0x23, "ANALOG_SYSTEM_4"),
    Register::rw(0x24, "ANALOG_SYSTEM_5"),
    Register::rw(0x25, "ANALOG_SYSTEM_6"),
];
pub const PAGE_SELECT: Register = Register::rw(0xfc, "PAGE_SELECT");
pub const CHIP_ID1: Register = Register::ro(0xfd, "CHIP_ID1");
pub const CHIP_ID0: Register = Register::ro(0xfe, "CHIP_ID0");
pub const CHIP_VERSION: Register = Register::ro(0xff, "CHIP_VERSION");

pub const PAGE: Field = Field::flag(PAGE_SELECT, 0);
pub const LEFT_MUTE: Field = Field::flag(MUTE_CONTROL, 1);
pub const RIGHT_MUTE: Field = Field::flag(MUTE_CONTROL, 2);
pub const OUT_MUTE: Field = Field::flag(ANALOG_SYSTEM[2], 0);
pub const VERSION: Field = Field::new(CHIP_VERSION, 4, 4);
