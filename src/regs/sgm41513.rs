//! SG Micro SGM41513 I2C-controlled single-cell battery charger.

#![allow(dead_code)]

use super::{Field, Register};

pub const I2C_ADDRESS: u8 = 0x1a;

/// REG00, Input Source Control
pub const INPUT_SOURCE: Register = Register::rw(0x00, "REG00");
pub const EN_HIZ: Field = Field::flag(INPUT_SOURCE, 7);
pub const IINDPM: Field = Field::new(INPUT_SOURCE, 0, 5);

/// REG01, Power-On Configuration
pub const POWER_ON_CONFIG: Register = Register::rw(0x01, "REG01");
pub const CHG_CONFIG: Field = Field::flag(POWER_ON_CONFIG, 4);
pub const OTG_CONFIG: Field = Field::flag(POWER_ON_CONFIG, 5);
pub const WD_RST: Field = Field::flag(POWER_ON_CONFIG, 6);

/// REG02, Charge Current Control
pub const CHARGE_CURRENT: Register = Register::rw(0x02, "REG02");
pub const ICHG: Field = Field::new(CHARGE_CURRENT, 0, 6);

/// REG03, Pre-Charge/Termination Current Control
pub const PRECHARGE_TERM: Register = Register::rw(0x03, "REG03");
pub const IPRECHG: Field = Field::new(PRECHARGE_TERM, 4, 4);
pub const ITERM: Field = Field::new(PRECHARGE_TERM, 0, 4);

/// REG04, Charge Voltage Control
pub const CHARGE_VOLTAGE: Register = Register::rw(0x04, "REG04");
pub const VREG: Field = Field::new(CHARGE_VOLTAGE, 3, 5);

/// REG05, Charge Termination/Timer Control
pub const CHARGE_TERM_TIMER: Register = Register::rw(0x05, "REG05");
pub const EN_TERM: Field = Field::flag(CHARGE_TERM_TIMER, 7);
pub const WATCHDOG: Field = Field::new(CHARGE_TERM_TIMER, 4, 2);
pub const EN_TIMER: Field = Field::flag(CHARGE_TERM_TIMER, 3);

/// REG06, Boost Voltage/Thermal Regulation Control
pub const BOOST_THERMAL: Register = Register::rw(0x06, "REG06");
pub const BOOSTV: Field = Field::new(BOOST_THERMAL, 4, 2);

/// REG07, Misc Operation Control
pub const MISC_OPERATION: Register = Register::rw(0x07, "REG07");
pub const BATFET_DIS: Field = Field::flag(MISC_OPERATION, 5);

/// REG08, System Status
pub const SYSTEM_STATUS: Register = Register::ro(0x08, "REG08");
pub const VBUS_STAT: Field = Field::new(SYSTEM_STATUS, 5, 3);
pub const CHRG_STAT: Field = Field::new(SYSTEM_STATUS, 3, 2);
pub const PG_STAT: Field = Field::flag(SYSTEM_STATUS, 2);
pub const THERM_STAT: Field = Field::flag(SYSTEM_STATUS, 1);
pub const VSYS_STAT: Field = Field::flag(SYSTEM_STATUS, 0);

/// REG09, Fault
pub const FAULT: Register = Register::ro(0x09, "REG09");
pub const WATCHDOG_FAULT: Field = Field::flag(FAULT, 7);
pub const BOOST_FAULT: Field = Field::flag(FAULT, 6);
pub const CHRG_FAULT: Field = Field::new(FAULT, 4, 2);
pub const BAT_FAULT: Field = Field::flag(FAULT, 3);
pub const NTC_FAULT: Field = Field::new(FAULT, 0, 3);

/// REG0A, VINDPM Status
pub const VINDPM_STATUS: Register = Register::ro(0x0a, "REG0A");
pub const VBUS_GD: Field = Field::flag(VINDPM_STATUS, 7);
pub const VINDPM_STAT: Field = Field::flag(VINDPM_STATUS, 6);
pub const IINDPM_STAT: Field = Field::flag(VINDPM_STATUS, 5);
pub const TOPOFF_ACTIVE: Field = Field::flag(VINDPM_STATUS, 3);
pub const ACOV_STAT: Field = Field::flag(VINDPM_STATUS, 2);

/// REG0B, Part Information. Writing bit 7 resets all registers.
pub const PART_INFO: Register = Register::rw(0x0b, "REG0B");
pub const PN: Field = Field::new(PART_INFO, 3, 4);
pub const DEV_REV: Field = Field::new(PART_INFO, 0, 2);
pub const REG_RST: u8 = 1<<7;
