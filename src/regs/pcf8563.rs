//! NXP PCF8563 real-time clock/calendar.

#![allow(dead_code)]

use bitflags::bitflags;

use super::{Field, Register};

pub const I2C_ADDRESS: u8 = 0x51;

pub const CONTROL_STATUS_1: Register = Register::rw(0x00, "Control_status_1");

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlStatus1: u8 {
        /// Power-on-reset override.
        const TESTC = 1<<3;
        /// Clock stopped; all prescalers are held in reset.
        const STOP  = 1<<5;
        const TEST1 = 1<<7;
    }
}

pub const CONTROL_STATUS_2: Register = Register::rw(0x01, "Control_status_2");

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlStatus2: u8 {
        /// Timer interrupt enable.
        const TIE   = 1<<0;
        /// Alarm interrupt enable.
        const AIE   = 1<<1;
        /// Timer flag; cleared by writing 0.
        const TF    = 1<<2;
        /// Alarm flag; cleared by writing 0.
        const AF    = 1<<3;
        /// INT pulses while TF is active instead of following it.
        const TI_TP = 1<<4;
    }
}

/// Start of the seven time registers, seconds through years.
pub const ADDR_TIME: u8 = 0x02;

pub const VL_SECONDS: Register = Register::rw(0x02, "VL_seconds");
pub const VL: Field = Field::flag(VL_SECONDS, 7);
pub const CENTURY: u8 = 1<<7;

pub const MINUTE_ALARM: Register = Register::rw(0x09, "Minute_alarm");
pub const HOUR_ALARM: Register = Register::rw(0x0a, "Hour_alarm");
pub const DAY_ALARM: Register = Register::rw(0x0b, "Day_alarm");
pub const WEEKDAY_ALARM: Register = Register::rw(0x0c, "Weekday_alarm");
/// Set in an alarm register to exclude it from the alarm comparison.
pub const ALARM_DISABLE: u8 = 1<<7;

pub const CLKOUT_CONTROL: Register = Register::rw(0x0d, "CLKOUT_control");
pub const CLKOUT_FE: Field = Field::flag(CLKOUT_CONTROL, 7);
pub const CLKOUT_FD: Field = Field::new(CLKOUT_CONTROL, 0, 2);

pub const TIMER_CONTROL: Register = Register::rw(0x0e, "Timer_control");
pub const TIMER_TE: Field = Field::flag(TIMER_CONTROL, 7);
pub const TIMER_TD: Field = Field::new(TIMER_CONTROL, 0, 2);

pub const TIMER: Register = Register::rw(0x0f, "Timer");

/// The time registers as laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct TimeBlock {
    pub vl_seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub days: u8,
    pub weekdays: u8,
    pub century_months: u8,
    pub years: u8,
}
