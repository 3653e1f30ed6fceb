//! Real-time clock driver.

use crate::{Error, Result};
use crate::bus::I2cDevice;
use crate::datetime::{bcd_decode, bcd_encode, DateTime, Weekday};
use crate::regs::RegisterAccess;
use crate::regs::pcf8563::{self as regs, ControlStatus1, ControlStatus2, TimeBlock};
use crate::sys::I2cBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerFrequency {
    Hz4096,
    Hz64,
    Hz1,
    #[default]
    PerMinute,
}

impl TimerFrequency {
    pub(crate) fn pcf8563_code(self) -> u8 {
        match self {
            Self::Hz4096    => 0b00,
            Self::Hz64      => 0b01,
            Self::Hz1       => 0b10,
            Self::PerMinute => 0b11,
        }
    }

    pub(crate) fn from_pcf8563_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Hz4096,
            0b01 => Self::Hz64,
            0b10 => Self::Hz1,
            _    => Self::PerMinute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockoutFrequency {
    #[default]
    Hz32768,
    Hz1024,
    Hz32,
    Hz1,
}

impl ClockoutFrequency {
    pub(crate) fn pcf8563_code(self) -> u8 {
        match self {
            Self::Hz32768 => 0b00,
            Self::Hz1024  => 0b01,
            Self::Hz32    => 0b10,
            Self::Hz1     => 0b11,
        }
    }

    pub(crate) fn from_pcf8563_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Hz32768,
            0b01 => Self::Hz1024,
            0b10 => Self::Hz32,
            _    => Self::Hz1,
        }
    }
}

/// Alarm match condition. The alarm fires when every field that is `Some` matches the
/// current time; an alarm with every field `None` never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alarm {
    pub minute: Option<u8>,
    pub hour: Option<u8>,
    pub day: Option<u8>,
    pub weekday: Option<Weekday>,
}

fn decode_alarm(raw: u8, mask: u8, range: std::ops::RangeInclusive<u8>, what: &'static str)
        -> Result<Option<u8>> {
    if raw & regs::ALARM_DISABLE != 0 {
        return Ok(None)
    }
    match bcd_decode(raw & mask)? {
        value if range.contains(&value) => Ok(Some(value)),
        _ => Err(Error::InvalidData(what)),
    }
}

fn encode_alarm(value: Option<u8>, range: std::ops::RangeInclusive<u8>, what: &'static str)
        -> Result<u8> {
    match value {
        None => Ok(regs::ALARM_DISABLE),
        Some(value) if range.contains(&value) => bcd_encode(value),
        Some(_) => Err(Error::InvalidArgument(what)),
    }
}

#[derive(Debug)]
pub struct Pcf8563<B: I2cBus> {
    device: I2cDevice<B>,
}

impl<B: I2cBus> Pcf8563<B> {
    pub fn new(device: I2cDevice<B>) -> Pcf8563<B> {
        Pcf8563 { device }
    }

    pub fn datetime(&mut self) -> Result<DateTime> {
        let mut block = TimeBlock::default();
        self.device.read_block(regs::ADDR_TIME, bytemuck::bytes_of_mut(&mut block))?;
        let century = if block.century_months & regs::CENTURY != 0 { 2100 } else { 2000 };
        let datetime = DateTime::new(
            century + bcd_decode(block.years)? as u16,
            bcd_decode(block.century_months & 0x1f)?,
            bcd_decode(block.days & 0x3f)?,
            bcd_decode(block.hours & 0x3f)?,
            bcd_decode(block.minutes & 0x7f)?,
            bcd_decode(block.vl_seconds & 0x7f)?,
        ).map_err(|_| Error::InvalidData("time registers out of range"))?;
        log::debug!("datetime() = {}", datetime);
        Ok(datetime)
    }

    /// Set the time. This also clears the voltage-low flag.
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<()> {
        log::debug!("set_datetime({})", datetime);
        let century = if datetime.year() >= 2100 { regs::CENTURY } else { 0 };
        let block = TimeBlock {
            vl_seconds: bcd_encode(datetime.second())?,
            minutes: bcd_encode(datetime.minute())?,
            hours: bcd_encode(datetime.hour())?,
            days: bcd_encode(datetime.day())?,
            weekdays: datetime.weekday().index(),
            century_months: bcd_encode(datetime.month())? | century,
            years: bcd_encode((datetime.year() % 100) as u8)?,
        };
        self.device.write_block(regs::ADDR_TIME, bytemuck::bytes_of(&block))
    }

    /// Whether the supply dropped low enough that the kept time cannot be trusted.
    pub fn datetime_compromised(&mut self) -> Result<bool> {
        self.device.read_flag(&regs::VL)
    }

    pub fn running(&mut self) -> Result<bool> {
        let control = ControlStatus1::from_bits_retain(self.device.read_u8(&regs::CONTROL_STATUS_1)?);
        Ok(!control.contains(ControlStatus1::STOP))
    }

    pub fn set_running(&mut self, running: bool) -> Result<()> {
        log::debug!("set_running({})", running);
        self.device.modify_register(&regs::CONTROL_STATUS_1, |value| {
            let mut control = ControlStatus1::from_bits_retain(value as u8);
            control.set(ControlStatus1::STOP, !running);
            control.bits() as u32
        })
    }

    fn read_control2(&mut self) -> Result<ControlStatus2> {
        Ok(ControlStatus2::from_bits_retain(self.device.read_u8(&regs::CONTROL_STATUS_2)?))
    }

    fn modify_control2<F: FnOnce(&mut ControlStatus2)>(&mut self, f: F) -> Result<()> {
        self.device.modify_register(&regs::CONTROL_STATUS_2, |value| {
            // AF and TF are cleared by writing 0 and left alone by writing 1
            let mut control = ControlStatus2::from_bits_retain(value as u8)
                | ControlStatus2::AF | ControlStatus2::TF;
            f(&mut control);
            control.bits() as u32
        })
    }

    pub fn alarm(&mut self) -> Result<Alarm> {
        let mut raw = [0u8; 4];
        self.device.read_block(regs::MINUTE_ALARM.addr, &mut raw)?;
        let weekday = decode_alarm(raw[3], 0x07, 0..=6, "alarm weekday out of range")?
            .and_then(Weekday::from_index);
        Ok(Alarm {
            minute: decode_alarm(raw[0], 0x7f, 0..=59, "alarm minute out of range")?,
            hour: decode_alarm(raw[1], 0x3f, 0..=23, "alarm hour out of range")?,
            day: decode_alarm(raw[2], 0x3f, 1..=31, "alarm day out of range")?,
            weekday,
        })
    }

    pub fn set_alarm(&mut self, alarm: &Alarm) -> Result<()> {
        log::debug!("set_alarm({:?})", alarm);
        let raw = [
            encode_alarm(alarm.minute, 0..=59, "alarm minute out of range")?,
            encode_alarm(alarm.hour, 0..=23, "alarm hour out of range")?,
            encode_alarm(alarm.day, 1..=31, "alarm day out of range")?,
            encode_alarm(alarm.weekday.map(Weekday::index), 0..=6, "alarm weekday out of range")?,
        ];
        self.device.write_block(regs::MINUTE_ALARM.addr, &raw)
    }

    pub fn alarm_interrupt(&mut self) -> Result<bool> {
        Ok(self.read_control2()?.contains(ControlStatus2::AIE))
    }

    pub fn set_alarm_interrupt(&mut self, enabled: bool) -> Result<()> {
        self.modify_control2(|control| control.set(ControlStatus2::AIE, enabled))
    }

    pub fn alarm_status(&mut self) -> Result<bool> {
        Ok(self.read_control2()?.contains(ControlStatus2::AF))
    }

    pub fn clear_alarm_status(&mut self) -> Result<()> {
        self.modify_control2(|control| control.remove(ControlStatus2::AF))
    }

    pub fn timer_enabled(&mut self) -> Result<bool> {
        self.device.read_flag(&regs::TIMER_TE)
    }

    pub fn set_timer_enabled(&mut self, enabled: bool) -> Result<()> {
        self.device.write_flag(&regs::TIMER_TE, enabled)
    }

    pub fn timer_frequency(&mut self) -> Result<TimerFrequency> {
        Ok(TimerFrequency::from_pcf8563_code(self.device.read_field(&regs::TIMER_TD)?))
    }

    pub fn set_timer_frequency(&mut self, frequency: TimerFrequency) -> Result<()> {
        self.device.write_field(&regs::TIMER_TD, frequency.pcf8563_code())
    }

    pub fn timer_value(&mut self) -> Result<u8> {
        self.device.read_u8(&regs::TIMER)
    }

    pub fn set_timer_value(&mut self, value: u8) -> Result<()> {
        self.device.write_u8(&regs::TIMER, value)
    }

    pub fn timer_interrupt(&mut self) -> Result<bool> {
        Ok(self.read_control2()?.contains(ControlStatus2::TIE))
    }

    pub fn set_timer_interrupt(&mut self, enabled: bool) -> Result<()> {
        self.modify_control2(|control| control.set(ControlStatus2::TIE, enabled))
    }

    pub fn timer_status(&mut self) -> Result<bool> {
        Ok(self.read_control2()?.contains(ControlStatus2::TF))
    }

    pub fn clear_timer_status(&mut self) -> Result<()> {
        self.modify_control2(|control| control.remove(ControlStatus2::TF))
    }

    pub fn timer_pulsed(&mut self) -> Result<bool> {
        Ok(self.read_control2()?.contains(ControlStatus2::TI_TP))
    }

    pub fn set_timer_pulsed(&mut self, pulsed: bool) -> Result<()> {
        self.modify_control2(|control| control.set(ControlStatus2::TI_TP, pulsed))
    }

    pub fn clockout_enabled(&mut self) -> Result<bool> {
        self.device.read_flag(&regs::CLKOUT_FE)
    }

    pub fn set_clockout_enabled(&mut self, enabled: bool) -> Result<()> {
        self.device.write_flag(&regs::CLKOUT_FE, enabled)
    }

    pub fn clockout_frequency(&mut self) -> Result<ClockoutFrequency> {
        Ok(ClockoutFrequency::from_pcf8563_code(self.device.read_field(&regs::CLKOUT_FD)?))
    }

    pub fn set_clockout_frequency(&mut self, frequency: ClockoutFrequency) -> Result<()> {
        self.device.write_field(&regs::CLKOUT_FD, frequency.pcf8563_code())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::SharedBus;
    use crate::sys::mock::{MockI2c, Op};

    const ADDR: u8 = regs::I2C_ADDRESS;

    fn setup(registers: &[(u8, u8)]) -> (MockI2c, Pcf8563<MockI2c>) {
        let mock = MockI2c::new().with_device(ADDR, registers);
        let rtc = Pcf8563::new(SharedBus::new(mock.clone()).device(ADDR).unwrap());
        (mock, rtc)
    }

    #[test]
    fn test_read_datetime() {
        let (mock, mut rtc) = setup(&[
            (0x02, 0x80 | 0x05), // VL set, 05 s
            (0x03, 0x28),
            (0x04, 0x15),
            (0x05, 0x17),
            (0x06, 0x06),
            (0x07, 0x01),
            (0x08, 0x26),
        ]);
        let dt = rtc.datetime().unwrap();
        assert_eq!(dt, DateTime::new(2026, 1, 17, 15, 28, 5).unwrap());
        assert!(rtc.datetime_compromised().unwrap());
        assert_eq!(mock.log()[0], Op::WriteRead(ADDR, vec![0x02], 7));
    }

    #[test]
    fn test_write_datetime() {
        let (mock, mut rtc) = setup(&[(0x02, 0x80)]);
        let dt = DateTime::new(2026, 10, 18, 9, 41, 59).unwrap();
        rtc.set_datetime(&dt).unwrap();
        assert_eq!(mock.writes_to(ADDR), vec![
            vec![0x02, 0x59, 0x41, 0x09, 0x18, 0x00, 0x10, 0x26],
        ]);
        assert!(!rtc.datetime_compromised().unwrap());
        assert_eq!(rtc.datetime().unwrap(), dt);
    }

    #[test]
    fn test_century() {
        let (mock, mut rtc) = setup(&[]);
        let dt = DateTime::new(2104, 2, 29, 0, 0, 0).unwrap();
        rtc.set_datetime(&dt).unwrap();
        assert_eq!(mock.register(ADDR, 0x07), 0x80 | 0x02);
        assert_eq!(mock.register(ADDR, 0x08), 0x04);
        assert_eq!(rtc.datetime().unwrap(), dt);
    }

    #[test]
    fn test_corrupt_time() {
        let (mock, mut rtc) = setup(&[(0x03, 0x5a), (0x05, 0x01), (0x07, 0x01)]);
        assert!(matches!(rtc.datetime(), Err(Error::InvalidData(_))));
        mock.set_register(ADDR, 0x03, 0x00);
        mock.set_register(ADDR, 0x07, 0x13); // month 13
        assert!(matches!(rtc.datetime(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_stop() {
        let (mock, mut rtc) = setup(&[]);
        assert!(rtc.running().unwrap());
        rtc.set_running(false).unwrap();
        assert_eq!(mock.register(ADDR, 0x00), 0x20);
        assert!(!rtc.running().unwrap());
    }

    #[test]
    fn test_alarm() {
        let (mock, mut rtc) = setup(&[(0x09, 0x80), (0x0a, 0x80), (0x0b, 0x80), (0x0c, 0x80)]);
        assert_eq!(rtc.alarm().unwrap(), Alarm::default());
        let alarm = Alarm { minute: Some(30), hour: Some(7), day: None, weekday: Some(Weekday::Monday) };
        rtc.set_alarm(&alarm).unwrap();
        assert_eq!(mock.writes_to(ADDR), vec![vec![0x09, 0x30, 0x07, 0x80, 0x01]]);
        assert_eq!(rtc.alarm().unwrap(), alarm);
        let invalid = Alarm { hour: Some(24), ..Default::default() };
        assert!(matches!(rtc.set_alarm(&invalid), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_alarm_out_of_range() {
        let (mock, mut rtc) = setup(&[(0x09, 0x80), (0x0a, 0x80), (0x0b, 0x00), (0x0c, 0x80)]);
        assert!(matches!(rtc.alarm(), Err(Error::InvalidData("alarm day out of range"))));
        mock.set_register(ADDR, 0x0b, 0x32); // day 32
        assert!(matches!(rtc.alarm(), Err(Error::InvalidData(_))));
        mock.set_register(ADDR, 0x0b, 0x31);
        mock.set_register(ADDR, 0x0a, 0x24); // hour 24
        assert!(matches!(rtc.alarm(), Err(Error::InvalidData("alarm hour out of range"))));
        mock.set_register(ADDR, 0x0a, 0x23);
        mock.set_register(ADDR, 0x09, 0x60); // minute 60
        assert!(matches!(rtc.alarm(), Err(Error::InvalidData(_))));
        mock.set_register(ADDR, 0x09, 0x59);
        // whatever reads back can be written back
        let alarm = rtc.alarm().unwrap();
        assert_eq!(alarm, Alarm { minute: Some(59), hour: Some(23), day: Some(31), weekday: None });
        rtc.set_alarm(&alarm).unwrap();
    }

    #[test]
    fn test_flags_written_as_ones() {
        let (mock, mut rtc) = setup(&[(0x01, 0x00)]);
        rtc.set_alarm_interrupt(true).unwrap();
        // AF and TF are written as 1 so that a pending flag is not lost
        assert_eq!(mock.writes_to(ADDR), vec![vec![0x01, 0x0e]]);
        assert!(rtc.alarm_interrupt().unwrap());
        mock.clear_log();
        rtc.clear_alarm_status().unwrap();
        assert_eq!(mock.writes_to(ADDR), vec![vec![0x01, 0x06]]);
        assert!(!rtc.alarm_status().unwrap());
    }

    #[test]
    fn test_timer() {
        let (mock, mut rtc) = setup(&[(0x0e, 0x03)]);
        assert!(!rtc.timer_enabled().unwrap());
        assert_eq!(rtc.timer_frequency().unwrap(), TimerFrequency::PerMinute);
        rtc.set_timer_frequency(TimerFrequency::Hz1).unwrap();
        rtc.set_timer_value(10).unwrap();
        rtc.set_timer_enabled(true).unwrap();
        assert_eq!(mock.register(ADDR, 0x0e), 0x82);
        assert_eq!(rtc.timer_value().unwrap(), 10);
        rtc.set_timer_pulsed(true).unwrap();
        assert!(rtc.timer_pulsed().unwrap());
    }

    #[test]
    fn test_clockout() {
        let (mock, mut rtc) = setup(&[(0x0d, 0x80)]);
        assert!(rtc.clockout_enabled().unwrap());
        assert_eq!(rtc.clockout_frequency().unwrap(), ClockoutFrequency::Hz32768);
        rtc.set_clockout_frequency(ClockoutFrequency::Hz1).unwrap();
        rtc.set_clockout_enabled(false).unwrap();
        assert_eq!(mock.register(ADDR, 0x0d), 0x03);
    }
}
