//! Battery charger driver.

use std::fmt;

use crate::Result;
use crate::bus::I2cDevice;
use crate::regs::RegisterAccess;
use crate::regs::sgm41513 as regs;
use crate::sys::I2cBus;

const ICHG_LOW_TABLE: [u16; 16] = [0, 5, 10, 15, 20, 25, 30, 35, 40, 50, 60, 70, 80, 90, 100, 110];

pub(crate) fn charge_current_from_code(code: u8) -> u16 {
    let code = code as u16 & 0x3f;
    match code {
        0x00..=0x0f => ICHG_LOW_TABLE[code as usize],
        0x10..=0x1f => 130 + (code - 0x10) * 20,
        0x20..=0x2f => 540 + (code - 0x20) * 60,
        _ => (1500 + (code - 0x30) * 120).min(3000),
    }
}

/// The smallest code that gives the highest charge current not above `milliamps`.
pub(crate) fn charge_current_code(milliamps: u16) -> u8 {
    let milliamps = milliamps.min(3000);
    let mut best = 0;
    for code in 0..=0x3f {
        let current = charge_current_from_code(code);
        if current > milliamps { break }
        if current > charge_current_from_code(best) {
            best = code;
        }
    }
    best
}

pub(crate) fn charge_voltage_from_code(code: u8) -> u16 {
    match code {
        0x0f => 4350,
        0..=24 => 3856 + code as u16 * 32,
        _ => 4624,
    }
}

pub(crate) fn charge_voltage_code(millivolts: u16) -> u8 {
    match millivolts.clamp(3856, 4624) {
        4350 => 0x0f,
        millivolts => ((millivolts - 3856) / 32).min(24) as u8,
    }
}

/// `offset + code * step`, for the linear settings.
fn linear_code(value: u16, offset: u16, step: u16, max: u16) -> u8 {
    ((value.clamp(offset, max) - offset) / step) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartInfo {
    pub part_number: u8,
    pub revision: u8,
}

impl PartInfo {
    pub fn name(&self) -> Option<&'static str> {
        match self.part_number {
            0b0000 => Some("SGM41513"),
            0b0001 => Some("SGM41513A/SGM41513D"),
            _ => None
        }
    }
}

impl fmt::Display for PartInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} rev {}", name, self.revision),
            None => write!(f, "unknown part {:#x} rev {}", self.part_number, self.revision),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbusStatus {
    NoInput,
    UsbSdp,
    Adapter,
    UsbCdp,
    UnknownAdapter,
    NonStandardAdapter,
    Otg,
    Reserved(u8),
}

impl VbusStatus {
    pub(crate) fn from_sgm41513_code(code: u8) -> Self {
        match code {
            0b000 => Self::NoInput,
            0b001 => Self::UsbSdp,
            0b010 => Self::Adapter,
            0b011 => Self::UsbCdp,
            0b101 => Self::UnknownAdapter,
            0b110 => Self::NonStandardAdapter,
            0b111 => Self::Otg,
            code  => Self::Reserved(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Disabled,
    PreCharge,
    FastCharge,
    Complete,
}

impl ChargeState {
    pub(crate) fn from_sgm41513_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Disabled,
            0b01 => Self::PreCharge,
            0b10 => Self::FastCharge,
            _    => Self::Complete,
        }
    }

    pub fn charging(self) -> bool {
        matches!(self, Self::PreCharge | Self::FastCharge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    pub vbus: VbusStatus,
    pub charge: ChargeState,
    pub power_good: bool,
    pub thermal_regulation: bool,
    pub vsys_regulation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeFault {
    Normal,
    InputFault,
    ThermalShutdown,
    SafetyTimerExpired,
}

impl ChargeFault {
    pub(crate) fn from_sgm41513_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Normal,
            0b01 => Self::InputFault,
            0b10 => Self::ThermalShutdown,
            _    => Self::SafetyTimerExpired,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultStatus {
    pub watchdog: bool,
    pub boost: bool,
    pub charge: ChargeFault,
    pub battery: bool,
    /// Raw NTC_FAULT field; zero is normal.
    pub ntc: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VindpmStatus {
    pub vbus_good: bool,
    pub vindpm_active: bool,
    pub iindpm_active: bool,
    pub topoff_active: bool,
    pub acov_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchdogTimer {
    Disabled,
    Sec40,
    Sec80,
    #[default]
    Sec160,
}

impl WatchdogTimer {
    pub(crate) fn sgm41513_code(self) -> u8 {
        match self {
            Self::Disabled => 0b00,
            Self::Sec40    => 0b01,
            Self::Sec80    => 0b10,
            Self::Sec160   => 0b11,
        }
    }

    pub(crate) fn from_sgm41513_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Disabled,
            0b01 => Self::Sec40,
            0b10 => Self::Sec80,
            _    => Self::Sec160,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoostVoltage {
    MV4850,
    MV5000,
    #[default]
    MV5150,
    MV5300,
}

impl BoostVoltage {
    pub const ALL: [BoostVoltage; 4] = [Self::MV4850, Self::MV5000, Self::MV5150, Self::MV5300];

    pub fn millivolts(self) -> u16 {
        match self {
            Self::MV4850 => 4850,
            Self::MV5000 => 5000,
            Self::MV5150 => 5150,
            Self::MV5300 => 5300,
        }
    }

    /// The closest setting; ties go to the lower voltage.
    pub fn from_millivolts(millivolts: u16) -> Self {
        Self::ALL.into_iter()
            .min_by_key(|setting| setting.millivolts().abs_diff(millivolts))
            .unwrap_or_default()
    }

    pub(crate) fn sgm41513_code(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_sgm41513_code(code: u8) -> Self {
        Self::ALL[(code & 0b11) as usize]
    }
}

#[derive(Debug)]
pub struct Sgm41513<B: I2cBus> {
    device: I2cDevice<B>,
}

macro_rules! flag_accessors {
    { $( $(#[$attr:meta])* $get:ident, $set:ident => $field:expr; )+ } => {
        $(
            $(#[$attr])*
            pub fn $get(&mut self) -> Result<bool> {
                self.device.read_flag(&$field)
            }

            pub fn $set(&mut self, value: bool) -> Result<()> {
                log::debug!("{}({})", stringify!($set), value);
                self.device.write_flag(&$field, value)
            }
        )+
    };
}

impl<B: I2cBus> Sgm41513<B> {
    pub fn new(device: I2cDevice<B>) -> Sgm41513<B> {
        Sgm41513 { device }
    }

    flag_accessors! {
        /// VBUS disconnected from the internal circuit.
        hiz_mode, set_hiz_mode => regs::EN_HIZ;
        charge_enabled, set_charge_enabled => regs::CHG_CONFIG;
        /// Boost mode, supplying VBUS from the battery.
        otg_enabled, set_otg_enabled => regs::OTG_CONFIG;
        termination_enabled, set_termination_enabled => regs::EN_TERM;
        safety_timer_enabled, set_safety_timer_enabled => regs::EN_TIMER;
        /// Battery disconnected from the system.
        batfet_disabled, set_batfet_disabled => regs::BATFET_DIS;
    }

    pub fn part_info(&mut self) -> Result<PartInfo> {
        let value = self.device.read_u8(&regs::PART_INFO)?;
        Ok(PartInfo {
            part_number: regs::PN.extract(value),
            revision: regs::DEV_REV.extract(value),
        })
    }

    pub fn system_status(&mut self) -> Result<SystemStatus> {
        let value = self.device.read_u8(&regs::SYSTEM_STATUS)?;
        Ok(SystemStatus {
            vbus: VbusStatus::from_sgm41513_code(regs::VBUS_STAT.extract(value)),
            charge: ChargeState::from_sgm41513_code(regs::CHRG_STAT.extract(value)),
            power_good: regs::PG_STAT.extract(value) != 0,
            thermal_regulation: regs::THERM_STAT.extract(value) != 0,
            vsys_regulation: regs::VSYS_STAT.extract(value) != 0,
        })
    }

    pub fn fault_status(&mut self) -> Result<FaultStatus> {
        let value = self.device.read_u8(&regs::FAULT)?;
        Ok(FaultStatus {
            watchdog: regs::WATCHDOG_FAULT.extract(value) != 0,
            boost: regs::BOOST_FAULT.extract(value) != 0,
            charge: ChargeFault::from_sgm41513_code(regs::CHRG_FAULT.extract(value)),
            battery: regs::BAT_FAULT.extract(value) != 0,
            ntc: regs::NTC_FAULT.extract(value),
        })
    }

    pub fn vindpm_status(&mut self) -> Result<VindpmStatus> {
        let value = self.device.read_u8(&regs::VINDPM_STATUS)?;
        Ok(VindpmStatus {
            vbus_good: regs::VBUS_GD.extract(value) != 0,
            vindpm_active: regs::VINDPM_STAT.extract(value) != 0,
            iindpm_active: regs::IINDPM_STAT.extract(value) != 0,
            topoff_active: regs::TOPOFF_ACTIVE.extract(value) != 0,
            acov_active: regs::ACOV_STAT.extract(value) != 0,
        })
    }

    /// Fast charge current in mA.
    pub fn charge_current(&mut self) -> Result<u16> {
        Ok(charge_current_from_code(self.device.read_field(&regs::ICHG)?))
    }

    /// Set the fast charge current, rounding down to a supported value within 0..=3000 mA.
    /// This includes the 5 and 10 mA steps below 110 mA; 47 mA gives 40 mA, not 50 mA.
    pub fn set_charge_current(&mut self, milliamps: u16) -> Result<()> {
        let code = charge_current_code(milliamps);
        log::debug!("set_charge_current({}) = {} mA", milliamps, charge_current_from_code(code));
        self.device.write_field(&regs::ICHG, code)
    }

    /// Charge voltage in mV.
    pub fn charge_voltage(&mut self) -> Result<u16> {
        Ok(charge_voltage_from_code(self.device.read_field(&regs::VREG)?))
    }

    /// Set the charge voltage, in 32 mV steps within 3856..=4624 mV; 4350 mV is exact.
    pub fn set_charge_voltage(&mut self, millivolts: u16) -> Result<()> {
        let code = charge_voltage_code(millivolts);
        log::debug!("set_charge_voltage({}) = {} mV", millivolts, charge_voltage_from_code(code));
        self.device.write_field(&regs::VREG, code)
    }

    pub fn input_current_limit(&mut self) -> Result<u16> {
        Ok(100 + self.device.read_field(&regs::IINDPM)? as u16 * 100)
    }

    /// Set the input current limit, in 100 mA steps within 100..=3200 mA.
    pub fn set_input_current_limit(&mut self, milliamps: u16) -> Result<()> {
        self.device.write_field(&regs::IINDPM, linear_code(milliamps, 100, 100, 3200))
    }

    pub fn precharge_current(&mut self) -> Result<u16> {
        Ok(60 + self.device.read_field(&regs::IPRECHG)? as u16 * 60)
    }

    /// Set the precharge current, in 60 mA steps within 60..=960 mA.
    pub fn set_precharge_current(&mut self, milliamps: u16) -> Result<()> {
        self.device.write_field(&regs::IPRECHG, linear_code(milliamps, 60, 60, 960))
    }

    pub fn termination_current(&mut self) -> Result<u16> {
        Ok(60 + self.device.read_field(&regs::ITERM)? as u16 * 60)
    }

    /// Set the termination current, in 60 mA steps within 60..=960 mA.
    pub fn set_termination_current(&mut self, milliamps: u16) -> Result<()> {
        self.device.write_field(&regs::ITERM, linear_code(milliamps, 60, 60, 960))
    }

    pub fn watchdog_timer(&mut self) -> Result<WatchdogTimer> {
        Ok(WatchdogTimer::from_sgm41513_code(self.device.read_field(&regs::WATCHDOG)?))
    }

    pub fn set_watchdog_timer(&mut self, timer: WatchdogTimer) -> Result<()> {
        self.device.write_field(&regs::WATCHDOG, timer.sgm41513_code())
    }

    pub fn boost_voltage(&mut self) -> Result<BoostVoltage> {
        Ok(BoostVoltage::from_sgm41513_code(self.device.read_field(&regs::BOOSTV)?))
    }

    pub fn set_boost_voltage(&mut self, voltage: BoostVoltage) -> Result<()> {
        self.device.write_field(&regs::BOOSTV, voltage.sgm41513_code())
    }

    pub fn reset_watchdog(&mut self) -> Result<()> {
        self.device.write_flag(&regs::WD_RST, true)
    }

    /// Return every register to its power-on default.
    pub fn reset_registers(&mut self) -> Result<()> {
        log::debug!("reset_registers()");
        self.device.write_u8(&regs::PART_INFO, regs::REG_RST)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::SharedBus;
    use crate::sys::mock::MockI2c;

    const ADDR: u8 = regs::I2C_ADDRESS;

    fn setup(registers: &[(u8, u8)]) -> (MockI2c, Sgm41513<MockI2c>) {
        let mock = MockI2c::new().with_device(ADDR, registers);
        let charger = Sgm41513::new(SharedBus::new(mock.clone()).device(ADDR).unwrap());
        (mock, charger)
    }

    #[test]
    fn test_charge_current_table() {
        assert_eq!(charge_current_from_code(0x00), 0);
        assert_eq!(charge_current_from_code(0x0f), 110);
        assert_eq!(charge_current_from_code(0x10), 130);
        assert_eq!(charge_current_from_code(0x1f), 430);
        assert_eq!(charge_current_from_code(0x20), 540);
        assert_eq!(charge_current_from_code(0x2f), 1440);
        assert_eq!(charge_current_from_code(0x30), 1500);
        assert_eq!(charge_current_from_code(0x3c), 2940);
        assert_eq!(charge_current_from_code(0x3d), 3000);
        assert_eq!(charge_current_from_code(0x3f), 3000);
    }

    #[test]
    fn test_charge_current_rounds_down() {
        assert_eq!(charge_current_code(0), 0x00);
        assert_eq!(charge_current_code(47), 0x08); // 40 mA
        assert_eq!(charge_current_code(109), 0x0e); // 100 mA
        assert_eq!(charge_current_code(120), 0x0f); // 110 mA
        assert_eq!(charge_current_code(500), 0x1f); // 430 mA, not into the next segment
        assert_eq!(charge_current_code(1000), 0x27); // 960 mA
        assert_eq!(charge_current_code(1499), 0x2f);
        assert_eq!(charge_current_code(3000), 0x3d);
        assert_eq!(charge_current_code(u16::MAX), 0x3d);
        for code in 0..=0x3d {
            assert_eq!(charge_current_code(charge_current_from_code(code)), code);
        }
    }

    #[test]
    fn test_charge_voltage() {
        assert_eq!(charge_voltage_from_code(0), 3856);
        assert_eq!(charge_voltage_from_code(0x0f), 4350);
        assert_eq!(charge_voltage_from_code(24), 4624);
        assert_eq!(charge_voltage_from_code(31), 4624);
        assert_eq!(charge_voltage_code(4200), 10);
        assert_eq!(charge_voltage_code(4350), 0x0f);
        assert_eq!(charge_voltage_code(3000), 0);
        assert_eq!(charge_voltage_code(5000), 24);
    }

    #[test]
    fn test_linear_settings() {
        let (mock, mut charger) = setup(&[(0x03, 0x00)]);
        charger.set_input_current_limit(500).unwrap();
        assert_eq!(mock.register(ADDR, 0x00), 4);
        assert_eq!(charger.input_current_limit().unwrap(), 500);
        charger.set_input_current_limit(9999).unwrap();
        assert_eq!(charger.input_current_limit().unwrap(), 3200);
        charger.set_precharge_current(180).unwrap();
        charger.set_termination_current(10).unwrap();
        assert_eq!(mock.register(ADDR, 0x03), 0x20);
        assert_eq!(charger.precharge_current().unwrap(), 180);
        assert_eq!(charger.termination_current().unwrap(), 60);
    }

    #[test]
    fn test_charge_settings_preserve_other_bits() {
        let (mock, mut charger) = setup(&[(0x02, 0xc0), (0x04, 0x07)]);
        charger.set_charge_current(1000).unwrap();
        assert_eq!(mock.register(ADDR, 0x02), 0xc0 | 0x27);
        assert_eq!(charger.charge_current().unwrap(), 960);
        charger.set_charge_voltage(4350).unwrap();
        assert_eq!(mock.register(ADDR, 0x04), 0x0f << 3 | 0x07);
        assert_eq!(charger.charge_voltage().unwrap(), 4350);
    }

    #[test]
    fn test_system_status() {
        let (mock, mut charger) = setup(&[(0x08, 0b010_10_1_0_1)]);
        assert_eq!(charger.system_status().unwrap(), SystemStatus {
            vbus: VbusStatus::Adapter,
            charge: ChargeState::FastCharge,
            power_good: true,
            thermal_regulation: false,
            vsys_regulation: true,
        });
        mock.set_register(ADDR, 0x08, 0b100_11_0_0_0);
        let status = charger.system_status().unwrap();
        assert_eq!(status.vbus, VbusStatus::Reserved(0b100));
        assert_eq!(status.charge, ChargeState::Complete);
        assert!(!status.charge.charging());
    }

    #[test]
    fn test_fault_status() {
        let (_mock, mut charger) = setup(&[(0x09, 0b1_0_11_1_101), (0x0a, 0b1010_1100)]);
        assert_eq!(charger.fault_status().unwrap(), FaultStatus {
            watchdog: true,
            boost: false,
            charge: ChargeFault::SafetyTimerExpired,
            battery: true,
            ntc: 0b101,
        });
        assert_eq!(charger.vindpm_status().unwrap(), VindpmStatus {
            vbus_good: true,
            vindpm_active: false,
            iindpm_active: true,
            topoff_active: true,
            acov_active: true,
        });
    }

    #[test]
    fn test_part_info() {
        let (mock, mut charger) = setup(&[(0x0b, 0b0_0001_0_10)]);
        let part = charger.part_info().unwrap();
        assert_eq!(part, PartInfo { part_number: 1, revision: 2 });
        assert_eq!(part.to_string(), "SGM41513A/SGM41513D rev 2");
        mock.set_register(ADDR, 0x0b, 0b0_0111_0_00);
        assert_eq!(charger.part_info().unwrap().name(), None);
    }

    #[test]
    fn test_flags_and_enums() {
        let (mock, mut charger) = setup(&[(0x01, 0x1a), (0x05, 0x9f), (0x06, 0x00)]);
        assert!(charger.charge_enabled().unwrap());
        charger.set_charge_enabled(false).unwrap();
        charger.set_otg_enabled(true).unwrap();
        assert_eq!(mock.register(ADDR, 0x01), 0x2a);
        assert!(charger.termination_enabled().unwrap());
        assert_eq!(charger.watchdog_timer().unwrap(), WatchdogTimer::Sec40);
        charger.set_watchdog_timer(WatchdogTimer::Disabled).unwrap();
        assert_eq!(mock.register(ADDR, 0x05), 0x8f);
        charger.set_boost_voltage(BoostVoltage::from_millivolts(5100)).unwrap();
        assert_eq!(charger.boost_voltage().unwrap(), BoostVoltage::MV5150);
        assert_eq!(mock.register(ADDR, 0x06), 0x20);
        charger.reset_watchdog().unwrap();
        assert_eq!(mock.register(ADDR, 0x01) & 0x40, 0x40);
        charger.reset_registers().unwrap();
        assert_eq!(mock.register(ADDR, 0x0b), 0x80);
    }

    #[test]
    fn test_boost_voltage_nearest() {
        assert_eq!(BoostVoltage::from_millivolts(0), BoostVoltage::MV4850);
        assert_eq!(BoostVoltage::from_millivolts(4925), BoostVoltage::MV4850);
        assert_eq!(BoostVoltage::from_millivolts(4926), BoostVoltage::MV5000);
        assert_eq!(BoostVoltage::from_millivolts(9000), BoostVoltage::MV5300);
    }
}
