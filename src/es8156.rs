//! I2S DAC driver (control port only; samples arrive over I2S).

use crate::{Error, Result};
use crate::bus::I2cDevice;
use crate::regs::RegisterAccess;
use crate::regs::es8156 as regs;
use crate::sys::I2cBus;

const DEFAULT_VOLUME: u8 = 180;

#[derive(Debug)]
pub struct Es8156<B: I2cBus> {
    device: I2cDevice<B>,
    current_page: u8,
}

impl<B: I2cBus> Es8156<B> {
    /// Verify that an ES8156 is present at `device`.
    pub fn new(device: I2cDevice<B>) -> Result<Es8156<B>> {
        let mut dac = Es8156 { device, current_page: 0 };
        let chip_id = dac.chip_id()?;
        if chip_id != regs::CHIP_ID {
            return Err(Error::UnexpectedChip { expected: regs::CHIP_ID, found: chip_id })
        }
        let version = dac.chip_version()?;
        log::debug!("found ES8156 version {}", version);
        Ok(dac)
    }

    fn select_page(&mut self, page: u8) -> Result<()> {
        if self.current_page != page {
            self.device.write_field(&regs::PAGE, page)?;
            self.current_page = page;
        }
        Ok(())
    }

    pub fn chip_id(&mut self) -> Result<u16> {
        self.select_page(0)?;
        let (mut high, mut low) = ([0u8], [0u8]);
        self.device.transaction(|t| {
            t.write_read(&[regs::CHIP_ID1.addr], &mut high)?;
            t.write_read(&[regs::CHIP_ID0.addr], &mut low)
        })?;
        Ok(u16::from_be_bytes([high[0], low[0]]))
    }

    pub fn chip_version(&mut self) -> Result<u8> {
        self.select_page(0)?;
        self.device.read_field(&regs::VERSION)
    }

    /// Digital volume; 0 is mute and 255 is maximum.
    pub fn volume(&mut self) -> Result<u8> {
        self.device.read_u8(&regs::VOLUME_CONTROL)
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        log::debug!("set_volume({})", volume);
        self.device.write_u8(&regs::VOLUME_CONTROL, volume)
    }

    /// Whether any of the left, right, or analog output mutes is engaged.
    pub fn mute(&mut self) -> Result<bool> {
        Ok(self.device.read_flag(&regs::LEFT_MUTE)? ||
            self.device.read_flag(&regs::RIGHT_MUTE)? ||
            self.device.read_flag(&regs::OUT_MUTE)?)
    }

    pub fn set_mute(&mut self, mute: bool) -> Result<()> {
        log::debug!("set_mute({})", mute);
        self.device.write_flag(&regs::LEFT_MUTE, mute)?;
        self.device.write_flag(&regs::RIGHT_MUTE, mute)?;
        self.device.write_flag(&regs::OUT_MUTE, mute)
    }

    /// Configure for I2S peripheral mode, 16-bit samples, all analog outputs powered up
    /// and unmuted. With `use_sclk_as_mclk`, the internal clocks are generated from SCLK
    /// instead of the MCLK pin.
    pub fn configure(&mut self, use_sclk_as_mclk: bool) -> Result<()> {
        log::debug!("configure(use_sclk_as_mclk={})", use_sclk_as_mclk);
        self.select_page(0)?;
        let mut init_pairs = vec![
            // CSM_ON=0, SEQ_DIS=1
            (regs::RESET_CONTROL, 0b0000_0010),
        ];
        if use_sclk_as_mclk {
            init_pairs.extend([
                // MCLK_SEL=1, ISCLKLRCK_SEL=1, SOFT_MODE_SEL=1
                (regs::MODE_CONFIG_1, 0b1100_0100),
                // MULTP_FACTOR=3 (x8), CLK_DAC_DIV=1 (divide by 2)
                (regs::MAIN_CLOCK_CONTROL, 0b1100_0001),
                // MSTCLK_SRCSEL=1, DLL_ON=1
                (regs::MISC_CONTROL_2, 0b0010_0010),
                // clock doubler
                (regs::MISC_CONTROL_1, 0b0000_1100),
            ]);
        } else {
            init_pairs.extend([
                // SOFT_MODE_SEL=1, external MCLK
                (regs::MODE_CONFIG_1, 0b0000_0100),
                (regs::MAIN_CLOCK_CONTROL, 0b0010_0000),
                (regs::MISC_CONTROL_2, 0b0000_0000),
            ]);
        }
        init_pairs.extend([
            // power-up timing
            (regs::TIME_CONTROL_1, 0x01),
            (regs::TIME_CONTROL_2, 0x01),
            // S6_SEL=2, S2_SEL=2, S3_SEL=2
            (regs::ANALOG_SYSTEM[0], 0b0010_1010),
            // VSEL=0x1C, VREF_RMPDN1=1
            (regs::ANALOG_SYSTEM[1], 0b0011_1100),
            // analog outputs unmuted
            (regs::ANALOG_SYSTEM[2], 0b0000_0000),
            // VROI=1
            (regs::ANALOG_SYSTEM[3], 0b0000_0100),
            // low power
            (regs::ANALOG_SYSTEM[4], 0b0000_0111),
            // I2S format, 16-bit
            (regs::SDP_INTERFACE_CONFIG_1, 0b0011_0000),
            (regs::P2S_CONTROL, 0b0001_0100),
            (regs::MISC_CONTROL_3, 0b0000_0000),
            // all clocks enabled
            (regs::CLOCK_OFF, 0b0011_1111),
            // CSM_ON=1, SEQ_DIS=1
            (regs::RESET_CONTROL, 0b0000_0011),
            // VMIDSEL=2
            (regs::ANALOG_SYSTEM[5], 0b0010_0000),
            // unmute both channels
            (regs::MUTE_CONTROL, 0b0000_0000),
        ]);
        for (reg, value) in init_pairs {
            self.device.write_u8(&reg, value)?;
        }
        self.set_volume(DEFAULT_VOLUME)
    }
}
