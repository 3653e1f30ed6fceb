//! Bring-up and high-level control of the whole Yoto Mini board.

use crate::Result;
use crate::bus::SharedBus;
use crate::config::BoardConfiguration;
use crate::cr95hf::{CardType, Cr95hf, Tag};
use crate::datetime::DateTime;
use crate::encoder::{Encoder, EncoderTracker};
use crate::es8156::Es8156;
use crate::pcf8563::Pcf8563;
use crate::regs;
use crate::sgm41513::{ChargeState, Sgm41513, SystemStatus};
use crate::sys::{I2cBus, SerialPort};
use crate::tcal6416::Tcal6416;

/// Encoder push buttons on the I/O expander (P0_5, P0_4).
const ENCODER_LEFT_BUTTON_PIN: u8 = 5;
const ENCODER_RIGHT_BUTTON_PIN: u8 = 4;

#[derive(Debug)]
pub struct YotoMini<B: I2cBus, S: SerialPort> {
    bus: SharedBus<B>,
    expander: Tcal6416<B>,
    nfc: Option<Cr95hf<S>>,
    dac: Option<Es8156<B>>,
    battery: Option<Sgm41513<B>>,
    rtc: Option<Pcf8563<B>>,
    encoders: Option<[EncoderTracker; 2]>,
    torn_down: bool,
}

#[cfg(feature = "hardware")]
impl YotoMini<crate::sys::imp::I2cDevImpl, crate::sys::imp::SerialImpl> {
    /// Open the I2C adapter and, if enabled, the transceiver UART and encoder input devices
    /// named in `config`, then bring the board up.
    pub fn open(config: &BoardConfiguration) -> Result<Self> {
        use crate::sys::imp::{I2cDevImpl, InputEncoderImpl, SerialImpl};

        let bus = SharedBus::new(I2cDevImpl::open(&config.i2c_path)?);
        let uart = match &config.nfc {
            Some(nfc) => Some(SerialImpl::open(&nfc.uart_path, nfc.baud_rate)?),
            None => None,
        };
        let encoders = match &config.encoders {
            Some(encoders) => Some((
                InputEncoderImpl::open(&encoders.left_path, encoders.axis)?,
                InputEncoderImpl::open(&encoders.right_path, encoders.axis)?,
            )),
            None => None,
        };
        let mut board = Self::startup(bus, uart, config)?;
        if let Some((left, right)) = encoders {
            if let Err(error) = board.attach_encoders(Box::new(left), Box::new(right)) {
                board.teardown()?;
                return Err(error)
            }
        }
        Ok(board)
    }
}

impl<B: I2cBus, S: SerialPort> YotoMini<B, S> {
    /// Bring up the peripherals enabled in `config`, in dependency order. If any of them
    /// fails, the error is returned and every address claimed so far is released.
    pub fn startup(bus: SharedBus<B>, uart: Option<S>, config: &BoardConfiguration)
            -> Result<Self> {
        // the expander holds the amplifier in reset and carries the encoder buttons
        let mut expander = Tcal6416::new(bus.device(regs::tcal6416::I2C_ADDRESS)?);
        expander.configure_yoto_mini_defaults()?;
        log::info!("I/O expander configured");

        let nfc = match (&config.nfc, uart) {
            (Some(nfc_config), Some(uart)) => {
                let nfc = Cr95hf::new(uart, nfc_config.wake_pulse)?;
                log::info!("NFC transceiver {} ready", nfc.device_name());
                Some(nfc)
            }
            (Some(_), None) => {
                log::warn!("NFC enabled but no UART supplied; skipping");
                None
            }
            (None, _) => None,
        };

        let dac = match &config.audio {
            Some(audio_config) => {
                let mut dac = Es8156::new(bus.device(regs::es8156::I2C_ADDRESS)?)?;
                dac.configure(audio_config.use_sclk_as_mclk)?;
                dac.set_volume(audio_config.volume)?;
                dac.set_mute(false)?;
                log::info!("audio DAC configured for {} Hz, {}-bit",
                    audio_config.sample_rate, audio_config.bit_depth);
                Some(dac)
            }
            None => None,
        };

        let battery = if config.battery {
            let mut battery = Sgm41513::new(bus.device(regs::sgm41513::I2C_ADDRESS)?);
            let part_info = battery.part_info()?;
            log::info!("battery charger {}", part_info);
            Some(battery)
        } else {
            None
        };

        let rtc = if config.rtc {
            let mut rtc = Pcf8563::new(bus.device(regs::pcf8563::I2C_ADDRESS)?);
            if rtc.datetime_compromised()? {
                log::warn!("RTC time is not valid; set it before use");
            } else {
                let datetime = rtc.datetime()?;
                log::info!("RTC time is {}", datetime);
            }
            Some(rtc)
        } else {
            None
        };

        Ok(YotoMini { bus, expander, nfc, dac, battery, rtc, encoders: None, torn_down: false })
    }

    /// Start up, run `f`, and tear down regardless of what `f` returned.
    pub fn with<T, F>(bus: SharedBus<B>, uart: Option<S>, config: &BoardConfiguration, f: F)
            -> Result<T>
            where F: FnOnce(&mut Self) -> Result<T> {
        let mut board = Self::startup(bus, uart, config)?;
        let result = f(&mut board);
        let teardown_result = board.teardown();
        let value = result?;
        teardown_result?;
        Ok(value)
    }

    pub fn bus(&self) -> &SharedBus<B> {
        &self.bus
    }

    pub fn expander(&mut self) -> &mut Tcal6416<B> {
        &mut self.expander
    }

    pub fn nfc(&mut self) -> Option<&mut Cr95hf<S>> {
        self.nfc.as_mut()
    }

    pub fn dac(&mut self) -> Option<&mut Es8156<B>> {
        self.dac.as_mut()
    }

    pub fn battery(&mut self) -> Option<&mut Sgm41513<B>> {
        self.battery.as_mut()
    }

    pub fn rtc(&mut self) -> Option<&mut Pcf8563<B>> {
        self.rtc.as_mut()
    }

    pub fn read_nfc_tag(&mut self) -> Result<Option<Tag>> {
        match &mut self.nfc {
            Some(nfc) => nfc.read_tag(),
            None => Ok(None),
        }
    }

    /// `None` when NFC was not started.
    pub fn card_type(&self, sak: u8) -> Option<CardType> {
        self.nfc.as_ref().map(|_| CardType::from_sak(sak))
    }

    pub fn volume(&mut self) -> Result<u8> {
        match &mut self.dac {
            Some(dac) => dac.volume(),
            None => Ok(0),
        }
    }

    pub fn set_volume(&mut self, volume: i32) -> Result<()> {
        match &mut self.dac {
            Some(dac) => dac.set_volume(volume.clamp(0, 255) as u8),
            None => Ok(()),
        }
    }

    /// Change the volume by `delta`, saturating at either end; returns the new volume.
    pub fn adjust_volume(&mut self, delta: i32) -> Result<u8> {
        let volume = self.volume()? as i32;
        self.set_volume(volume.saturating_add(delta))?;
        self.volume()
    }

    pub fn mute(&mut self) -> Result<bool> {
        match &mut self.dac {
            Some(dac) => dac.mute(),
            None => Ok(true),
        }
    }

    pub fn set_mute(&mut self, mute: bool) -> Result<()> {
        match &mut self.dac {
            Some(dac) => dac.set_mute(mute),
            None => Ok(()),
        }
    }

    pub fn charge_status(&mut self) -> Result<Option<SystemStatus>> {
        self.battery.as_mut().map(|battery| battery.system_status()).transpose()
    }

    pub fn charge_voltage(&mut self) -> Result<Option<u16>> {
        self.battery.as_mut().map(|battery| battery.charge_voltage()).transpose()
    }

    pub fn charge_current(&mut self) -> Result<Option<u16>> {
        self.battery.as_mut().map(|battery| battery.charge_current()).transpose()
    }

    /// Pre-charging or fast charging.
    pub fn charging(&mut self) -> Result<bool> {
        Ok(self.charge_status()?.map_or(false, |status| status.charge.charging()))
    }

    pub fn charge_complete(&mut self) -> Result<bool> {
        Ok(self.charge_status()?.map_or(false, |status| status.charge == ChargeState::Complete))
    }

    pub fn datetime(&mut self) -> Result<Option<DateTime>> {
        self.rtc.as_mut().map(|rtc| rtc.datetime()).transpose()
    }

    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<()> {
        match &mut self.rtc {
            Some(rtc) => rtc.set_datetime(datetime),
            None => Ok(()),
        }
    }

    pub fn rtc_valid(&mut self) -> Result<bool> {
        match &mut self.rtc {
            Some(rtc) => Ok(!rtc.datetime_compromised()?),
            None => Ok(false),
        }
    }

    pub fn encoders_attached(&self) -> bool {
        self.encoders.is_some()
    }

    pub fn attach_encoders(&mut self, left: Box<dyn Encoder>, right: Box<dyn Encoder>)
            -> Result<()> {
        self.encoders = Some([EncoderTracker::new(left)?, EncoderTracker::new(right)?]);
        Ok(())
    }

    fn encoder(&mut self, index: usize) -> Option<&mut EncoderTracker> {
        self.encoders.as_mut().map(|encoders| &mut encoders[index])
    }

    pub fn encoder_left_position(&mut self) -> Result<i32> {
        self.encoder(0).map_or(Ok(0), |encoder| encoder.position())
    }

    pub fn encoder_right_position(&mut self) -> Result<i32> {
        self.encoder(1).map_or(Ok(0), |encoder| encoder.position())
    }

    /// Detents turned since the previous call; clockwise is positive.
    pub fn encoder_left_delta(&mut self) -> Result<i32> {
        self.encoder(0).map_or(Ok(0), |encoder| encoder.delta())
    }

    pub fn encoder_right_delta(&mut self) -> Result<i32> {
        self.encoder(1).map_or(Ok(0), |encoder| encoder.delta())
    }

    pub fn encoder_left_button(&mut self) -> Result<bool> {
        self.expander.pin(ENCODER_LEFT_BUTTON_PIN)
    }

    pub fn encoder_right_button(&mut self) -> Result<bool> {
        self.expander.pin(ENCODER_RIGHT_BUTTON_PIN)
    }

    /// Mute the DAC and switch off the RF field. Both are attempted even if one fails, and
    /// the first error is returned. Once both succeed, further calls do nothing.
    pub fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(())
        }
        let mute_result = match &mut self.dac {
            Some(dac) => dac.set_mute(true),
            None => Ok(()),
        };
        let field_result = match &mut self.nfc {
            Some(nfc) => nfc.field_off(),
            None => Ok(()),
        };
        mute_result?;
        field_result?;
        self.torn_down = true;
        log::info!("board torn down");
        Ok(())
    }
}
