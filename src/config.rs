//! Board bring-up configuration: which peripherals to start, and how.

use std::time::Duration;

pub const I2C_BUS_VARIABLE: &str = "YOTO_I2C_BUS";
pub const NFC_UART_VARIABLE: &str = "YOTO_NFC_UART";
pub const ENCODER_LEFT_VARIABLE: &str = "YOTO_ENCODER_LEFT";
pub const ENCODER_RIGHT_VARIABLE: &str = "YOTO_ENCODER_RIGHT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfcConfiguration {
    pub uart_path: String,
    /// The transceiver requires 8N2 framing at this rate.
    pub baud_rate: u32,
    /// How long to send wake-up bytes before the first command.
    pub wake_pulse: Duration,
}

impl Default for NfcConfiguration {
    fn default() -> Self {
        Self {
            uart_path: String::from("/dev/ttyS1"),
            baud_rate: 57600,
            wake_pulse: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfiguration {
    /// Rate of the I2S stream that will feed the DAC, in Hz.
    pub sample_rate: u32,
    pub bit_depth: u8,
    /// Derive the DAC master clock from the I2S bit clock rather than the MCLK pin.
    pub use_sclk_as_mclk: bool,
    pub volume: u8,
}

impl Default for AudioConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            use_sclk_as_mclk: false,
            volume: 150,
        }
    }
}

/// Input devices of the two rotary encoders, as created by the `rotary-encoder` driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfiguration {
    pub left_path: String,
    pub right_path: String,
    /// The `linux,axis` property of both devices; 0 is `REL_X` or `ABS_X`.
    pub axis: u16,
}

/// Peripherals set to `None` or `false` are left alone during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfiguration {
    pub i2c_path: String,
    pub nfc: Option<NfcConfiguration>,
    pub audio: Option<AudioConfiguration>,
    pub battery: bool,
    pub rtc: bool,
    pub encoders: Option<EncoderConfiguration>,
}

impl Default for BoardConfiguration {
    fn default() -> Self {
        BoardConfiguration {
            i2c_path: String::from("/dev/i2c-0"),
            nfc: Some(NfcConfiguration::default()),
            audio: Some(AudioConfiguration::default()),
            battery: true,
            rtc: true,
            encoders: None,
        }
    }
}

impl BoardConfiguration {
    /// Default configuration with device paths taken from `YOTO_I2C_BUS`, `YOTO_NFC_UART`,
    /// `YOTO_ENCODER_LEFT` and `YOTO_ENCODER_RIGHT` where set. Encoders are only used when
    /// both of their variables are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.override_paths(|name| std::env::var(name).ok());
        config
    }

    pub fn override_paths<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(path) = lookup(I2C_BUS_VARIABLE) {
            self.i2c_path = path;
        }
        if let (Some(nfc), Some(path)) = (self.nfc.as_mut(), lookup(NFC_UART_VARIABLE)) {
            nfc.uart_path = path;
        }
        if let (Some(left_path), Some(right_path)) =
                (lookup(ENCODER_LEFT_VARIABLE), lookup(ENCODER_RIGHT_VARIABLE)) {
            let axis = self.encoders.as_ref().map_or(0, |encoders| encoders.axis);
            self.encoders = Some(EncoderConfiguration { left_path, right_path, axis });
        }
    }
}
