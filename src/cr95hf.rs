//! NFC transceiver driver, ISO14443-A tag identification over the UART interface.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::{Error, Result};
use crate::sys::SerialPort;

const CMD_IDN: u8 = 0x01;
const CMD_PROTOCOL: u8 = 0x02;
const CMD_SENDRECV: u8 = 0x04;
const CMD_ECHO: u8 = 0x55;

const RSP_SUCCESS: u8 = 0x00;
const RSP_DATA: u8 = 0x80;

const PROTOCOL_OFF: u8 = 0x00;
const PROTOCOL_ISO14443A: u8 = 0x02;

const ISO14443A_REQA: u8 = 0x26;
const ISO14443A_WUPA: u8 = 0x52;
const ISO14443A_CT: u8 = 0x88;
const ISO14443A_SEL_CL1: u8 = 0x93;
const ISO14443A_SEL_CL2: u8 = 0x95;
const ISO14443A_NVB_ANTICOLL: u8 = 0x20;
const ISO14443A_NVB_SELECT: u8 = 0x70;

// transmission flags: bits in the last byte, CRC append
const FLAG_SHORT_FRAME: u8 = 0x07;
const FLAG_STANDARD: u8 = 0x08;
const FLAG_STANDARD_CRC: u8 = 0x28;

const IDN_LENGTH: usize = 13;

const SETUP_TIMEOUT: Duration = Duration::from_millis(100);
const RF_TIMEOUT: Duration = Duration::from_millis(50);
const HFO_SETTLE: Duration = Duration::from_millis(15);
const POLL_INTERVAL: Duration = Duration::from_micros(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    MifareUltralight,
    MifareClassic1k,
    MifareMini,
    MifareClassic4k,
    MifarePlus2k,
    MifarePlus4k,
    MifarePlus,
    SmartMx,
    MifareClassic4kEmulated,
    MifareClassic1kInfineon,
    MifareProX,
    Unknown(u8),
}

impl CardType {
    pub fn from_sak(sak: u8) -> CardType {
        match sak {
            0x00 => Self::MifareUltralight,
            0x08 => Self::MifareClassic1k,
            0x09 => Self::MifareMini,
            0x18 => Self::MifareClassic4k,
            0x10 => Self::MifarePlus2k,
            0x11 => Self::MifarePlus4k,
            0x20 => Self::MifarePlus,
            0x28 => Self::SmartMx,
            0x38 => Self::MifareClassic4kEmulated,
            0x88 => Self::MifareClassic1kInfineon,
            0x98 => Self::MifareProX,
            sak  => Self::Unknown(sak),
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::MifareUltralight => "MIFARE Ultralight/NTAG",
            Self::MifareClassic1k => "MIFARE Classic 1K",
            Self::MifareMini => "MIFARE Mini",
            Self::MifareClassic4k => "MIFARE Classic 4K",
            Self::MifarePlus2k => "MIFARE Plus 2K",
            Self::MifarePlus4k => "MIFARE Plus 4K",
            Self::MifarePlus => "MIFARE Plus/DESFire",
            Self::SmartMx => "JCOP/SmartMX",
            Self::MifareClassic4kEmulated => "MIFARE Classic 4K (emu)",
            Self::MifareClassic1kInfineon => "MIFARE Classic 1K (Infineon)",
            Self::MifareProX => "MIFARE ProX",
            Self::Unknown(sak) => return write!(f, "Unknown (SAK={:#04X})", sak),
        };
        f.write_str(name)
    }
}

/// An ISO14443-A tag that answered a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// 4 or 7 bytes.
    pub uid: Vec<u8>,
    pub sak: u8,
    pub atqa: [u8; 2],
}

impl Tag {
    pub fn card_type(&self) -> CardType {
        CardType::from_sak(self.sak)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.uid {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, " ({})", self.card_type())
    }
}

fn block_check(uid: &[u8]) -> u8 {
    uid.iter().fold(0, |acc, byte| acc ^ byte)
}

#[derive(Debug)]
pub struct Cr95hf<S: SerialPort> {
    serial: S,
    device_name: String,
    last_atqa: [u8; 2],
}

impl<S: SerialPort> Cr95hf<S> {
    /// Wake the transceiver with `wake_pulse` worth of zero bytes, check that it echoes,
    /// identify it, and switch the RF front end to ISO14443-A.
    pub fn new(serial: S, wake_pulse: Duration) -> Result<Cr95hf<S>> {
        let mut nfc = Cr95hf { serial, device_name: String::new(), last_atqa: [0; 2] };
        nfc.initialize(wake_pulse)?;
        Ok(nfc)
    }

    fn initialize(&mut self, wake_pulse: Duration) -> Result<()> {
        self.flush()?;
        let started_at = Instant::now();
        while started_at.elapsed() < wake_pulse {
            self.serial.write(&[0x00; 20])?;
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(HFO_SETTLE);
        self.flush()?;

        self.echo()?;

        self.send_command(CMD_IDN, &[])?;
        let (code, data) = self.read_response(SETUP_TIMEOUT, "IDN response")?;
        if code != RSP_SUCCESS || data.len() < IDN_LENGTH {
            return Err(Error::Nfc(format!(
                "invalid IDN response: code {:#04x}, {} bytes", code, data.len())))
        }
        self.device_name = data[..IDN_LENGTH].iter()
            .take_while(|&&byte| byte != 0)
            .filter(|byte| byte.is_ascii_graphic() || **byte == b' ')
            .map(|&byte| byte as char)
            .collect();
        log::debug!("found NFC transceiver {:?}", self.device_name);

        self.select_protocol(PROTOCOL_ISO14443A, SETUP_TIMEOUT)
    }

    fn flush(&mut self) -> Result<()> {
        let mut buffer = [0u8; 64];
        while self.serial.bytes_available()? > 0 {
            if self.serial.read(&mut buffer)? == 0 { break }
        }
        Ok(())
    }

    fn echo(&mut self) -> Result<()> {
        self.flush()?;
        self.serial.write(&[CMD_ECHO])?;
        match self.read_byte(Instant::now(), SETUP_TIMEOUT, "echo")? {
            CMD_ECHO => Ok(()),
            byte => Err(Error::Nfc(format!("echo returned {:#04x}", byte))),
        }
    }

    fn send_command(&mut self, command: u8, data: &[u8]) -> Result<()> {
        let length = u8::try_from(data.len())
            .map_err(|_| Error::InvalidArgument("command too long"))?;
        let mut frame = Vec::with_capacity(data.len() + 2);
        frame.push(command);
        frame.push(length);
        frame.extend_from_slice(data);
        self.flush()?;
        log::trace!("nfc send {:02x?}", frame);
        self.serial.write(&frame)
    }

    fn read_byte(&mut self, started_at: Instant, timeout: Duration, what: &'static str)
            -> Result<u8> {
        let mut byte = [0u8];
        loop {
            if self.serial.read(&mut byte)? == 1 {
                return Ok(byte[0])
            }
            if started_at.elapsed() > timeout {
                return Err(Error::Timeout(what))
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Result code and payload of one response frame.
    fn read_response(&mut self, timeout: Duration, what: &'static str) -> Result<(u8, Vec<u8>)> {
        let started_at = Instant::now();
        let code = self.read_byte(started_at, timeout, what)?;
        let length = self.read_byte(started_at, timeout, what)? as usize;
        let mut data = vec![0u8; length];
        let mut received = 0;
        while received < length {
            match self.serial.read(&mut data[received..])? {
                0 if started_at.elapsed() > timeout =>
                    return Err(Error::Timeout(what)),
                0 => thread::sleep(POLL_INTERVAL),
                count => received += count,
            }
        }
        log::trace!("nfc recv {:#04x} {:02x?}", code, data);
        Ok((code, data))
    }

    fn select_protocol(&mut self, protocol: u8, timeout: Duration) -> Result<()> {
        self.send_command(CMD_PROTOCOL, &[protocol, 0x00])?;
        match self.read_response(timeout, "protocol select")? {
            (RSP_SUCCESS, _) => Ok(()),
            (code, _) => Err(Error::Nfc(format!("protocol select failed: code {:#04x}", code))),
        }
    }

    /// Payload of a tag response of at least `min_length` bytes, or `None` when no tag
    /// answered.
    fn send_receive(&mut self, rf_data: &[u8], flags: u8, min_length: usize)
            -> Result<Option<Vec<u8>>> {
        let mut command = rf_data.to_vec();
        command.push(flags);
        self.send_command(CMD_SENDRECV, &command)?;
        match self.read_response(RF_TIMEOUT, "tag response")? {
            (RSP_DATA, data) if data.len() >= min_length => Ok(Some(data)),
            (code, _) => {
                log::trace!("no tag response to {:#04x}: code {:#04x}", rf_data[0], code);
                Ok(None)
            }
        }
    }

    /// UID and BCC of one cascade level, if the BCC is consistent.
    fn anticollision(&mut self, select: u8) -> Result<Option<[u8; 5]>> {
        let Some(data) = self.send_receive(&[select, ISO14443A_NVB_ANTICOLL], FLAG_STANDARD, 5)?
            else { return Ok(None) };
        let mut uid_bcc = [0u8; 5];
        uid_bcc.copy_from_slice(&data[..5]);
        if block_check(&uid_bcc[..4]) != uid_bcc[4] {
            log::debug!("BCC mismatch in {:02x?}", uid_bcc);
            return Ok(None)
        }
        Ok(Some(uid_bcc))
    }

    fn select(&mut self, select: u8, uid_bcc: &[u8; 5]) -> Result<Option<u8>> {
        let mut rf_data = vec![select, ISO14443A_NVB_SELECT];
        rf_data.extend_from_slice(uid_bcc);
        Ok(self.send_receive(&rf_data, FLAG_STANDARD_CRC, 1)?.map(|data| data[0]))
    }

    /// Wake and select the tag in the field, if there is one.
    pub fn read_tag(&mut self) -> Result<Option<Tag>> {
        let atqa = match self.send_receive(&[ISO14443A_WUPA], FLAG_SHORT_FRAME, 2)? {
            Some(data) => data,
            None => match self.send_receive(&[ISO14443A_REQA], FLAG_SHORT_FRAME, 2)? {
                Some(data) => data,
                None => return Ok(None),
            }
        };
        self.last_atqa = [atqa[0], atqa[1]];

        let Some(cl1) = self.anticollision(ISO14443A_SEL_CL1)? else { return Ok(None) };
        let Some(sak) = self.select(ISO14443A_SEL_CL1, &cl1)? else { return Ok(None) };
        if cl1[0] != ISO14443A_CT {
            return Ok(Some(Tag { uid: cl1[..4].to_vec(), sak, atqa: self.last_atqa }))
        }

        let Some(cl2) = self.anticollision(ISO14443A_SEL_CL2)? else { return Ok(None) };
        let Some(sak) = self.select(ISO14443A_SEL_CL2, &cl2)? else { return Ok(None) };
        let mut uid = cl1[1..4].to_vec();
        uid.extend_from_slice(&cl2[..4]);
        Ok(Some(Tag { uid, sak, atqa: self.last_atqa }))
    }

    pub fn field_off(&mut self) -> Result<()> {
        log::debug!("field_off()");
        self.select_protocol(PROTOCOL_OFF, RF_TIMEOUT)
    }

    /// Identification string reported by the transceiver, e.g. `NFC FS2JAST4`.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn last_atqa(&self) -> [u8; 2] {
        self.last_atqa
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::sys::mock::MockSerial;

    const WAKE: Duration = Duration::from_millis(2);
    const IDN: &[u8] = b"NFC FS2JAST4\0\x2a\xce";

    fn response(code: u8, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![code, data.len() as u8];
        frame.extend_from_slice(data);
        frame
    }

    /// Answers the setup handshake and hands RF exchanges to `card`.
    pub(crate) fn transceiver<F>(mut card: F) -> MockSerial
            where F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static {
        MockSerial::new(move |frame| {
            match frame {
                [CMD_ECHO] => vec![CMD_ECHO],
                [CMD_IDN, 0] => response(RSP_SUCCESS, IDN),
                [CMD_PROTOCOL, 2, _, 0] => response(RSP_SUCCESS, &[]),
                [CMD_SENDRECV, _, rf_data @ ..] => match card(rf_data) {
                    Some(data) => response(RSP_DATA, &data),
                    None => response(0x87, &[]),
                },
                _ => vec![]
            }
        })
    }

    /// A tag with a 4-byte or 7-byte UID.
    pub(crate) fn card(uid: Vec<u8>, sak: u8) -> impl FnMut(&[u8]) -> Option<Vec<u8>> + Send {
        let levels: Vec<[u8; 4]> = if uid.len() == 4 {
            vec![[uid[0], uid[1], uid[2], uid[3]]]
        } else {
            vec![[ISO14443A_CT, uid[0], uid[1], uid[2]], [uid[3], uid[4], uid[5], uid[6]]]
        };
        move |rf_data| {
            let level = match rf_data.first() {
                Some(&ISO14443A_SEL_CL1) => 0,
                Some(&ISO14443A_SEL_CL2) => 1,
                Some(&ISO14443A_WUPA) => return Some(vec![0x44, 0x00, 0x28]),
                _ => return None,
            };
            let cascade = levels.get(level)?;
            match rf_data[1] {
                ISO14443A_NVB_ANTICOLL => {
                    let mut data = cascade.to_vec();
                    data.push(block_check(cascade));
                    data.extend_from_slice(&[0x28, 0x00, 0x00]);
                    Some(data)
                }
                ISO14443A_NVB_SELECT => {
                    let sak = if level + 1 < levels.len() { 0x04 } else { sak };
                    Some(vec![sak, 0xda, 0x48, 0x08])
                }
                _ => None
            }
        }
    }

    #[test]
    fn test_init_handshake() {
        let serial = transceiver(|_| None);
        let nfc = Cr95hf::new(serial.clone(), WAKE).unwrap();
        assert_eq!(nfc.device_name(), "NFC FS2JAST4");
        assert_eq!(serial.frames(), vec![
            vec![0x55],
            vec![0x01, 0x00],
            vec![0x02, 0x02, 0x02, 0x00],
        ]);
    }

    #[test]
    fn test_init_no_echo() {
        let serial = MockSerial::new(|_| vec![]);
        assert!(matches!(Cr95hf::new(serial, WAKE), Err(Error::Timeout("echo"))));
    }

    #[test]
    fn test_init_bad_idn() {
        let serial = MockSerial::new(|frame| match frame {
            [CMD_ECHO] => vec![CMD_ECHO],
            [CMD_IDN, 0] => response(RSP_SUCCESS, b"NFC"),
            _ => vec![]
        });
        assert!(matches!(Cr95hf::new(serial, WAKE), Err(Error::Nfc(_))));
    }

    #[test]
    fn test_no_tag() {
        let serial = transceiver(|_| None);
        let mut nfc = Cr95hf::new(serial.clone(), WAKE).unwrap();
        serial.clear();
        assert_eq!(nfc.read_tag().unwrap(), None);
        // WUPA, then REQA
        assert_eq!(serial.frames(), vec![
            vec![0x04, 0x02, 0x52, 0x07],
            vec![0x04, 0x02, 0x26, 0x07],
        ]);
    }

    #[test]
    fn test_single_size_uid() {
        let serial = transceiver(card(vec![0xde, 0xad, 0xbe, 0xef], 0x08));
        let mut nfc = Cr95hf::new(serial.clone(), WAKE).unwrap();
        serial.clear();
        let tag = nfc.read_tag().unwrap().unwrap();
        assert_eq!(tag.uid, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(tag.card_type(), CardType::MifareClassic1k);
        assert_eq!(tag.atqa, [0x44, 0x00]);
        assert_eq!(nfc.last_atqa(), [0x44, 0x00]);
        assert_eq!(tag.to_string(), "DEADBEEF (MIFARE Classic 1K)");
        assert_eq!(serial.frames()[2], vec![0x04, 0x08, 0x93, 0x70, 0xde, 0xad, 0xbe, 0xef,
            0xde ^ 0xad ^ 0xbe ^ 0xef, 0x28]);
    }

    #[test]
    fn test_double_size_uid() {
        let uid = vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        let serial = transceiver(card(uid.clone(), 0x00));
        let mut nfc = Cr95hf::new(serial, WAKE).unwrap();
        let tag = nfc.read_tag().unwrap().unwrap();
        assert_eq!(tag.uid, uid);
        assert_eq!(tag.card_type(), CardType::MifareUltralight);
    }

    #[test]
    fn test_bcc_mismatch() {
        let mut card = card(vec![0x01, 0x02, 0x03, 0x04], 0x08);
        let serial = transceiver(move |rf_data| {
            let mut data = card(rf_data)?;
            if rf_data[1] == ISO14443A_NVB_ANTICOLL {
                data[4] ^= 0xff;
            }
            Some(data)
        });
        let mut nfc = Cr95hf::new(serial, WAKE).unwrap();
        assert_eq!(nfc.read_tag().unwrap(), None);
    }

    #[test]
    fn test_field_off() {
        let serial = transceiver(|_| None);
        let mut nfc = Cr95hf::new(serial.clone(), WAKE).unwrap();
        serial.clear();
        nfc.field_off().unwrap();
        assert_eq!(serial.frames(), vec![vec![0x02, 0x02, 0x00, 0x00]]);
    }

    #[test]
    fn test_card_type_names() {
        assert_eq!(CardType::from_sak(0x20).to_string(), "MIFARE Plus/DESFire");
        assert_eq!(CardType::from_sak(0x98).to_string(), "MIFARE ProX");
        assert_eq!(CardType::from_sak(0x42).to_string(), "Unknown (SAK=0x42)");
    }
}
