use std::thread::sleep;
use std::time::Duration;

use yoto_mini::{Board, BoardConfiguration};

const VOLUME_STEP: i32 = 5;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn print_battery(board: &mut Board) -> yoto_mini::Result<()> {
    if let Some(status) = board.charge_status()? {
        println!("battery: {:?}, VBUS {:?}, power good: {}",
            status.charge, status.vbus, status.power_good);
        if board.charging()? {
            println!("   charging at up to {} mA", board.charge_current()?.unwrap_or(0));
        } else if board.charge_complete()? {
            println!("   fully charged");
        }
    }
    Ok(())
}

fn main() -> yoto_mini::Result<()> {
    env_logger::init();

    let mut board = Board::open(&BoardConfiguration::from_env())?;
    println!("Yoto Mini demo");

    if board.rtc_valid()? {
        if let Some(datetime) = board.datetime()? {
            println!("current time: {}", datetime);
        }
    } else {
        println!("RTC needs to be set; run `yoto-rtc sync`");
    }
    print_battery(&mut board)?;
    if let (Some(voltage), Some(current)) = (board.charge_voltage()?, board.charge_current()?) {
        println!("charge limits: {} mV, {} mA", voltage, current);
    }
    println!("volume: {}", board.volume()?);
    if board.encoders_attached() {
        println!("left encoder changes volume");
    } else {
        println!("encoders not configured; set YOTO_ENCODER_LEFT and YOTO_ENCODER_RIGHT");
    }
    println!("scan NFC tags; left button toggles mute, right button shows battery");

    let mut last_uid = None;
    let (mut last_left_button, mut last_right_button) = (false, false);
    loop {
        match board.read_nfc_tag()? {
            Some(tag) if last_uid.as_ref() != Some(&tag.uid) => {
                println!("NFC tag: {}", tag);
                last_uid = Some(tag.uid);
            }
            Some(_) => (),
            None => last_uid = None,
        }

        let delta = board.encoder_left_delta()?;
        if delta != 0 {
            println!("volume: {}", board.adjust_volume(delta * VOLUME_STEP)?);
        }
        let delta = board.encoder_right_delta()?;
        if delta != 0 {
            println!("right encoder: {}", board.encoder_right_position()?);
        }

        let left_button = board.encoder_left_button()?;
        if left_button && !last_left_button {
            let mute = !board.mute()?;
            board.set_mute(mute)?;
            println!("{}", if mute { "muted" } else { "unmuted" });
        }
        last_left_button = left_button;

        let right_button = board.encoder_right_button()?;
        if right_button && !last_right_button {
            print_battery(&mut board)?;
        }
        last_right_button = right_button;

        sleep(POLL_INTERVAL);
    }
}
