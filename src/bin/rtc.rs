use std::time::SystemTime;

use yoto_mini::{Board, BoardConfiguration, DateTime, Error};

fn main() -> yoto_mini::Result<()> {
    env_logger::init();

    let config = BoardConfiguration {
        nfc: None,
        audio: None,
        battery: false,
        ..BoardConfiguration::from_env()
    };
    let mut board = Board::open(&config)?;
    match std::env::args().nth(1).as_deref() {
        None => (),
        Some("sync") => {
            let elapsed = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)
                .map_err(|error| Error::Other(error.into()))?;
            let datetime = DateTime::from_unix_timestamp(elapsed.as_secs() as i64)?;
            board.set_datetime(&datetime)?;
            println!("set RTC to {} UTC", datetime);
        }
        Some(_) => {
            eprintln!("usage: yoto-rtc [sync]");
            std::process::exit(2);
        }
    }
    if !board.rtc_valid()? {
        println!("RTC lost power; the time below is not valid");
    }
    if let Some(datetime) = board.datetime()? {
        println!("{}", datetime);
    }
    board.teardown()
}
