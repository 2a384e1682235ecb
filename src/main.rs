use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use api::{FlightFetcher, FlightQuery};
use config::{Config, DisplayKind};
use display::CharacterDisplay;
use frontend::TerminalDisplay;
use log::LevelFilter;
use poller::{Poller, SystemClock};

mod api;
mod config;
mod display;
mod error;
mod frontend;
mod poller;

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::builder()
        .filter_module(env!("CARGO_CRATE_NAME"), level)
        .parse_default_env()
        .init();
}

fn open_display(config: &Config) -> Result<Box<dyn CharacterDisplay>, Box<dyn Error>> {
    let display: Box<dyn CharacterDisplay> = match config.display {
        DisplayKind::Lcd => {
            log::info!(
                "opening LCD at {} address {:#04x}",
                config.i2c_bus,
                config.i2c_address
            );
            Box::new(display::open_lcd(&config.i2c_bus, config.i2c_address)?)
        }
        DisplayKind::Terminal => Box::new(TerminalDisplay::new(&config.airport)?),
    };
    Ok(display)
}

fn main() -> Result<(), Box<dyn Error>> {
    let dotenv = dotenvy::dotenv();
    let config = Config::from_env()?;
    init_logging(config.verbose);

    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("ignoring unreadable .env file: {e}");
        }
    }

    log::info!("program is starting, watching {}", config.airport);
    config.check_credential();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    // no display is fatal
    let display = open_display(&config)?;

    let query = FlightQuery::new(config::API_ENDPOINT, &config.airport, config.api_key.clone());
    let fetcher = FlightFetcher::new(query, config::REQUEST_TIMEOUT)?;

    let mut poller = Poller::new(
        display,
        fetcher,
        SystemClock,
        config::REFRESH_INTERVAL,
        config::IDLE_SLEEP,
    );
    poller.run(&stop);

    Ok(())
}
