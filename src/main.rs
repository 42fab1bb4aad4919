extern crate chrono;
extern crate clap;
extern crate crossterm;
extern crate ctrlc;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate log4rs;
extern crate ratatui;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate toml;

#[cfg(feature = "hardware")]
extern crate rppal;

#[cfg(test)]
extern crate proptest;

mod config_file;
mod errors;
mod integrations;
mod light;
mod network;
mod poller;
mod presentation;
mod remote_status;
mod screen;
mod station;

use clap::{Args, Parser};
use config_file::Config;
use failure::Error;
use integrations::opscreen_integration::OpScreenIntegration;
use light::SignalLight;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use poller::Poller;
use presentation::{blink_out, display_text, signal_events, PULSE_GAP};
use screen::Screen;
use station::{FeedFormat, StationProfile};
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT_SECS: u64 = 30;

lazy_static! {
    static ref HTTP_CLIENT: reqwest::blocking::Client = build_http_client();
}

fn build_http_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::blocking::Client::new())
}

/// Blink out the status of an LWA station on an RGB LED and show it in the terminal.
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    station: StationArgs,

    /// Scrape the old os2.php status page instead of status.json
    #[arg(long)]
    legacy_feed: bool,

    /// Config file (defaults to config.toml next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct StationArgs {
    /// Report on LWA1 (the default)
    #[arg(long)]
    lwa1: bool,

    /// Report on LWA-SV
    #[arg(long)]
    lwasv: bool,

    /// Report on LWA-NA
    #[arg(long)]
    lwana: bool,
}

impl Cli {
    fn station(&self) -> StationProfile {
        let station = if self.station.lwana {
            StationProfile::lwana()
        } else if self.station.lwasv {
            StationProfile::lwasv()
        } else {
            StationProfile::lwa1()
        };

        if self.legacy_feed {
            station.with_feed_format(FeedFormat::LegacyHtml)
        } else {
            station
        }
    }

    fn config_path(&self) -> PathBuf {
        match self.config {
            Some(ref path) => path.clone(),
            None => env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join("config.toml")))
                .unwrap_or_else(|| PathBuf::from("config.toml")),
        }
    }
}

// The terminal belongs to the status panel, so everything is logged to a file.
fn init_logging(config: &Config) -> Result<(), Error> {
    let level = config
        .log_level
        .parse::<LevelFilter>()
        .map_err(|_| format_err!("Unknown log level '{}'", config.log_level))?;

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} [{T}] {m}{n}",
        )))
        .build(&config.log_file)?;

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(level))?;

    log4rs::init_config(log_config)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config_path();
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("Unable to start logging to {}: {}", config.log_file, e);
    }
    info!("Loaded config from {}.", config_path.display());

    match run(&config, cli.station()) {
        Ok(last_screen) => println!("{}", last_screen),
        Err(e) => {
            error!("Exiting after error: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Runs the panel until the user quits. Returns the last panel shown.
fn run(config: &Config, station: StationProfile) -> Result<String, Error> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_running = running.clone();
    ctrlc::set_handler(move || handler_running.store(false, Ordering::SeqCst))?;

    let mut light = light::find_first(&config.light);
    info!("Using: {}", light.describe());

    let poller_config = config.poller_config(station.clone());
    let mut poller = Poller::new(OpScreenIntegration::new(&poller_config), &poller_config);
    poller.start()?;
    if !poller
        .cache()
        .wait_for_first_update(config.first_update_wait())
    {
        warn!(
            "No status for {} yet, starting with the stale default.",
            station.station_id
        );
    }

    let result = match Screen::open() {
        Ok(mut screen) => {
            let outcome = display_loop(
                &mut screen,
                &poller,
                &mut *light,
                &station,
                config.display_refresh(),
                &running,
            );
            let contents = screen.contents().to_string();
            drop(screen);
            outcome.map(|_| contents)
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = light.turn_off() {
        warn!("--Light--: Failed to turn off {}. Details: {}", light.describe(), e);
    }
    poller.stop();

    result
}

fn display_loop(
    screen: &mut Screen,
    poller: &Poller<OpScreenIntegration>,
    light: &mut dyn SignalLight,
    station: &StationProfile,
    refresh: Duration,
    running: &AtomicBool,
) -> Result<(), Error> {
    let mut record = poller.status();
    screen.show(&display_text(station, &record))?;
    let mut last_refresh = Instant::now();

    while running.load(Ordering::SeqCst) {
        if last_refresh.elapsed() >= refresh {
            record = poller.status();
            screen.show(&display_text(station, &record))?;
            last_refresh = Instant::now();
        }

        blink_out(light, &signal_events(&record), PULSE_GAP);

        if screen.quit_requested()? {
            info!("Quit requested.");
            break;
        }
    }
    Ok(())
}
