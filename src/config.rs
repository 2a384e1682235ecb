// Runtime configuration, read once from the environment

use std::time::Duration;

use crate::error::ConfigError;

pub const API_ENDPOINT: &str = "https://airlabs.co/api/v9/flights";

// 5 minutes keeps us around 9000 calls per month
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const IDLE_SLEEP: Duration = Duration::from_secs(1);
pub const RESULT_LIMIT: u32 = 10;

const DEFAULT_AIRPORT: &str = "EDDM";
const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
const DEFAULT_I2C_ADDRESS: u8 = 0x27;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Lcd,
    Terminal,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub airport: String,
    pub verbose: bool,
    pub display: DisplayKind,
    pub i2c_bus: String,
    pub i2c_address: u8,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Warns when there is no API key. Startup carries on, each query will fail on its own.
    pub fn check_credential(&self) -> bool {
        if self.api_key.is_none() {
            log::warn!("API_KEY not set, flight queries will fail");
            return false;
        }
        true
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let api_key = value("API_KEY");

        let airport = match value("FLIGHT_AIRPORT") {
            Some(code) => parse_airport("FLIGHT_AIRPORT", &code)?,
            None => String::from(DEFAULT_AIRPORT),
        };

        let verbose = match value("FLIGHT_VERBOSE") {
            Some(flag) => parse_flag("FLIGHT_VERBOSE", &flag)?,
            None => false,
        };

        let display = match value("FLIGHT_DISPLAY").as_deref() {
            None => DisplayKind::Lcd,
            Some(kind) => match kind.to_ascii_lowercase().as_str() {
                "lcd" => DisplayKind::Lcd,
                "terminal" => DisplayKind::Terminal,
                _ => {
                    return Err(ConfigError::Choice {
                        name: "FLIGHT_DISPLAY",
                        expected: "lcd, terminal",
                        value: kind.to_owned(),
                    })
                }
            },
        };

        let i2c_bus = value("LCD_I2C_BUS").unwrap_or_else(|| String::from(DEFAULT_I2C_BUS));

        let i2c_address = match value("LCD_I2C_ADDRESS") {
            Some(addr) => parse_address("LCD_I2C_ADDRESS", &addr)?,
            None => DEFAULT_I2C_ADDRESS,
        };

        Ok(Config {
            api_key,
            airport,
            verbose,
            display,
            i2c_bus,
            i2c_address,
        })
    }
}

fn parse_airport(name: &'static str, code: &str) -> Result<String, ConfigError> {
    if code.len() == 4 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ConfigError::Airport {
            name,
            value: code.to_owned(),
        })
    }
}

fn parse_flag(name: &'static str, flag: &str) -> Result<bool, ConfigError> {
    match flag.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Choice {
            name,
            expected: "true, false",
            value: flag.to_owned(),
        }),
    }
}

fn parse_address(name: &'static str, addr: &str) -> Result<u8, ConfigError> {
    let parsed = match addr.strip_prefix("0x").or_else(|| addr.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => addr.parse::<u8>(),
    };

    match parsed {
        Ok(a) if a <= 0x7f => Ok(a),
        _ => Err(ConfigError::Address {
            name,
            value: addr.to_owned(),
        }),
    }
}
