// Error types

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a four letter ICAO code, got {value:?}")]
    Airport { name: &'static str, value: String },

    #[error("{name} must be a 7-bit I2C address, got {value:?}")]
    Address { name: &'static str, value: String },

    #[error("{name} must be one of {expected}, got {value:?}")]
    Choice {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Why a flight query produced no flight. Each kind has its own short text for the display.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("server answered with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("network failure")]
    Network(#[source] reqwest::Error),

    #[error("malformed response body")]
    Json(#[from] serde_json::Error),

    #[error("unexpected failure")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            FetchError::Network(err)
        } else {
            FetchError::Other(Box::new(err))
        }
    }

    // fits on one LCD row next to nothing else
    pub fn display_text(&self) -> String {
        match self {
            FetchError::Status(code) => format!("HTTP {code}"),
            FetchError::Timeout(_) => String::from("API timeout"),
            FetchError::Network(_) => String::from("Network error"),
            FetchError::Json(_) => String::from("JSON error"),
            FetchError::Other(_) => String::from("API error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to open display bus {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("display bus transfer failed: {0}")]
    Bus(embedded_hal::i2c::ErrorKind),

    #[error("row {row} does not exist on a two row display")]
    Position { row: u8 },

    #[error("terminal output failed")]
    Terminal(#[from] std::io::Error),

    #[cfg(not(target_os = "linux"))]
    #[error("no display backend available: {0}")]
    Unsupported(&'static str),
}
