// API access and data structures

use std::time::Duration;

use reqwest::{blocking::Client, Url};
use serde::Deserialize;

use crate::{config::RESULT_LIMIT, error::FetchError};

const FIELDS: &str = "flight_number,status,updated";
const BODY_LOG_LIMIT: usize = 200;

pub const NO_TRAFFIC: &str = "No traffic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    EnRoute,
    Landed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::EnRoute => "en-route",
            FlightStatus::Landed => "landed",
        }
    }
}

#[derive(Default, Deserialize, Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub flight_number: Option<String>,
    pub status: Option<String>,
    pub updated: Option<f64>, // unix seconds
}

impl FlightRecord {
    /// `"<flight number> <first 4 letters of the status>"`, e.g. `"LH2471 LAND"`.
    pub fn summary(&self) -> String {
        let number = self.flight_number.as_deref().unwrap_or("UNK");
        let status: String = self
            .status
            .as_deref()
            .unwrap_or("")
            .to_uppercase()
            .chars()
            .take(4)
            .collect();

        format!("{number} {status}")
    }
}

#[derive(Default, Deserialize, Debug)]
pub struct FlightsResponse {
    #[serde(default)]
    pub response: Vec<FlightRecord>,
}

impl FlightsResponse {
    /// Most recently updated flight. Equal timestamps keep the order the API sent them in.
    pub fn latest(mut self) -> Option<FlightRecord> {
        self.response.sort_by(|a, b| {
            let a = a.updated.unwrap_or(0.0);
            let b = b.updated.unwrap_or(0.0);
            b.total_cmp(&a)
        });
        self.response.into_iter().next()
    }
}

// Traffic local to one airport: arrival and departure filter are the same code
#[derive(Debug, Clone)]
pub struct FlightQuery {
    pub endpoint: String,
    pub airport: String,
    pub api_key: Option<String>,
    pub statuses: Vec<FlightStatus>,
    pub limit: u32,
}

impl FlightQuery {
    pub fn new(endpoint: &str, airport: &str, api_key: Option<String>) -> FlightQuery {
        FlightQuery {
            endpoint: endpoint.to_owned(),
            airport: airport.to_owned(),
            api_key,
            statuses: vec![FlightStatus::EnRoute, FlightStatus::Landed],
            limit: RESULT_LIMIT,
        }
    }

    pub fn url(&self) -> Result<Url, FetchError> {
        self.build_url(self.api_key.as_deref().unwrap_or(""))
    }

    /// Same URL with the key masked, safe to log.
    pub fn redacted_url(&self) -> String {
        match self.build_url("***") {
            Ok(url) => url.to_string(),
            Err(_) => self.endpoint.clone(),
        }
    }

    fn build_url(&self, key: &str) -> Result<Url, FetchError> {
        let statuses = self
            .statuses
            .iter()
            .map(FlightStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let limit = self.limit.to_string();

        Url::parse_with_params(
            &self.endpoint,
            [
                ("api_key", key),
                ("arr_icao", self.airport.as_str()),
                ("dep_icao", self.airport.as_str()),
                ("status", statuses.as_str()),
                ("_fields", FIELDS),
                ("_view", "array"),
                ("limit", limit.as_str()),
            ],
        )
        .map_err(|e| FetchError::Other(Box::new(e)))
    }
}

/// Anything that can produce the text for the flight row.
pub trait FlightSource {
    fn get_next_flight(&mut self) -> String;
}

pub struct FlightFetcher {
    client: Client,
    query: FlightQuery,
}

impl FlightFetcher {
    pub fn new(query: FlightQuery, timeout: Duration) -> Result<FlightFetcher, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(FlightFetcher::with_client(client, query))
    }

    pub fn with_client(client: Client, query: FlightQuery) -> FlightFetcher {
        FlightFetcher { client, query }
    }

    /// One request, no retries. `Ok(None)` means the airport is quiet.
    pub fn fetch(&self) -> Result<Option<FlightRecord>, FetchError> {
        let url = self.query.url()?;
        log::debug!("requesting {}", self.query.redacted_url());
        log::debug!("api key present: {}", self.query.api_key.is_some());

        let response = self.client.get(url).send().map_err(FetchError::from_reqwest)?;
        let status = response.status();
        log::debug!("response status: {status}");
        log::debug!("response headers: {:?}", response.headers());

        // a known failure status wins over a body that can't be read
        let body = match response.text() {
            Ok(body) => {
                log::debug!("response body: {}", truncate(&body, BODY_LOG_LIMIT));
                body
            }
            Err(e) if !status.is_success() => {
                log::debug!("could not read error body: {e}");
                return Err(FetchError::Status(status.as_u16()));
            }
            Err(e) => return Err(FetchError::from_reqwest(e)),
        };

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let flights: FlightsResponse = serde_json::from_str(&body)?;
        Ok(flights.latest())
    }
}

impl FlightSource for FlightFetcher {
    fn get_next_flight(&mut self) -> String {
        match self.fetch() {
            Ok(Some(flight)) => flight.summary(),
            Ok(None) => String::from(NO_TRAFFIC),
            Err(e) => {
                log::warn!("flight query for {} failed: {e}", self.query.airport);
                e.display_text()
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
