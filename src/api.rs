//! Stationboard client for transport.opendata.ch
//! One GET per station, no retries, no caching. The caller decides what a failure means.
//! Response shapes mirror the upstream JSON; unknown fields are ignored.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const API_BASE: &str = "https://transport.opendata.ch/v1/stationboard";
pub const DEFAULT_LIMIT: u32 = 10;

// *************** Response Types ***************

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// ISO 8601 with offset, e.g. `2024-03-01T14:32:00+0100`
    pub departure: String,
    /// Minutes late. `None` means upstream has no delay information.
    pub delay: Option<i64>,
    /// Empty when the platform is unknown. Upstream sometimes sends null here too.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub stop: Stop,
    pub to: String,
    pub category: String,
    pub number: String,
    pub operator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationBoard {
    pub station: Station,
    #[serde(rename = "stationboard")]
    pub connections: Vec<Connection>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// *************** Errors ***************

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Station name must not be empty")]
    EmptyStation,

    #[error("Failed to fetch timetable for {station}: HTTP {status}")]
    Request { station: String, status: StatusCode },

    #[error("Failed to parse timetable for {station}: {source}")]
    Parse {
        station: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network error while fetching timetable for {station}: {source}")]
    Network {
        station: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Station the failed request was for, if any.
    pub fn station(&self) -> Option<&str> {
        match self {
            FetchError::EmptyStation => None,
            FetchError::Request { station, .. }
            | FetchError::Parse { station, .. }
            | FetchError::Network { station, .. } => Some(station),
        }
    }
}

// *************** Public API ***************

/// Anything that can produce a stationboard for a station name.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn fetch_board(&self, station_name: &str, limit: u32) -> Result<StationBoard, FetchError>;
}

#[derive(Debug, Clone)]
pub struct StationboardClient {
    client: Client,
    base_url: String,
}

impl StationboardClient {
    /// Builds a client for `base_url`. Without `timeout`, reqwest's defaults apply
    /// and a stalled connection can hang the cycle.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }

    /// Full request URL for a station, with the name percent-encoded.
    pub fn board_url(&self, station_name: &str, limit: u32) -> String {
        format!(
            "{}?station={}&limit={}",
            self.base_url,
            urlencoding::encode(station_name),
            limit
        )
    }
}

#[async_trait]
impl BoardSource for StationboardClient {
    async fn fetch_board(&self, station_name: &str, limit: u32) -> Result<StationBoard, FetchError> {
        if station_name.trim().is_empty() {
            return Err(FetchError::EmptyStation);
        }

        let url = self.board_url(station_name, limit);
        tracing::debug!(station = station_name, %url, "fetching stationboard");

        let network = |source| FetchError::Network {
            station: station_name.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(network)?;

        if !response.status().is_success() {
            return Err(FetchError::Request {
                station: station_name.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().await.map_err(network)?;
        let board: StationBoard =
            serde_json::from_str(&body).map_err(|source| FetchError::Parse {
                station: station_name.to_string(),
                source,
            })?;

        tracing::debug!(
            station = station_name,
            connections = board.connections.len(),
            "stationboard received"
        );
        Ok(board)
    }
}

// *************** Tests ***************
