//! Fakes shared by the scheduler and controller tests.

use crate::api::{BoardSource, Connection, FetchError, Station, StationBoard, Stop};
use crate::config::AppConfig;
use crate::render::Renderer;
use crate::scheduler::CycleOutcome;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

pub fn connection(index: usize) -> Connection {
    Connection {
        stop: Stop {
            departure: format!("2024-03-01T14:{:02}:00+0100", index % 60),
            delay: None,
            platform: (index % 12 + 1).to_string(),
        },
        to: format!("Destination {index}"),
        category: "IR".into(),
        number: index.to_string(),
        operator: "SBB".into(),
    }
}

/// Answers every station with `connections` synthetic departures, except the ones marked failing.
#[derive(Default)]
pub struct FakeSource {
    connections: usize,
    failing: HashSet<String>,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
    limits: Mutex<Vec<u32>>,
}

impl FakeSource {
    pub fn new(connections: usize) -> Self {
        Self {
            connections,
            ..Default::default()
        }
    }

    pub fn failing(mut self, station: &str) -> Self {
        self.failing.insert(station.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn limits(&self) -> Vec<u32> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl BoardSource for FakeSource {
    async fn fetch_board(&self, station_name: &str, limit: u32) -> Result<StationBoard, FetchError> {
        self.calls.lock().unwrap().push(station_name.to_string());
        self.limits.lock().unwrap().push(limit);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.contains(station_name) {
            return Err(FetchError::Request {
                station: station_name.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        Ok(StationBoard {
            station: Station {
                id: format!("id-{station_name}"),
                name: station_name.to_string(),
            },
            connections: (0..self.connections).map(connection).collect(),
        })
    }
}

/// Remembers which stations each rendered cycle was for and whether it succeeded.
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<(Vec<String>, bool)>>,
}

impl RecordingRenderer {
    pub fn count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }

    pub fn failures(&self) -> usize {
        self.rendered.lock().unwrap().iter().filter(|(_, ok)| !ok).count()
    }

    pub fn last_stations(&self) -> Vec<String> {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .map(|(stations, _)| stations.clone())
            .unwrap_or_default()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, config: &AppConfig, outcome: &CycleOutcome) {
        self.rendered
            .lock()
            .unwrap()
            .push((config.stations.clone(), outcome.is_ok()));
    }
}

/// Lets spawned timer and cycle tasks run on the current-thread test runtime.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
