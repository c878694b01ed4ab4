//! Refresh scheduler.
//! Runs one fetch-and-render cycle immediately on `start`, then one per period.
//! Each cycle fetches every configured station concurrently and renders only after all have settled.
//! A single failed station fails the whole cycle; boards that did arrive are dropped.
//! Restarting aborts the old timer task. Cycles already running are left to finish.

use crate::api::{BoardSource, DEFAULT_LIMIT, FetchError, StationBoard};
use crate::config::AppConfig;
use crate::render::Renderer;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 5 minutes
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(300);

/// Connections kept per station card.
pub const DISPLAY_LIMIT: usize = 8;

pub type CycleOutcome = Result<Vec<StationBoard>, FetchError>;

/// Fetches every station and joins the results in configuration order.
///
/// All requests are awaited even after one fails; the first error in station order wins.
pub async fn refresh_cycle(source: &dyn BoardSource, stations: &[String]) -> CycleOutcome {
    let fetches = stations
        .iter()
        .map(|station| source.fetch_board(station, DEFAULT_LIMIT));

    let mut boards = join_all(fetches)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    for board in &mut boards {
        board.connections.truncate(DISPLAY_LIMIT);
    }
    Ok(boards)
}

async fn run_cycle(source: Arc<dyn BoardSource>, renderer: Arc<dyn Renderer>, config: Arc<AppConfig>) {
    let outcome = refresh_cycle(source.as_ref(), &config.stations).await;
    match &outcome {
        Ok(boards) => tracing::info!(stations = boards.len(), "refresh cycle complete"),
        Err(e) => tracing::warn!(error = %e, station = e.station(), "refresh cycle failed"),
    }
    renderer.render(&config, &outcome);
}

pub struct RefreshScheduler {
    source: Arc<dyn BoardSource>,
    renderer: Arc<dyn Renderer>,
    period: Duration,
    timer: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// `period` must be non-zero.
    pub fn new(source: Arc<dyn BoardSource>, renderer: Arc<dyn Renderer>, period: Duration) -> Self {
        Self {
            source,
            renderer,
            period,
            timer: None,
        }
    }

    /// Disarms any previous timer, then arms a new one whose first tick fires immediately.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, config: AppConfig) {
        self.stop();

        let source = Arc::clone(&self.source);
        let renderer = Arc::clone(&self.renderer);
        let period = self.period;
        let config = Arc::new(config);

        tracing::info!(
            stations = ?config.stations,
            period_secs = period.as_secs(),
            "refresh scheduled"
        );

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!("Refreshing data...");
                // Detached so that disarming the timer never cuts a cycle short
                tokio::spawn(run_cycle(
                    Arc::clone(&source),
                    Arc::clone(&renderer),
                    Arc::clone(&config),
                ));
            }
        }));
    }

    /// Stops future ticks. In-flight cycles still render.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!("refresh timer disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// One cycle outside the timer, rendered like any other. Used by `--once`.
    pub async fn run_once(&self, config: &AppConfig) -> CycleOutcome {
        let outcome = refresh_cycle(self.source.as_ref(), &config.stations).await;
        self.renderer.render(config, &outcome);
        outcome
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
