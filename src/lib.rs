//! Terminal dashboard for upcoming SBB departures.
//! Polls transport.opendata.ch for a handful of stations and redraws every few minutes.

pub mod api;
pub mod config;
pub mod controller;
pub mod logging;
pub mod render;
pub mod scheduler;
pub mod setup;

#[cfg(test)]
mod testing;
