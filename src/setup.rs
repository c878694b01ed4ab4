//! Interactive settings form: language plus four station slots.
//! Pre-filled from the current config, or the defaults on first run.

use crate::config::{AppConfig, ConfigError, Language};
use crate::render::labels;
use anyhow::{Context, Result};
use dialoguer::{Input, Select};

pub const STATION_SLOTS: usize = 4;

/// Asks until at least one station is entered. `current` is `None` on first run.
pub fn prompt_settings(current: Option<&AppConfig>) -> Result<AppConfig> {
    let defaults = AppConfig::default();
    let initial = current.unwrap_or(&defaults);
    let t = labels(initial.language);

    println!();
    println!("{}", if current.is_some() { t.settings } else { t.setup_title });

    let language_index = Language::ALL
        .iter()
        .position(|l| *l == initial.language)
        .unwrap_or(0);
    let selected = Select::new()
        .with_prompt(t.lang_label)
        .items(&Language::ALL[..])
        .default(language_index)
        .interact()
        .context("Failed to read language selection")?;
    let language = Language::ALL[selected];
    let t = labels(language);

    loop {
        let mut entries = Vec::with_capacity(STATION_SLOTS);
        for slot in 0..STATION_SLOTS {
            let entry: String = Input::new()
                .with_prompt(format!("{} {}", t.station_label, slot + 1))
                .with_initial_text(initial.stations.get(slot).cloned().unwrap_or_default())
                .allow_empty(true)
                .interact_text()
                .context("Failed to read station name")?;
            entries.push(entry);
        }

        match AppConfig::new(&entries, language) {
            Ok(config) => {
                println!("{} ✓", if current.is_some() { t.save } else { t.start });
                return Ok(config);
            }
            Err(ConfigError::NoStations) => println!("{}", t.need_station),
            Err(e) => return Err(e.into()),
        }
    }
}
