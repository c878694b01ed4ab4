//! Terminal rendering of refresh cycle outcomes.
//! Pure string building in `render_*` functions; `TerminalRenderer` only decides where the text goes.

use crate::api::{Connection, StationBoard};
use crate::config::{AppConfig, Language};
use crate::scheduler::CycleOutcome;
use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const TIME_WIDTH: usize = 13;
const TRAIN_WIDTH: usize = 8;
const DEST_WIDTH: usize = 28;

/// UI strings for one language.
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub setup_title: &'static str,
    pub time: &'static str,
    pub destination: &'static str,
    pub plat: &'static str,
    pub train: &'static str,
    pub settings: &'static str,
    pub save: &'static str,
    pub start: &'static str,
    pub station_label: &'static str,
    pub lang_label: &'static str,
    pub updated: &'static str,
    pub load_error: &'static str,
    pub need_station: &'static str,
}

const EN: Labels = Labels {
    title: "SBB Timetable",
    setup_title: "Setup / Konfiguration",
    time: "Time",
    destination: "Destination",
    plat: "Plat.",
    train: "Train",
    settings: "Settings",
    save: "Save",
    start: "Start",
    station_label: "Station",
    lang_label: "Language / Sprache",
    updated: "Updated",
    load_error: "Error loading data. Check the log.",
    need_station: "Please enter at least one station.",
};

const DE: Labels = Labels {
    title: "SBB Fahrplan Dashboard",
    setup_title: "Setup / Konfiguration",
    time: "Zeit",
    destination: "Nach",
    plat: "Gl.",
    train: "Zug",
    settings: "Einstellungen",
    save: "Speichern",
    start: "Start",
    station_label: "Bahnhof",
    lang_label: "Language / Sprache",
    updated: "Aktualisiert",
    load_error: "Fehler beim Laden der Daten. Siehe Log.",
    need_station: "Bitte mindestens einen Bahnhof eingeben.",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::De => &DE,
    }
}

/// Consumer of refresh cycle outcomes.
pub trait Renderer: Send + Sync {
    fn render(&self, config: &AppConfig, outcome: &CycleOutcome);
}

/// Writes the dashboard to stdout, redrawing the whole screen each cycle when attached to a terminal.
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    color: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, config: &AppConfig, outcome: &CycleOutcome) {
        let mut out = String::new();
        if self.color {
            out.push_str(CLEAR_SCREEN);
        }
        let updated = chrono::Local::now().format("%H:%M").to_string();
        out.push_str(&render_outcome(config.language, outcome, &updated, self.color));
        if self.color {
            let _ = writeln!(out, "[s] {}  [q] Quit", labels(config.language).settings);
        }

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(out.as_bytes()).and_then(|_| stdout.flush()) {
            tracing::warn!(error = %e, "failed to write dashboard to stdout");
        }
    }
}

/// Whole dashboard for one cycle: header, then either every board or the error line.
pub fn render_outcome(language: Language, outcome: &CycleOutcome, updated: &str, color: bool) -> String {
    let t = labels(language);
    let mut out = String::new();

    let _ = writeln!(out, "SBB ↔ CFF ↔ FFS   {}", t.title);
    let _ = writeln!(out, "{} {}", t.updated, updated);
    out.push('\n');

    match outcome {
        Ok(boards) => {
            for board in boards {
                out.push_str(&render_board(board, language, color));
                out.push('\n');
            }
        }
        Err(_) => {
            if color {
                let _ = writeln!(out, "{RED}{}{RESET}", t.load_error);
            } else {
                let _ = writeln!(out, "{}", t.load_error);
            }
        }
    }

    out
}

/// One station card.
pub fn render_board(board: &StationBoard, language: Language, color: bool) -> String {
    let t = labels(language);
    let mut out = String::new();

    if color {
        let _ = writeln!(out, "{BOLD}{}{RESET}", board.station.name);
    } else {
        let _ = writeln!(out, "{}", board.station.name);
    }
    let _ = writeln!(
        out,
        "{:<TIME_WIDTH$} {:<TRAIN_WIDTH$} {:<DEST_WIDTH$} {}",
        t.time, t.train, t.destination, t.plat
    );

    for conn in &board.connections {
        out.push_str(&render_connection(conn, color));
        out.push('\n');
    }
    out
}

pub fn render_connection(conn: &Connection, color: bool) -> String {
    let delay = conn.stop.delay.filter(|d| *d > 0);
    let time = match delay {
        Some(d) => format!("{} (+{}')", format_time(&conn.stop.departure), d),
        None => format_time(&conn.stop.departure),
    };
    let time = format!("{:<TIME_WIDTH$}", time);
    let time = match (delay, color) {
        (Some(_), true) => format!("{RED}{time}{RESET}"),
        _ => time,
    };

    let train = format!("{}{}", conn.category, conn.number);
    let platform = if conn.stop.platform.is_empty() {
        "-"
    } else {
        conn.stop.platform.as_str()
    };

    format!(
        "{} {:<TRAIN_WIDTH$} {:<DEST_WIDTH$} {}",
        time, train, conn.to, platform
    )
}

/// `HH:MM` in the timestamp's own offset. Falls back to the raw string if it does not parse.
pub fn format_time(iso: &str) -> String {
    parse_departure(iso)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| iso.to_string())
}

fn parse_departure(iso: &str) -> Option<DateTime<FixedOffset>> {
    // Upstream uses `+0100`, RFC 3339 wants `+01:00`
    DateTime::parse_from_rfc3339(iso)
        .or_else(|_| DateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}
