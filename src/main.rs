use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use sbb_dashboard::api::{API_BASE, StationboardClient};
use sbb_dashboard::config::{AppConfig, ConfigStore, Language};
use sbb_dashboard::controller::{Controller, Startup};
use sbb_dashboard::logging::init_logging;
use sbb_dashboard::render::TerminalRenderer;
use sbb_dashboard::scheduler::{DEFAULT_PERIOD, RefreshScheduler};
use sbb_dashboard::setup::prompt_settings;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

fn cli() -> Command {
    Command::new("sbb-dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upcoming SBB departures for a few stations, refreshed in the terminal")
        .arg(
            Arg::new("station")
                .long("station")
                .short('s')
                .value_name("NAME")
                .help("Station to show (repeat for several); replaces the saved list")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .value_name("LANG")
                .help("Display language")
                .value_parser(["en", "de"]),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_name("SECS")
                .help("Seconds between refreshes [default: 300]")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("HTTP request timeout (default: none)")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Config file to use instead of the per-user default")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("Stationboard endpoint")
                .default_value(API_BASE),
        )
        .arg(
            Arg::new("setup")
                .long("setup")
                .help("Open the settings form before starting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Fetch and print a single refresh, then exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("quiet"));

    let store = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location().context("Failed to locate config file")?,
    };

    let timeout = matches
        .get_one::<u64>("timeout")
        .map(|secs| Duration::from_secs(*secs));
    let api_url = matches
        .get_one::<String>("api-url")
        .cloned()
        .unwrap_or_else(|| API_BASE.to_string());
    let client = StationboardClient::new(api_url, timeout).context("Failed to create HTTP client")?;

    let period = matches
        .get_one::<u64>("interval")
        .map(|secs| Duration::from_secs(*secs))
        .unwrap_or(DEFAULT_PERIOD);

    let scheduler = RefreshScheduler::new(Arc::new(client), Arc::new(TerminalRenderer::new()), period);
    let mut controller = Controller::new(store, scheduler);

    if matches.get_flag("once") {
        return run_once(&matches, &controller).await;
    }

    match explicit_config(&matches, controller.store()).await? {
        Some(config) => controller.apply_config(config)?,
        None => {
            let startup = controller.init().with_context(|| {
                format!(
                    "Could not load '{}'. Run with --setup to replace it",
                    controller.store().path().display()
                )
            })?;
            if startup == Startup::NeedsSetup {
                controller.apply_config(first_run_config().await?)?;
            }
        }
    }

    let result = command_loop(&mut controller).await;
    controller.shutdown();
    result
}

/// Config requested on the command line, if any. `--setup` wins over flags.
async fn explicit_config(matches: &ArgMatches, store: &ConfigStore) -> Result<Option<AppConfig>> {
    let language = matches
        .get_one::<String>("language")
        .map(|code| code.parse::<Language>())
        .transpose()?;
    let stations: Option<Vec<&String>> = matches
        .get_many::<String>("station")
        .map(|values| values.collect());

    if matches.get_flag("setup") {
        // A corrupt file is exactly what --setup is for, so start from defaults
        let stored = store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable config");
            None
        });
        return Ok(Some(prompt(stored).await?));
    }

    if stations.is_none() && language.is_none() {
        return Ok(None);
    }

    let stored = store.load()?.unwrap_or_default();
    let language = language.unwrap_or(stored.language);
    let config = match stations {
        Some(stations) => AppConfig::new(stations, language)?,
        None => AppConfig { language, ..stored },
    };
    Ok(Some(config))
}

/// Interactive form when attached to a terminal; otherwise the built-in defaults.
async fn first_run_config() -> Result<AppConfig> {
    if std::io::stdin().is_terminal() {
        prompt(None).await
    } else {
        tracing::info!("no config found and stdin is not a terminal, using default stations");
        Ok(AppConfig::default())
    }
}

async fn run_once(matches: &ArgMatches, controller: &Controller) -> Result<()> {
    let config = match explicit_config(matches, controller.store()).await? {
        Some(config) => {
            controller.store().save(&config)?;
            config
        }
        None => match controller.store().load()? {
            Some(config) => config,
            None => first_run_config().await?,
        },
    };

    if let Err(e) = controller.scheduler().run_once(&config).await {
        bail!("Refresh failed: {}", e);
    }
    Ok(())
}

/// Waits for Ctrl+C, `q` to quit or `s` to edit settings.
async fn command_loop(controller: &mut Controller) -> Result<()> {
    let mut interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                tracing::info!("shutting down");
                return Ok(());
            }
            line = lines.next_line(), if interactive => {
                match line.context("Failed to read stdin")?.as_deref().map(str::trim) {
                    Some("q") | Some("Q") => return Ok(()),
                    Some("s") | Some("S") => edit_settings(controller).await?,
                    Some(_) => {}
                    None => interactive = false,
                }
            }
        }
    }
}

async fn edit_settings(controller: &mut Controller) -> Result<()> {
    // No redraws underneath the form
    controller.shutdown();

    match prompt(controller.current().cloned()).await {
        Ok(config) => controller.apply_config(config)?,
        Err(e) => {
            tracing::warn!(error = %e, "settings not changed");
            controller.resume();
        }
    }
    Ok(())
}

/// Runs the blocking settings form off the async worker threads.
async fn prompt(current: Option<AppConfig>) -> Result<AppConfig> {
    tokio::task::spawn_blocking(move || prompt_settings(current.as_ref()))
        .await
        .context("Settings prompt task failed")?
}
