//! streamcal - read the broadcast calendar from a terminal.
//!
//! Prints the weekly or daily schedule, D-Day markers, notices and the
//! merged media feeds for every active member.

mod render;

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streamcal_core::cache::SystemClock;
use streamcal_core::config::Config;
use streamcal_core::fetch::DataService;
use streamcal_core::models::{active_members, Member};
use streamcal_core::view::{CalendarView, ViewMode};

/// Default number of items per channel for media feeds
const DEFAULT_FEED_SIZE: usize = 20;

const USAGE: &str = "usage: streamcal <command>

commands:
  week [YYYY-MM-DD]   weekly schedule (Monday start)
  day [YYYY-MM-DD]    daily schedule
  clips [N]           latest clips
  vods [N]            latest replays
  videos [N]          latest uploads
  notices             active notices
  ddays               D-Day countdowns";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    config.apply_env();
    config
}

fn parse_date(arg: Option<&String>) -> Result<Option<NaiveDate>> {
    arg.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
    })
    .transpose()
}

fn parse_size(arg: Option<&String>) -> Result<usize> {
    match arg {
        Some(s) => s.parse().with_context(|| format!("Invalid count '{}'", s)),
        None => Ok(DEFAULT_FEED_SIZE),
    }
}

async fn show_calendar(data: DataService, config: &Config, mode: ViewMode, date: Option<NaiveDate>) -> Result<()> {
    let mut view = CalendarView::new(data, mode, config.timezone());
    if let Some(date) = date {
        view = view.with_anchor(date);
    }
    view.load().await;
    print!("{}", render::calendar(view.snapshot()));
    Ok(())
}

async fn members(data: &DataService) -> Result<Vec<Member>> {
    let fetched = data.members(false).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    Ok(active_members(&fetched.data))
}

fn name_lookup(members: &[Member]) -> impl Fn(i64) -> Option<String> {
    let names: HashMap<i64, String> = members.iter().map(|m| (m.uid, m.name.clone())).collect();
    move |uid| names.get(&uid).cloned()
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Calendar(ViewMode, Option<NaiveDate>),
    Clips(usize),
    Vods(usize),
    Videos(usize),
    Notices,
    DDays,
}

/// Parse arguments without touching config or the network.
fn parse_command(args: &[String]) -> Result<Command> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };
    let arg = args.get(1);
    Ok(match command.as_str() {
        "week" => Command::Calendar(ViewMode::Weekly, parse_date(arg)?),
        "day" => Command::Calendar(ViewMode::Daily, parse_date(arg)?),
        "clips" => Command::Clips(parse_size(arg)?),
        "vods" => Command::Vods(parse_size(arg)?),
        "videos" => Command::Videos(parse_size(arg)?),
        "notices" => Command::Notices,
        "ddays" => Command::DDays,
        "help" | "--help" | "-h" => Command::Help,
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    })
}

async fn run(command: Command) -> Result<()> {
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = load_config();
    let data = DataService::from_config(&config, Arc::new(SystemClock))?;
    let tz = config.timezone();
    info!(command = ?command, "streamcal starting");

    match command {
        Command::Help => Ok(()),
        Command::Calendar(mode, date) => show_calendar(data, &config, mode, date).await,
        Command::Clips(size) => {
            let members = members(&data).await?;
            let feed = data.clips(&members, size).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::clips(&feed, &tz, &name_lookup(&members)));
            Ok(())
        }
        Command::Vods(size) => {
            let members = members(&data).await?;
            let feed = data.vods(&members, size).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::vods(&feed, &tz, &name_lookup(&members)));
            Ok(())
        }
        Command::Videos(size) => {
            let members = members(&data).await?;
            let feed = data
                .youtube_videos(&members, size)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::videos(&feed, &tz, &name_lookup(&members)));
            Ok(())
        }
        Command::Notices => {
            let notices = data.active_notices().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render::notices(&notices));
            Ok(())
        }
        Command::DDays => {
            let ddays = data.ddays(false).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let today = data.now().with_timezone(&tz).date_naive();
            print!("{}", render::ddays(&ddays.data, today));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    run(parse_command(&args)?).await
}
