//! Subcommands and their results.

use std::fmt;

use clap::Subcommand;
use serde::Serialize;
use trail_core::{
  history::{HistoryEntry, Place, Visit},
  store::VisitStore,
};

use crate::settings::Settings;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Record a visit to KEY (a URI or phone number) now.
  Record { key: String },
  /// Set the display title of KEY.
  Title { key: String, title: String },
  /// Show the most recent visits, newest first.
  Recent {
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Show the most visited places.
  Top {
    #[arg(short, long)]
    limit:  Option<usize>,
    /// Case-insensitive substring to match against key or title.
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Show a single place.
  Place { key: String },
  /// Remove a place. Its visits stay in the history under the bare key.
  Forget { key: String },
  /// Delete all visits and places.
  Clear {
    /// Keep this place (title kept, visit count reset). Repeatable.
    #[arg(long = "keep", value_name = "KEY")]
    keep: Vec<String>,
  },
  /// Print the number of stored visits.
  Stats,
}

/// What a command produced, ready to be printed as text or JSON.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
  Visit(Visit),
  Place(Option<Place>),
  Places(Vec<Place>),
  History(Vec<HistoryEntry>),
  Removed { removed: bool },
  Cleared { visits_removed: u64 },
  Stats { store: String, visits: u64 },
}

pub async fn run<S: VisitStore>(
  store: &S,
  command: Command,
  settings: &Settings,
) -> Result<Report, S::Error> {
  tracing::debug!(?command, "running command");

  let report = match command {
    Command::Record { key } => Report::Visit(store.record_visit(&key).await?),
    Command::Title { key, title } => {
      Report::Place(Some(store.set_title(&key, &title).await?))
    }
    Command::Recent { limit } => {
      let limit = limit.unwrap_or(settings.recent_limit);
      Report::History(store.recent_history(limit).await?)
    }
    Command::Top { limit, filter } => {
      let limit = limit.unwrap_or(settings.top_limit);
      Report::Places(store.top_places(limit, filter.as_deref()).await?)
    }
    Command::Place { key } => Report::Place(store.get_place(&key).await?),
    Command::Forget { key } => Report::Removed {
      removed: store.remove_place(&key).await?,
    },
    Command::Clear { keep } => {
      let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
      Report::Cleared {
        visits_removed: store.clear_history_excluding(&keep).await?,
      }
    }
    Command::Stats => Report::Stats {
      store:  settings.name.clone(),
      visits: store.visit_count().await?,
    },
  };

  Ok(report)
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn write_place(f: &mut fmt::Formatter<'_>, place: &Place) -> fmt::Result {
  if place.title == place.key {
    writeln!(f, "{:>5}  {}", place.visit_count, place.key)
  } else {
    writeln!(f, "{:>5}  {}  ({})", place.visit_count, place.title, place.key)
  }
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Report::Visit(v) => writeln!(
        f,
        "recorded visit #{} to {} at {}",
        v.visit_id,
        v.place_key,
        v.visited_at.format(TIME_FORMAT)
      ),
      Report::Place(None) => writeln!(f, "no such place"),
      Report::Place(Some(p)) => write_place(f, p),
      Report::Places(places) => places.iter().try_for_each(|p| write_place(f, p)),
      Report::History(entries) => entries.iter().try_for_each(|e| {
        let at = e.visited_at.format(TIME_FORMAT);
        if e.title == e.key {
          writeln!(f, "{at}  {}", e.key)
        } else {
          writeln!(f, "{at}  {}  ({})", e.title, e.key)
        }
      }),
      Report::Removed { removed: true } => writeln!(f, "place removed"),
      Report::Removed { removed: false } => writeln!(f, "no such place"),
      Report::Cleared { visits_removed } => {
        writeln!(f, "cleared {visits_removed} visits")
      }
      Report::Stats { store, visits } => writeln!(f, "{store}: {visits} visits"),
    }
  }
}
