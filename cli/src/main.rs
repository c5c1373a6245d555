//! Moss CLI - a todo list kept in sync with a MossByte database.
//!
//! Every command refreshes the local list from the remote first, applies its
//! change, waits for the remote side to settle, and prints the resulting list.
//! A rejected remote update exits non-zero; the printed list still shows the
//! local edit.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use moss_config::MossConfig;
use moss_remote::{RemoteClient, RemoteSettings};
use moss_todo::TodoSession;
use moss_types::{ItemId, TodoItem};

#[derive(Parser)]
#[command(name = "moss")]
#[command(about = "Todo list synced with a MossByte database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file path (default: ~/.moss/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the list
    List,
    /// Add an item
    Add {
        /// Item text
        text: String,
    },
    /// Remove an item
    Remove {
        /// Item id
        guid: String,
    },
    /// Replace an item's text
    Edit {
        /// Item id
        guid: String,
        /// New text
        text: String,
    },
    /// Flip an item's done flag
    Toggle {
        /// Item id
        guid: String,
    },
    /// Move an item to its next state
    Cycle {
        /// Item id
        guid: String,
    },
}

/// Log to `moss.log`; stdout stays reserved for the printed list.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let mut skipped = Vec::new();

    let Some((path, file)) = log_paths()
        .into_iter()
        .find_map(|path| match open_log(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                skipped.push(format!("{}: {e}", path.display()));
                None
            }
        })
    else {
        tracing_subscriber::registry().with(filter).init();
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    tracing::info!(path = %path.display(), "Logging to file");
    for unusable in skipped {
        tracing::warn!(log = %unusable, "Skipped unusable log location");
    }
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `logs/moss.log` next to the config file, then under `./.moss`.
fn log_paths() -> Vec<PathBuf> {
    let home_logs = MossConfig::path()
        .and_then(|config| config.parent().map(|dir| dir.join("logs")));
    home_logs
        .into_iter()
        .chain(std::iter::once(PathBuf::from(".moss").join("logs")))
        .map(|dir| dir.join("moss.log"))
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<MossConfig> {
    let loaded = match path {
        Some(path) => MossConfig::load_from(path)?
            .with_context(|| format!("config file {} not found", path.display()))?,
        None => MossConfig::load()?.unwrap_or_default(),
    };
    Ok(loaded.with_env_overrides())
}

fn build_session(config: &MossConfig) -> Result<TodoSession> {
    let remote = config.remote()?;
    let retry = config.retry();

    let mut settings = RemoteSettings::new(remote.base_url()?);
    if let Some(label) = &remote.label {
        settings.label.clone_from(label);
    }
    settings.request_timeout = remote.request_timeout();
    if let Some(max_retries) = retry.max_retries {
        settings.retry.max_retries = max_retries;
    }
    if let Some(delay) = retry.initial_delay() {
        settings.retry.initial_delay = delay;
    }
    if let Some(delay) = retry.max_delay() {
        settings.retry.max_delay = delay;
    }

    let client = RemoteClient::new(settings)?;
    Ok(TodoSession::new(client, remote.key_pair()?))
}

async fn run(session: &TodoSession, command: Command) -> Result<()> {
    session
        .refresh()
        .await
        .context("failed to load the list from the remote")?;

    match command {
        Command::List => {}
        Command::Add { text } => {
            let (id, pushed) = session.add_item(text);
            let status = pushed.await.context("failed to sync the new item")?;
            tracing::info!(item = %id, status = %status, "Item added");
        }
        Command::Remove { guid } => {
            session
                .remove_item(&ItemId::new(guid))
                .await
                .context("failed to remove item")?;
        }
        Command::Edit { guid, text } => {
            session
                .update_item_value(&ItemId::new(guid), text)
                .await
                .context("failed to update item")?;
        }
        Command::Toggle { guid } => {
            session
                .toggle_done(&ItemId::new(guid))
                .await
                .context("failed to toggle item")?;
        }
        Command::Cycle { guid } => {
            session
                .cycle_state(&ItemId::new(guid))
                .await
                .context("failed to change item state")?;
        }
    }

    Ok(())
}

fn render_item(item: &TodoItem) -> String {
    let mark = if item.is_done { 'x' } else { ' ' };
    format!(
        "[{mark}] {}  {}  ({})",
        item.guid,
        item.value,
        item.state.label()
    )
}

fn print_list(items: &[TodoItem]) {
    if items.is_empty() {
        println!("(no items)");
        return;
    }
    for item in items {
        println!("{}", render_item(item));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;
    let session = build_session(&config)?;

    let result = run(&session, cli.command).await;
    print_list(&session.items());

    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }
    result
}
