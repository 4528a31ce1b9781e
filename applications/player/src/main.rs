/// ClassDJ Player - headless playlist player
use clap::{Parser, Subcommand};
use classdj_client::{CatalogKind, ClassDjClient};
use classdj_playback::{display_title, OwnerId};
use classdj_player::{
    console::{self, ConsoleCommand},
    ClockOutput, PlayerConfig, PlayerError,
};
use classdj_sync::{ArrivalMode, SessionError, SessionManager};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "classdj-player")]
#[command(about = "ClassDJ headless playlist player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server URL, overriding the configuration
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is reachable
    Info,
    /// Show every class with its students, artists and songs
    Tree,
    /// List the shared song library
    Songs,
    /// Ask the server to fetch top songs for every artist
    FetchTop,
    /// Delete every downloaded song on the server
    ClearDownloads,
    /// Delete a class, student, artist or song and everything beneath it
    Delete {
        /// Item kind: class, student, artist or song
        kind: CatalogKind,
        /// Item id
        id: i64,
    },
    /// Delete every class, student, artist and song
    DeleteAll,
    /// Play a live playlist
    Play {
        /// Student whose songs to play (required for poll and push)
        #[arg(short, long)]
        owner: Option<i64>,
        /// Where tracks come from: listing, poll or push
        #[arg(short, long)]
        mode: Option<ArrivalMode>,
        /// Clear the server's downloads before starting
        #[arg(long)]
        fresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the player's own output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "classdj_player=info,classdj_sync=info,classdj_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = PlayerConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        config.server.url = url;
    }
    config.validate()?;

    let client = ClassDjClient::new(config.server_config())?;

    match cli.command {
        Commands::Info => {
            let info = client.test_connection().await?;
            println!("{} ({})", info.message, client.url());
        }
        Commands::Tree => {
            let classes = client.catalog().classes_full().await?;
            if classes.is_empty() {
                println!("No classes");
            } else {
                println!("{}", console::class_tree(&classes));
            }
        }
        Commands::Songs => {
            let songs = client.songs().list_songs().await?;
            for url in &songs {
                println!("{}", display_title(url));
            }
            tracing::info!(count = songs.len(), "Songs listed");
        }
        Commands::FetchTop => {
            let message = client.catalog().fetch_top_songs().await?;
            println!("{}", message);
        }
        Commands::ClearDownloads => {
            let message = client.catalog().clear_downloads().await?;
            println!("{}", message);
        }
        Commands::Delete { kind, id } => {
            let message = client.catalog().delete(kind, id).await?;
            println!("{}", message);
        }
        Commands::DeleteAll => {
            let message = client.catalog().delete_all().await?;
            println!("{}", message);
        }
        Commands::Play { owner, mode, fresh } => {
            play(&config, client, owner.map(OwnerId::new), mode, fresh).await?;
        }
    }

    Ok(())
}

async fn play(
    config: &PlayerConfig,
    client: ClassDjClient,
    owner: Option<OwnerId>,
    mode: Option<ArrivalMode>,
    fresh: bool,
) -> Result<(), PlayerError> {
    if fresh {
        let message = client.catalog().clear_downloads().await?;
        tracing::info!(message = %message, "Cleared downloads before starting");
    }

    let mut session_config = config.session_config();
    if let Some(mode) = mode {
        session_config.mode = mode;
    }

    let (output, clock) = ClockOutput::new(config.track_length());
    let mut manager = SessionManager::new(Arc::new(client), session_config);
    let session = manager.mount(owner, output).await?;

    tracing::info!(
        session = %session.id(),
        owner = ?owner,
        mode = %session_config.mode,
        "Player started"
    );

    let control = session.control();
    let snapshots = session.watch();
    let mut events = session.subscribe();

    let clock_task = tokio::spawn(clock.drive(control.clone(), config.tick()));

    let status = snapshots.clone();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let snapshot = status.borrow().clone();
                    if let Some(line) = console::event_line(&event, &snapshot) {
                        println!("{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Status output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        let result = match command {
            ConsoleCommand::TogglePlayPause => control.toggle_play_pause().await,
            ConsoleCommand::Next => control.next().await,
            ConsoleCommand::Previous => control.previous().await,
            ConsoleCommand::Seek(fraction) => control.seek(fraction).await,
            ConsoleCommand::List => {
                println!("{}", console::playlist_listing(&snapshots.borrow()));
                Ok(())
            }
            ConsoleCommand::Help => {
                println!("{}", console::HELP);
                Ok(())
            }
            ConsoleCommand::Quit => break,
        };

        match result {
            Ok(()) => {}
            Err(SessionError::Closed) => {
                eprintln!("Session ended");
                break;
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    clock_task.abort();
    printer.abort();
    manager.unmount().await;

    tracing::info!("Player stopped");
    Ok(())
}
