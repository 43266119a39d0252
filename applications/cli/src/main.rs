/// Cadence - queue media player for the terminal
use anyhow::Context;
use cadence_artwork::ArtworkExtractor;
use cadence_audio_desktop::{DesktopEngine, DesktopPlayback};
use cadence_cli::{
    config::CliConfig,
    controls::{self, Control, Halt, QueueWatcher},
};
use cadence_playback::{MediaItem, Player, PlayerEvent, RepeatMode};
use clap::{Parser, Subcommand};
use crossbeam_channel::{never, select, unbounded, Receiver};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queue-based media player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play files in order
    Play {
        /// Files to queue
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Shuffle the queue
        #[arg(long)]
        shuffle: bool,
        /// Repeat mode (off, one, all)
        #[arg(long)]
        repeat: Option<RepeatMode>,
        /// Audio session category (e.g. playback, ambient)
        #[arg(long)]
        category: Option<String>,
    },
    /// Extract embedded cover art from a file
    Artwork {
        /// Audio file to read
        file: PathBuf,
        /// Output path (default: <file stem>-cover.<ext>)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

/// One step of the play loop
enum Step {
    Event(Option<PlayerEvent>),
    Key(Option<String>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Play {
            files,
            shuffle,
            repeat,
            category,
        } => play(&config, files, shuffle, repeat, category)?,
        Commands::Artwork { file, out } => artwork(&config, &file, out)?,
        Commands::Config => println!("{}", config.to_toml()?),
    }

    Ok(())
}

fn play(
    config: &CliConfig,
    files: Vec<PathBuf>,
    shuffle: bool,
    repeat: Option<RepeatMode>,
    category: Option<String>,
) -> anyhow::Result<()> {
    let mut player_config = config.player.clone();
    player_config.shuffle |= shuffle;
    if let Some(repeat) = repeat {
        player_config.repeat = repeat;
    }

    let engine = DesktopEngine::new().context("failed to open audio output")?;
    let mut player = Player::new(engine, player_config);
    if let Some(category) = category {
        player.set_audio_session_category(&category)?;
    }
    player.set_queue(files.into_iter().map(MediaItem::from_path).collect());

    tracing::info!(items = player.queue_len(), "starting playback");

    let playback = DesktopPlayback::start(player, config.tick_interval())?;
    let events = playback.subscribe();
    let mut keys = spawn_key_reader();

    println!("{}", controls::HELP);
    playback.with_player(|player| player.play());

    let mut watcher = QueueWatcher::new();
    loop {
        let step = select! {
            recv(events.receiver()) -> event => Step::Event(event.ok()),
            recv(keys) -> line => Step::Key(line.ok()),
        };

        match step {
            Step::Event(None) => break,
            Step::Event(Some(event)) => {
                if let Some(line) = controls::describe(&event) {
                    println!("{line}");
                }
                match watcher.observe(&event) {
                    Some(Halt::Finished) => {
                        tracing::info!("queue finished");
                        break;
                    }
                    Some(Halt::Failed) => {
                        if !playback.with_player(|player| controls::skip_failed(player)) {
                            tracing::warn!("no playable items left");
                            break;
                        }
                    }
                    None => {}
                }
            }
            Step::Key(Some(line)) => {
                let Some(control) = Control::parse(&line) else {
                    println!("{}", controls::HELP);
                    continue;
                };
                if !playback.with_player(|player| control.apply(player)) {
                    break;
                }
            }
            // stdin closed: keep playing until the queue ends
            Step::Key(None) => keys = never(),
        }
    }

    Ok(())
}

/// Forward stdin lines to a channel
fn spawn_key_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn artwork(config: &CliConfig, file: &Path, out: Option<PathBuf>) -> anyhow::Result<()> {
    let extractor = ArtworkExtractor::new(config.player.artwork_cache_size);
    let Some(artwork) = extractor
        .extract(file)
        .with_context(|| format!("failed to read {}", file.display()))?
    else {
        println!("No embedded artwork in {}", file.display());
        return Ok(());
    };

    let out = out.unwrap_or_else(|| {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artwork".to_string());
        PathBuf::from(format!("{stem}-cover.{}", artwork.extension()))
    });

    std::fs::write(&out, &artwork.data)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "Wrote {} ({} bytes, {})",
        out.display(),
        artwork.len(),
        artwork.mime_type
    );
    Ok(())
}
