//! # Delve Main Entry Point
//!
//! Parses the command line, sets up logging, builds the game and hands it to
//! the scene manager.

use clap::Parser;
use delve::scenes::SceneManager;
use delve::{DelveResult, GameConfig, GameState, InputHandler};
use macroquad::prelude::*;
use std::path::PathBuf;

/// Command line arguments for Delve.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "A turn-based ASCII roguelike")]
#[command(version)]
struct Args {
    /// Random seed for monster behavior (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file with game settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Delve".to_owned(),
        window_width: 1360,
        window_height: 860,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_timestamp(None)
            .init();
    }
}

async fn run(args: &Args) -> DelveResult<()> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    log::info!("Starting Delve v{} with seed {}", delve::VERSION, config.seed);

    let game_state = GameState::demo(config)?;
    let mut scenes = SceneManager::new(game_state, InputHandler::new());
    scenes.run().await?;

    log::info!("Game loop ended");
    Ok(())
}
