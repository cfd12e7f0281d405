//! Headless runner.
//!
//! Loads a config and a world directory, then plays a number of
//! observe-all rounds and prints the resulting events.
//!
//! ```text
//! hamlet [config.toml]
//!
//! HAMLET_CONFIG      config path when no argument is given
//! HAMLET_WORLD_DIR   overrides general.world_dir
//! HAMLET_ROUNDS      number of rounds (default 3)
//! HAMLET_OUTPUT      "text" (default) or "json"
//! RUST_LOG           overrides general.log_level
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hamlet_core::{HamletConfig, SystemClock};
use hamlet_llm::{ChatClient, Generator, ScriptedGenerator};
use hamlet_sim::{ConsoleRenderer, EventSink, JsonLinesRenderer, Mode, World, WorldDefinition};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ROUNDS: usize = 3;

fn load_config() -> Result<HamletConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HAMLET_CONFIG").ok())
        .map(PathBuf::from);
    let config = match path {
        Some(path) => HamletConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HamletConfig::default(),
    };
    config.validate().context("validating config")?;
    Ok(config)
}

fn build_generator(config: &HamletConfig) -> Result<Arc<dyn Generator>> {
    if config.llm.provider == "scripted" {
        return Ok(Arc::new(ScriptedGenerator::echo()));
    }
    let client = ChatClient::from_config(&config.llm).context("building generation client")?;
    Ok(Arc::new(client))
}

fn main() -> Result<()> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let world_dir = std::env::var("HAMLET_WORLD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config.general.world_dir.clone());
    let definition = WorldDefinition::from_dir(&world_dir)
        .with_context(|| format!("loading world from {}", world_dir.display()))?;

    let rounds = match std::env::var("HAMLET_ROUNDS") {
        Ok(value) => value
            .parse::<usize>()
            .with_context(|| format!("HAMLET_ROUNDS must be a number, got {value:?}"))?,
        Err(_) => DEFAULT_ROUNDS,
    };
    let mut sink: Box<dyn EventSink> = match std::env::var("HAMLET_OUTPUT").as_deref() {
        Ok("json") => Box::new(JsonLinesRenderer::new(io::stdout().lock())),
        _ => Box::new(ConsoleRenderer::new(io::stdout().lock())),
    };

    let snapshot_dir = config.snapshots.dir.clone();
    let generator = build_generator(&config)?;
    let mut world = World::new(config, definition, generator, Box::new(SystemClock))
        .context("building world")?;

    if let Some(dir) = &snapshot_dir {
        world
            .import_snapshots(dir)
            .with_context(|| format!("loading snapshots from {}", dir.display()))?;
    }

    info!(rounds, "Starting simulation");
    for round in 1..=rounds {
        world.status(Mode::Observation);
        world.observe_all();
        let pruned = world.housekeeping();
        info!(round, pruned, "Round finished");
        sink.render_all(&world.drain_events())
            .context("writing events")?;
    }

    if let Some(dir) = &snapshot_dir {
        world
            .export_snapshots(dir)
            .with_context(|| format!("writing snapshots to {}", dir.display()))?;
    }
    Ok(())
}
