//! motionctl - hand-gesture media control
//!
//! Reads hand landmark frames from a pose source, debounces the gestures
//! they form, and turns them into playback and volume key presses.

mod backend;
mod config;
pub mod gesture;
pub mod ipc;
mod sink;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use config::MotionConfig;
use sink::SinkType;
use state::MotionState;

#[derive(Parser, Debug)]
#[command(name = "motionctl", about = "Hand-gesture playback and volume control")]
struct Cli {
    /// Read pose frames from a file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Configuration file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Action sink: log or command
    #[arg(long, default_value = "log")]
    sink: String,

    /// Key injection program used by the command sink
    #[arg(long, default_value = "xdotool")]
    key_program: String,

    /// Arguments placed before the keysym (repeatable)
    #[arg(long = "key-arg", default_values_t = vec!["key".to_string()])]
    key_args: Vec<String>,

    /// Flip landmark x coordinates (x' = 1 - x)
    #[arg(long)]
    mirror: bool,

    /// Stamp frames on arrival instead of using their timestamps
    #[arg(long)]
    realtime: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("motionctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motionctl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => MotionConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MotionConfig::default(),
    };
    if cli.mirror {
        config.mirror = true;
    }

    if cli.print_config {
        println!("{}", config.config_sexp());
        return Ok(());
    }

    let sink_type = match SinkType::parse(&cli.sink) {
        Some(t) => t,
        None => {
            eprintln!("Unknown sink: {}. Use: log or command", cli.sink);
            std::process::exit(1);
        }
    };

    info!("motionctl v{} starting", env!("CARGO_PKG_VERSION"));
    info!("config: {}", config.config_sexp());

    let mut sink = sink::build(sink_type, cli.key_program, cli.key_args);
    info!("sink: {}", sink.name());

    let mut state = MotionState::new(config);
    backend::run(&mut state, sink.as_mut(), cli.input.as_deref(), cli.realtime)
}
