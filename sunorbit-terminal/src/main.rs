/// Sunorbit Terminal Demo - Cubes lit by an orbiting sun
///
/// Controls:
///   - Left/Right: Orbit the camera
///   - L: Toggle the light
///   - M: Toggle the cube material
///   - Q/ESC: Quit
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use sunorbit_core::{SceneConfig, TextureImage};
use sunorbit_terminal::TerminalApp;

#[derive(Parser, Debug)]
#[command(name = "sunorbit-terminal", version, about = "Cubes lit by an orbiting sun, in the terminal")]
struct Args {
    /// TOML file overriding scene tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image mapped onto the sun sphere
    #[arg(long, default_value = "sun.jpg")]
    texture: PathBuf,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write log records here; otherwise logging is muted while the scene is on screen
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()).and_then(|()| run(args)) {
        eprintln!("sunorbit-terminal: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SceneConfig::default(),
    };

    let sun = match TextureImage::load(&args.texture) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("{}; the sun will be drawn untextured", e);
            None
        }
    };

    let size = terminal::size().context("failed to query terminal size")?;
    let mut app = TerminalApp::new(config, sun.as_ref(), size, args.fps).context("failed to initialize renderer")?;
    drop(sun);
    app.set_logs_to_file(args.log_file.is_some());

    app.run().context("terminal I/O error")?;
    log::info!("Rendered {} frames", app.frame_count());
    Ok(())
}
