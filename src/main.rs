//! ScaleReader - Reads digital scale displays from camera frames
//!
//! Finds the weight shown on a seven-segment style display by running OCR
//! on the part of each frame the user aligned with the display.

mod app;
mod capture;
mod config;
mod display;
mod overlay;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::ScannerApp;
use crate::capture::ImageDirSource;
use crate::config::AppConfig;
use crate::overlay::ScanOverlay;
use crate::shared::ScanRegionSlot;
use crate::vision::{
    ExtractionPolicy, FrameGeometry, NumericExtractor, OcrBackend, Rotation,
};

/// ScaleReader - reads the weight on a digital scale display
#[derive(Parser, Debug)]
#[command(name = "scale-reader")]
#[command(about = "Extracts weight readings from OCR of a scale's digital display")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a reading from recognized text (file, or stdin when omitted)
    Extract {
        input: Option<PathBuf>,

        /// Validation policy (overrides config)
        #[arg(long, value_enum)]
        policy: Option<ExtractionPolicy>,
    },

    /// Print where the scan box lands in sensor coordinates
    MapRegion {
        /// Sensor rotation in degrees
        #[arg(short, long, value_parser = parse_rotation, default_value = "0")]
        rotation: Rotation,

        /// Analysis frame size as WIDTHxHEIGHT (defaults to the view size)
        #[arg(long, value_parser = parse_size)]
        frame: Option<(u32, u32)>,

        /// Sensor buffer size as WIDTHxHEIGHT (defaults to the frame size)
        #[arg(long, value_parser = parse_size)]
        sensor: Option<(u32, u32)>,
    },

    /// Scan a directory of frames and report the weight
    Scan {
        /// Directory of frame images (overrides config)
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Sensor rotation in degrees (overrides config)
        #[arg(short, long, value_parser = parse_rotation)]
        rotation: Option<Rotation>,

        /// OCR backend (overrides config)
        #[arg(long, value_enum)]
        backend: Option<OcrBackend>,

        /// Recorded OCR output for the replay backend (overrides config)
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_or_default_config(args.config.as_deref())?;

    match args.command {
        Command::Extract { input, policy } => {
            let text = read_input(input.as_deref())?;
            let extractor = NumericExtractor::new(policy.unwrap_or(config.scanner.extraction));
            println!("{}", extractor.extract(&text));
        }
        Command::MapRegion {
            rotation,
            frame,
            sensor,
        } => map_region(&config, rotation, frame, sensor)?,
        Command::Scan {
            frames,
            rotation,
            backend,
            replay,
        } => {
            let mut config = config;
            if let Some(frames) = frames {
                config.capture.frames_dir = Some(frames);
            }
            if let Some(rotation) = rotation {
                config.capture.rotation = rotation;
            }
            if let Some(backend) = backend {
                config.ocr.backend = backend;
            }
            if let Some(replay) = replay {
                config.ocr.replay_path = Some(replay);
            }
            scan(config)?;
        }
        Command::InitConfig { force } => {
            let path = match args.config {
                Some(path) => path,
                None => storage::default_config_path()?,
            };
            init_config(&path, force)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Load configuration from the given file, the default location, or defaults
fn load_or_default_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_path) = storage::default_config_path() {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring unreadable configuration: {:#}", e),
            }
        }
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;
    }
    config::save_config(&AppConfig::default(), path)?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn map_region(
    config: &AppConfig,
    rotation: Rotation,
    frame: Option<(u32, u32)>,
    sensor: Option<(u32, u32)>,
) -> Result<()> {
    let (view_width, view_height) = config.overlay.view_size;
    let overlay = ScanOverlay::new(config.overlay.clone(), ScanRegionSlot::new());
    let region = overlay
        .layout(view_width, view_height)
        .ok_or_else(|| anyhow::anyhow!("View {}x{} is too small for a scan box", view_width, view_height))?;

    let frame = frame.unwrap_or((view_width as u32, view_height as u32));
    let geometry = FrameGeometry::new(frame, sensor.unwrap_or(frame));
    let rect = vision::region::map_to_sensor(&region, &geometry, rotation);

    println!(
        "view   {:.1},{:.1} {:.1}x{:.1}",
        region.left, region.top, region.width, region.height
    );
    println!(
        "sensor {},{} {}x{} ({})",
        rect.left,
        rect.top,
        rect.width(),
        rect.height(),
        rotation
    );
    Ok(())
}

fn scan(config: AppConfig) -> Result<()> {
    let frames_dir = config
        .capture
        .frames_dir
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No frame directory given (use --frames or capture.frames_dir)"))?;

    let recognizer = vision::create_recognizer(&config.ocr)?;
    let mut source = ImageDirSource::new(frames_dir);
    let app = ScannerApp::new(config);

    let summary = app.run(&mut source, recognizer, |display| {
        println!("{}", display.status_line());
    })?;

    if summary.display.weight().is_empty() {
        println!("{}", summary.display.status_line());
    }
    let stats = summary.stats;
    println!(
        "{} frames: {} readings, {} skipped, {} failed",
        stats.frames, stats.readings, stats.skipped, stats.failed
    );
    Ok(())
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    let degrees: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of degrees", value))?;
    Rotation::try_from(degrees).map_err(|e| e.to_string())
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("'{}' is not WIDTHxHEIGHT", value))?;
    let width = width.trim().parse().map_err(|_| format!("bad width in '{}'", value))?;
    let height = height.trim().parse().map_err(|_| format!("bad height in '{}'", value))?;
    Ok((width, height))
}
