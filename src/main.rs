//! PlateChecker - camera-based license plate validation
//!
//! Samples a video feed, reads the plate window of each throttled frame and
//! lights a pass/fail indicator when the plate is on the allow-list.

mod analysis;
mod app;
mod capture;
mod config;
mod geometry;
mod shared;
mod storage;
mod vision;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::{pump_frames, DeviceOrientation, ImageSequenceSource, VideoOrientation};
use crate::config::AppConfig;
use crate::geometry::{AspectFill, Size, SourcePx, ViewportPx};
use crate::vision::{EnhancementPipeline, TranscriptOcr};

/// PlateChecker - license plate allow-list checker
#[derive(Parser, Debug)]
#[command(name = "plate-checker")]
#[command(about = "Reads license plates from a camera feed and checks them against an allow-list")]
struct Args {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// How the device is held; overrides the configured video orientation
    #[arg(long, global = true, value_enum)]
    device_orientation: Option<DeviceOrientation>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a directory of frames through the recognition pipeline
    Run {
        /// Directory of frame images, processed in name order
        #[arg(long)]
        frames: PathBuf,
        /// JSON transcript of OCR observations per frame
        #[arg(long)]
        transcript: PathBuf,
        /// Nominal capture frame rate
        #[arg(long, default_value = "30")]
        fps: u32,
        /// Viewport size for overlay placement, e.g. 390x844
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Option<(u32, u32)>,
        /// Save enhanced plate windows into this directory
        #[arg(long)]
        preview_dir: Option<PathBuf>,
    },
    /// Print reading window geometry for a frame size
    Roi {
        /// Frame size, e.g. 1920x1080
        #[arg(long, value_parser = parse_dimensions)]
        frame: (u32, u32),
        /// Viewport size, e.g. 390x844
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Option<(u32, u32)>,
    },
    /// Write the enhanced plate window of a single image
    Enhance {
        input: PathBuf,
        output: PathBuf,
    },
    /// Write a default configuration file
    InitConfig {
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = || session_config(args.config.as_deref(), args.device_orientation);
    match args.command {
        Command::Run {
            frames,
            transcript,
            fps,
            viewport,
            preview_dir,
        } => {
            let config = session()?;
            let watch = args
                .config
                .clone()
                .or_else(|| storage::default_config_path().ok())
                .map(ConfigWatch::new);
            run(config, watch, &frames, &transcript, fps, viewport, preview_dir)
        }
        Command::Roi { frame, viewport } => print_roi(&session()?, frame, viewport),
        Command::Enhance { input, output } => enhance_file(&session()?, &input, &output),
        Command::InitConfig { path } => init_config(path),
    }
}

/// Configuration for a capture session, with the device orientation applied
fn session_config(path: Option<&Path>, device: Option<DeviceOrientation>) -> Result<AppConfig> {
    let mut config = load_or_create_config(path)?;
    if let Some(device) = device {
        config.capture.orientation = VideoOrientation::from(device);
        info!("Device held {:?}, frames delivered {:?}", device, config.capture.orientation);
    }
    Ok(config)
}

/// Parse `WIDTHxHEIGHT`
fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension '{}': {}", v, e))
    };
    let (w, h) = (parse(w)?, parse(h)?);
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be positive, got {}x{}", w, h));
    }
    Ok((w, h))
}

/// Load configuration from an explicit path, or from the per-user location,
/// creating it with defaults on first use
fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    let config_path = match storage::default_config_path() {
        Ok(path) => path,
        Err(e) => {
            warn!("No config directory ({}), using default configuration", e);
            return Ok(AppConfig::default());
        }
    };

    if config_path.exists() {
        match config::load_config(&config_path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                return Ok(config);
            }
            Err(e) => warn!("Ignoring unreadable configuration: {:#}", e),
        }
    } else {
        let config = AppConfig::default();
        match config::save_config(&config, &config_path) {
            Ok(()) => info!("Created default configuration at {:?}", config_path),
            Err(e) => warn!("Could not write default configuration: {:#}", e),
        }
        return Ok(config);
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Picks up edits to the configuration file while a session runs
struct ConfigWatch {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl ConfigWatch {
    fn new(path: PathBuf) -> Self {
        let modified = modified_at(&path);
        Self { path, modified }
    }

    /// Reloaded configuration when the file changed since the last poll
    fn poll(&mut self) -> Option<AppConfig> {
        let modified = modified_at(&self.path);
        if modified.is_none() || modified == self.modified {
            return None;
        }
        self.modified = modified;

        match config::load_config(&self.path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Keeping current configuration: {:#}", e);
                None
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => storage::default_config_path()?,
    };
    config::save_config(&AppConfig::default(), &path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Replay frames through the pipeline. The capture side runs on its own
/// thread; this thread plays the display context.
fn run(
    mut config: AppConfig,
    mut watch: Option<ConfigWatch>,
    frames: &Path,
    transcript: &Path,
    fps: u32,
    viewport: Option<(u32, u32)>,
    preview_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(dir) = &preview_dir {
        std::fs::create_dir_all(dir)?;
        config.enhancement.preview = true;
    }

    let ocr = Arc::new(TranscriptOcr::load(transcript)?);
    let mut source = ImageSequenceSource::open(frames, fps, config.capture.orientation)?;
    if source.is_empty() {
        return Err(anyhow!("No frame images found in {}", frames.display()));
    }

    let (mut recognizer, mut display) = app::build(&config, ocr)?;
    let preview = preview_dir
        .as_ref()
        .map(|_| recognizer.enhancer_mut().preview_channel());

    let screen = match (viewport, source.frame_size()?) {
        (Some((w, h)), Some(frame)) => Some((Size::<ViewportPx>::from_pixels(w, h), frame)),
        _ => None,
    };
    if let Some((viewport, frame)) = screen {
        display.layout(viewport, frame)?;
        print_layout(&display.state());
    }

    info!("Starting capture replay of {} frames", source.len());
    let capture = std::thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || {
            let result = pump_frames(&mut source, &mut recognizer);
            (result, recognizer.stats())
        })?;

    let mut previews_saved = 0u32;
    loop {
        let changed = match display.wait_and_apply(Duration::from_millis(250)) {
            Ok(changed) => changed,
            Err(_) => break,
        };
        if changed {
            let state = display.state();
            println!(
                "frame {:>5}  {:<12} {:<14} fade={:.1}",
                state.last_sequence.unwrap_or_default(),
                state.text,
                if state.authorized { "AUTHORIZED" } else { "NOT AUTHORIZED" },
                state.fade
            );
        }
        if let Some(updated) = watch.as_mut().and_then(ConfigWatch::poll) {
            display.shared().publish_config(&updated);
            let authorized_plates = display.shared().allow_list.load().len();
            info!(
                "Reloaded configuration: {} authorized plates",
                authorized_plates
            );
            if let Some((viewport, frame)) = screen {
                display.layout(viewport, frame)?;
                print_layout(&display.state());
            }
        }
        if let (Some(rx), Some(dir)) = (&preview, &preview_dir) {
            while let Ok(image) = rx.try_recv() {
                let path = dir.join(format!("preview_{:05}.png", previews_saved));
                if let Err(e) = image.save(&path) {
                    warn!("Failed to save preview {:?}: {}", path, e);
                }
                previews_saved += 1;
            }
        }
    }

    let (result, stats) = capture
        .join()
        .map_err(|_| anyhow!("Capture thread panicked"))?;
    result?;

    println!(
        "{} frames, {} throttled, {} recognized, {} without text, {} failed",
        stats.frames_seen,
        stats.frames_throttled,
        stats.frames_recognized,
        stats.empty_frames,
        stats.recognition_failures
    );
    Ok(())
}

fn print_layout(state: &shared::DisplayState) {
    if let (Some(overlay), Some(crop)) = (state.overlay, state.crop_in_viewport) {
        println!("overlay window : {}", fmt_rect(overlay.x, overlay.y, overlay.width, overlay.height));
        println!("crop on screen : {}", fmt_rect(crop.x, crop.y, crop.width, crop.height));
    }
}

fn print_roi(config: &AppConfig, frame: (u32, u32), viewport: Option<(u32, u32)>) -> Result<()> {
    let calc = config.region.calculator();
    let frame_size = Size::<SourcePx>::from_pixels(frame.0, frame.1);

    let crop = calc.plate_window(frame_size)?;
    let normalized = crop.to_normalized(frame_size)?;
    println!("aspect ratio   : {:.3}", calc.ratio().value());
    println!("ocr crop       : {}", fmt_rect(crop.x, crop.y, crop.width, crop.height));
    println!(
        "normalized     : {}",
        fmt_rect(normalized.x, normalized.y, normalized.width, normalized.height)
    );

    if let Some((w, h)) = viewport {
        let viewport = Size::<ViewportPx>::from_pixels(w, h);
        let overlay = calc.overlay_window(viewport)?;
        let fill = AspectFill::new(frame_size, viewport)?;
        let mapped = fill.map_rect(crop);
        let (ox, oy) = fill.offset();
        println!("fill scale     : {:.4} (offset {:.1}, {:.1})", fill.scale(), ox, oy);
        println!("overlay window : {}", fmt_rect(overlay.x, overlay.y, overlay.width, overlay.height));
        println!("crop on screen : {}", fmt_rect(mapped.x, mapped.y, mapped.width, mapped.height));
    }
    Ok(())
}

fn enhance_file(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let image = image::open(input)
        .with_context(|| format!("Failed to open {:?}", input))?
        .to_rgba8();
    let image = config.capture.orientation.apply(image);
    let (w, h) = image.dimensions();

    let roi = config
        .region
        .calculator()
        .plate_window(Size::from_pixels(w, h))?;
    let enhanced = EnhancementPipeline::new(config.enhancement.clone()).enhance(&image, roi);

    enhanced
        .image
        .save(output)
        .with_context(|| format!("Failed to write {:?}", output))?;
    println!(
        "Wrote {}x{} plate window to {}",
        enhanced.image.width(),
        enhanced.image.height(),
        output.display()
    );
    Ok(())
}

fn fmt_rect(x: f64, y: f64, w: f64, h: f64) -> String {
    format!("x={:.1} y={:.1} w={:.1} h={:.1}", x, y, w, h)
}
