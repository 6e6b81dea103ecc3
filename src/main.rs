// Screengrab demo: capture every display and save PNG files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use screengrab::{capture, logging, settings_io, BackendKind, PixelBuffer, ScreenCapturer};

#[derive(Parser)]
#[command(name = "screengrab", version, about = "Capture displays to PNG files")]
struct Cli {
    /// Capture backend (gdi, wgc or auto). Overrides settings.json
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Output directory
    #[arg(short, long, default_value = "screenshots")]
    out: PathBuf,

    /// Capture only this display
    #[arg(short, long)]
    display: Option<i64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to the platform log directory
    #[arg(long)]
    log_to_file: bool,
}

fn save_png(image: PixelBuffer, path: &Path) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    let buffer = image::RgbaImage::from_raw(width, height, image.into_vec())
        .context("Pixel buffer does not match its dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!(file = ?path, width, height, "Saved capture");
    println!("{} ({}x{})", path.display(), width, height);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = settings_io::load_default_settings().unwrap_or_else(|e| {
        eprintln!("Ignoring settings file: {:#}", e);
        Default::default()
    });
    settings_io::apply_env_overrides(&mut settings);
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }
    settings.log_to_file |= cli.log_to_file;

    if let Err(e) = logging::init_from_settings(&settings) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        backend = %settings.backend,
        "Screengrab started"
    );
    tracing::debug!(?settings, "Active settings");

    let mut capturer = capture::open(&settings).context("Failed to open capture backend")?;

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("Failed to create output directory {:?}", cli.out))?;

    let displays = match cli.display {
        Some(index) => vec![(index, capturer.display_bounds(index)?)],
        None => capturer
            .all_display_bounds()?
            .into_iter()
            .enumerate()
            .map(|(i, bounds)| (i as i64, bounds))
            .collect(),
    };

    for (index, bounds) in &displays {
        let image = capturer
            .capture_rect(bounds)
            .with_context(|| format!("Failed to capture display {} at {}", index, bounds))?;
        let name = format!("{}_{}x{}.png", index, bounds.width(), bounds.height());
        save_png(image, &cli.out.join(name))?;
    }

    if cli.display.is_none() {
        let image = capturer
            .capture_all()
            .context("Failed to capture all displays")?;
        save_png(image, &cli.out.join("all.png"))?;
    }

    capturer.close();
    Ok(())
}
