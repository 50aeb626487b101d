use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use carousel::constants::*;
use carousel::image_loader::resolve_sources;
use carousel::{
    DisplaySink, FileTransport, FrameWriter, HttpTransport, ImageSequenceController, LoadedImage,
    SchemeTransport,
};

/// Loads a list of images concurrently and steps through them in order.
#[derive(Debug, Parser)]
#[command(name = "carousel", version, about)]
struct Args {
    /// Image urls (http, https, file), image files or directories of images
    #[arg(required = true)]
    sources: Vec<String>,

    /// Time between two advances (ms)
    #[arg(long, default_value_t = ADVANCE_INTERVAL_MS, value_parser = clap::value_parser!(u64).range(1..))]
    advance_ms: u64,

    /// Number of advances before exiting
    #[arg(long, default_value_t = ADVANCE_COUNT)]
    advances: usize,

    /// Simulated tutorial length; no image is surfaced before it has elapsed (ms)
    #[arg(long, default_value_t = TUTORIAL_DURATION_MS)]
    tutorial_ms: u64,

    /// Timeout of a single HTTP request (seconds)
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Upper bound of the random delay applied to local files (ms)
    #[arg(long, default_value_t = MAX_SIMULATED_LATENCY_MS)]
    max_latency_ms: u64,

    /// Write every displayed image to this directory as numbered PNG frames
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

/// Logs every displayed image and optionally saves it as a frame.
struct Screen {
    frames: Option<FrameWriter>,
}

impl DisplaySink for Screen {
    fn show(&mut self, image: Arc<LoadedImage>) {
        let (width, height) = image.dimensions();
        tracing::info!(source = %image.source(), width, height, "now showing");
        if let Some(frames) = self.frames.as_mut() {
            frames.show(image);
        }
    }
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let args = Args::parse();

    // --- Resolve Sources ---
    let urls = resolve_sources(&args.sources).context("failed to resolve image sources")?;
    tracing::info!(images = urls.len(), "loading carousel");

    let frames = match &args.save_dir {
        Some(dir) => Some(
            FrameWriter::new(dir)
                .with_context(|| format!("failed to create frame directory {}", dir.display()))?,
        ),
        None => None,
    };

    let transport = SchemeTransport::new(
        HttpTransport::new(Duration::from_secs(args.timeout_secs))
            .context("failed to build http client")?,
        FileTransport::new(Duration::from_millis(args.max_latency_ms)),
    );

    // The gate opens once the simulated tutorial is over
    let started = Instant::now();
    let tutorial = Duration::from_millis(args.tutorial_ms);
    let gate = move || started.elapsed() >= tutorial;

    let mut carousel = ImageSequenceController::new(Arc::new(transport), gate, Screen { frames });
    carousel.load_identifiers(urls);

    // --- Main Loop ---
    carousel.run(Duration::from_millis(args.advance_ms), args.advances);

    if !carousel.is_settled() {
        tracing::info!("cancelling unfinished fetches");
    }
    carousel.close();
    Ok(())
}
