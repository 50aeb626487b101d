use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::state::LoadedImage;

/// Receives the controller's "display this image now" decisions.
pub trait DisplaySink {
    fn show(&mut self, image: Arc<LoadedImage>);
}

/// Remembers the image currently on display.
#[derive(Debug, Default)]
pub struct LatestImage {
    current: Option<Arc<LoadedImage>>,
    shown: usize,
}

impl LatestImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<LoadedImage>> {
        self.current.as_ref()
    }

    /// How many times `show` was called, repeats of the same image included.
    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl DisplaySink for LatestImage {
    fn show(&mut self, image: Arc<LoadedImage>) {
        self.current = Some(image);
        self.shown += 1;
    }
}

/// Saves every displayed image as a numbered PNG frame.
pub struct FrameWriter {
    dir: PathBuf,
    frame: usize,
}

impl FrameWriter {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, frame: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> usize {
        self.frame
    }
}

impl DisplaySink for FrameWriter {
    fn show(&mut self, image: Arc<LoadedImage>) {
        let path = self.dir.join(format!("frame-{:04}.png", self.frame));
        // A frame that fails to save is reported and skipped, the carousel keeps going
        match image.image().save(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), source = %image.source(), "frame written");
                self.frame += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to write frame"),
        }
    }
}
