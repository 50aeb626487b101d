use std::sync::Arc;

use image::DynamicImage;
use url::Url;

use crate::error::FetchError;
use crate::image_loader::decode_with_exif_rotation;

/// A fetched and decoded image, ready to hand to a display sink.
#[derive(Debug)]
pub struct LoadedImage {
    source: Url,
    image: DynamicImage,
}

impl LoadedImage {
    pub fn new(source: Url, image: DynamicImage) -> Self {
        Self { source, image }
    }

    /// Decodes raw payload bytes fetched from `source`.
    pub fn decode(source: Url, bytes: &[u8]) -> Result<Self, FetchError> {
        let image = decode_with_exif_rotation(bytes)?;
        Ok(Self::new(source, image))
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

#[derive(Debug, Clone)]
pub enum FetchState {
    Pending,                  // Not completed yet (maybe not even started)
    Loaded(Arc<LoadedImage>), // Fetched and decoded
    Failed,                   // Transport or decode failure, never displayable
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending)
    }

    pub fn loaded(&self) -> Option<&Arc<LoadedImage>> {
        match self {
            FetchState::Loaded(image) => Some(image),
            _ => None,
        }
    }
}
