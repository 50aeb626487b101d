use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::{In, Reader, Tag, Value};
use image::{DynamicImage, ImageFormat, ImageResult};
use url::Url;

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::SourceError;

// --- Helper: Load and Sort Image Paths ---
pub fn load_sorted_image_paths(dir_path: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir_path).map_err(|source| SourceError::ReadDir {
        path: dir_path.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| SourceError::ReadDir {
            path: dir_path.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    if paths.is_empty() {
        Err(SourceError::NoImages(dir_path.to_path_buf()))
    } else {
        Ok(paths)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Turns command line sources into the ordered identifiers of a carousel.
///
/// A source is either an `http`, `https` or `file` url, a single image file,
/// or a directory whose images are added in file name order.
pub fn resolve_sources<S: AsRef<str>>(sources: &[S]) -> Result<Vec<Url>, SourceError> {
    let mut urls = Vec::new();
    for source in sources {
        let source = source.as_ref();
        if let Ok(url) = Url::parse(source) {
            if matches!(url.scheme(), "http" | "https" | "file") {
                urls.push(url);
                continue;
            }
        }

        // Anything else is a path, relative ones included
        let path = fs::canonicalize(source).map_err(|e| SourceError::BadPath {
            path: PathBuf::from(source),
            source: e,
        })?;
        if path.is_dir() {
            for image_path in load_sorted_image_paths(&path)? {
                urls.push(file_url(image_path)?);
            }
        } else {
            urls.push(file_url(path)?);
        }
    }
    Ok(urls)
}

fn file_url(path: PathBuf) -> Result<Url, SourceError> {
    Url::from_file_path(&path).map_err(|()| SourceError::NotAbsolute(path))
}

// --- Decode Image, Apply EXIF Rotation ---
pub fn decode_with_exif_rotation(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let image = image::load_from_memory(bytes)?;

    // Orientation is only read reliably from JPEG containers
    let orientation = match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => exif_orientation(bytes).unwrap_or(1),
        _ => 1,
    };

    Ok(apply_orientation(image, orientation))
}

fn exif_orientation(bytes: &[u8]) -> Option<u16> {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => {
            let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
            match &field.value {
                Value::Short(values) => values.first().copied(),
                _ => None,
            }
        }
        Err(e) => {
            // Non-critical: proceed without rotation
            tracing::debug!(error = %e, "could not read EXIF data");
            None
        }
    }
}

// 1 = Top-left (Normal)
// 3 = Bottom-right (180 deg)
// 6 = Top-right (90 deg clockwise)
// 8 = Bottom-left (270 deg clockwise / 90 deg counter-clockwise)
// Others involve flips, ignored here.
fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        3 => image.rotate180(),
        6 => image.rotate90(),
        8 => image.rotate270(),
        _ => image,
    }
}
