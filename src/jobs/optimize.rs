//! Photo optimization handler: the worker-side half of the eventual
//! consistency contract around `events.photo`.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::EventRepository;
use crate::jobs::queue::OptimizeImagePayload;
use crate::storage::{ObjectStore, StorageError};

/// Fit bound for optimized photos; aspect ratio is preserved and images
/// already inside the bound are not upscaled.
const MAX_WIDTH: u32 = 1920;
const MAX_HEIGHT: u32 = 1080;
const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum JobError {
    /// Malformed input. Logged and dropped, never retried.
    #[error("terminal: {0}")]
    Terminal(String),

    /// Storage or database hiccup. Retried per the queue's backoff policy.
    #[error("transient: {0}")]
    Transient(String),
}

impl From<StorageError> for JobError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
                JobError::Terminal(err.to_string())
            }
            StorageError::Io(_) => JobError::Transient(err.to_string()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Updated(Uuid),
    /// The event was deleted before the job ran; the conditional update
    /// touched zero rows. This is a successful no-op.
    EventGone,
}

/// Fetch, optimize, re-upload and converge the event row.
///
/// Runs with its own transaction scope on the worker's pool; connections
/// are never shared with the web-serving process. Safe to re-execute: a
/// rerun re-derives the same optimized key and the photo update is
/// idempotent.
pub async fn run(
    pool: &PgPool,
    store: &dyn ObjectStore,
    job: &OptimizeImagePayload,
) -> Result<OptimizeOutcome, JobError> {
    let raw = store.get(&job.object_key).await?;

    let optimized = tokio::task::spawn_blocking(move || optimize_bytes(&raw))
        .await
        .map_err(|e| JobError::Transient(format!("optimize task panicked: {e}")))?
        .map_err(|e| JobError::Terminal(format!("malformed image payload: {e}")))?;

    let new_key = optimized_key(&job.object_key);
    let url = store.put(&new_key, optimized, "image/jpeg").await?;

    if let Err(err) = store.delete(&job.object_key).await {
        // The optimized copy is already in place; leaking the raw original
        // is preferable to rerunning the whole job.
        warn!(key = %job.object_key, error = %err, "failed to delete raw upload");
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| JobError::Transient(e.to_string()))?;
    let updated = EventRepository::update_photo(&mut tx, job.event_id, &url)
        .await
        .map_err(|e| JobError::Transient(e.to_string()))?;
    tx.commit()
        .await
        .map_err(|e| JobError::Transient(e.to_string()))?;

    match updated {
        Some(event_id) => Ok(OptimizeOutcome::Updated(event_id)),
        None => {
            info!(event_id = %job.event_id, "event deleted before optimization; no-op");
            Ok(OptimizeOutcome::EventGone)
        }
    }
}

/// Decode, reorient per embedded metadata, normalize to RGB, downscale to
/// fit within the bound and re-encode as JPEG.
pub fn optimize_bytes(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let img = if img.width() > MAX_WIDTH || img.height() > MAX_HEIGHT {
        img.thumbnail(MAX_WIDTH, MAX_HEIGHT)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    Ok(out)
}

/// Derive the upload key for the optimized copy, keeping any path prefix:
/// `uploads/cat.heic` -> `uploads/optimized_cat.jpg`.
pub fn optimized_key(key: &str) -> String {
    let (dir, filename) = match key.rsplit_once('/') {
        Some((dir, filename)) => (Some(dir), filename),
        None => (None, key),
    };
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);

    match dir {
        Some(dir) => format!("{dir}/optimized_{stem}.jpg"),
        None => format!("optimized_{stem}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 60, 200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn downscales_to_fit_bound_preserving_aspect() {
        let optimized = optimize_bytes(&png_bytes(3840, 1080)).unwrap();
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert!(decoded.width() <= MAX_WIDTH);
        assert!(decoded.height() <= MAX_HEIGHT);
        // 32:9 input stays 32:9 within rounding.
        assert_eq!(decoded.width(), 1920);
        assert_eq!(decoded.height(), 540);
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let optimized = optimize_bytes(&png_bytes(64, 48)).unwrap();
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn output_is_jpeg() {
        let optimized = optimize_bytes(&png_bytes(10, 10)).unwrap();
        assert_eq!(
            image::guess_format(&optimized).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        assert!(optimize_bytes(b"definitely not an image").is_err());
    }

    #[test]
    fn optimized_key_keeps_prefix_and_swaps_extension() {
        assert_eq!(optimized_key("uploads/cat.heic"), "uploads/optimized_cat.jpg");
        assert_eq!(optimized_key("cat.png"), "optimized_cat.jpg");
        assert_eq!(optimized_key("noext"), "optimized_noext.jpg");
        assert_eq!(
            optimized_key("a/b/photo.2024.png"),
            "a/b/optimized_photo.2024.jpg"
        );
    }
}
