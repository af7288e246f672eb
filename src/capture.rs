use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Long-edge cap for uploads. Desktop screenshots and camera rolls can
/// be far larger than the OCR endpoint needs.
const MAX_EDGE: u32 = 1920;
const JPEG_QUALITY: u8 = 80;

/// The server keys storage off its own naming, so the upload file name
/// is fixed.
const UPLOAD_FILE_NAME: &str = "meter.jpg";

/// A picked photo re-encoded for upload.
#[derive(Debug)]
pub struct PreparedPhoto {
    pub jpeg: Vec<u8>,
    pub file_name: String,
    pub source: PathBuf,
}

pub fn prepare_photo(path: &Path) -> Result<PreparedPhoto> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read photo {}", path.display()))?;
    let decoded = image::load_from_memory(&bytes)
        .with_context(|| format!("could not read image {}", path.display()))?;

    let decoded = if decoded.width().max(decoded.height()) > MAX_EDGE {
        decoded.resize(MAX_EDGE, MAX_EDGE, FilterType::Triangle)
    } else {
        decoded
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("failed to encode photo as JPEG")?;

    Ok(PreparedPhoto {
        jpeg,
        file_name: UPLOAD_FILE_NAME.to_string(),
        source: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn write_png(dir: &tempfile::TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 90, 60]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn reencodes_as_jpeg_with_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "small.png", 320, 240);

        let photo = prepare_photo(&path).unwrap();
        assert_eq!(photo.file_name, "meter.jpg");
        assert_eq!(photo.source, path);

        let round = image::load_from_memory(&photo.jpeg).unwrap();
        assert_eq!((round.width(), round.height()), (320, 240));
        assert_eq!(
            image::guess_format(&photo.jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn oversized_photos_are_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "big.png", 4000, 1000);

        let photo = prepare_photo(&path).unwrap();
        let round = image::load_from_memory(&photo.jpeg).unwrap();
        assert_eq!((round.width(), round.height()), (1920, 480));
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"not an image").unwrap();

        let err = prepare_photo(&path).unwrap_err();
        assert!(err.to_string().contains("could not read image"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.jpg");
        assert!(prepare_photo(&path).is_err());
    }
}
