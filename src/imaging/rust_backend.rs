//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image` crate, decoder picked by [`LoadMode`] |
//! | EXIF block | `ImageDecoder::exif_metadata`, parsed by `kamadak-exif` |
//! | Nearest / bicubic resample | `DynamicImage::resize_exact` (`Nearest` / `CatmullRom`) |
//! | Integer shrink | `DynamicImage::thumbnail_exact` (area average) |
//! | 3×3 convolution | `DynamicImage::filter3x3` |
//! | Separable convolution | `imageproc::filter::separable_filter_equal` |
//! | Extract / rotate | `crop_imm`, `rotate90/180/270` |
//! | Encode | `JpegEncoder` / `PngEncoder`, otherwise format from extension |
//!
//! ICC profiles and the raw EXIF block are carried from the decoder to the
//! encoder unless the writer drops them. Removing an orientation entry also
//! resets the orientation inside the carried EXIF block.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{resampled_dimensions, shrunk_dimensions};
use super::metadata;
use super::params::{
    ConvolutionMask, Interpolation, LoadMode, Operation, OutputFormat, Rotation, Writer,
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Quality used for JPEG output when no option sets one.
const DEFAULT_JPEG_QUALITY: u8 = 75;

/// A decoded image plus the metadata that travels with it.
#[derive(Debug, Clone)]
pub struct RustImage {
    pub pixels: DynamicImage,
    pub metadata: BTreeMap<String, String>,
    pub icc_profile: Option<Vec<u8>>,
    /// Raw EXIF block as read by the decoder.
    pub exif: Option<Vec<u8>>,
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk with the decoder `mode` selects.
fn load_image(path: &Path, mode: LoadMode) -> Result<RustImage, BackendError> {
    let mut reader = ImageReader::open(path).map_err(BackendError::Io)?;
    match mode {
        LoadMode::Jpeg => reader.set_format(ImageFormat::Jpeg),
        LoadMode::Png => reader.set_format(ImageFormat::Png),
        LoadMode::Generic => reader = reader.with_guessed_format().map_err(BackendError::Io)?,
    }

    let mut decoder = reader.into_decoder().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })?;
    let icc_profile = decoder.icc_profile().ok().flatten();
    let exif = decoder.exif_metadata().ok().flatten();
    let pixels = DynamicImage::from_decoder(decoder).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })?;

    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        pixels.width(),
        pixels.height(),
        mode
    );

    Ok(RustImage {
        pixels,
        metadata: exif
            .as_deref()
            .map(metadata::read_orientation)
            .unwrap_or_default(),
        icc_profile,
        exif,
    })
}

fn convolve(pixels: &DynamicImage, mask: &ConvolutionMask) -> Result<DynamicImage, BackendError> {
    if mask.width != 3 || mask.height != 3 {
        return Err(BackendError::ProcessingFailed(format!(
            "Unsupported convolution mask size {}x{}",
            mask.width, mask.height
        )));
    }
    Ok(pixels.filter3x3(&mask.normalised()))
}

fn convolve_separable(
    pixels: &DynamicImage,
    mask: &ConvolutionMask,
) -> Result<DynamicImage, BackendError> {
    if mask.height != 1 || mask.coefficients.is_empty() {
        return Err(BackendError::ProcessingFailed(
            "Separable convolution needs a non-empty 1-D mask".into(),
        ));
    }
    let kernel = mask.normalised();
    let filtered = imageproc::filter::separable_filter_equal(&pixels.to_rgba8(), &kernel);
    Ok(DynamicImage::ImageRgba8(filtered))
}

fn extract(
    pixels: &DynamicImage,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Result<DynamicImage, BackendError> {
    let fits_x = left.checked_add(width).is_some_and(|r| r <= pixels.width());
    let fits_y = top.checked_add(height).is_some_and(|b| b <= pixels.height());
    if width == 0 || height == 0 || !fits_x || !fits_y {
        return Err(BackendError::ProcessingFailed(format!(
            "Bad extract area {}x{}+{}+{} for {}x{} image",
            width,
            height,
            left,
            top,
            pixels.width(),
            pixels.height()
        )));
    }
    Ok(pixels.crop_imm(left, top, width, height))
}

/// Map PNG `compression` 0–9 onto the encoder's presets.
fn png_compression(level: Option<u8>) -> CompressionType {
    match level {
        None => CompressionType::Default,
        Some(0..=3) => CompressionType::Fast,
        Some(4..=6) => CompressionType::Default,
        Some(_) => CompressionType::Best,
    }
}

fn attach_icc(encoder: &mut impl ImageEncoder, image: &RustImage, writer: &Writer) {
    if !writer.keep_icc {
        return;
    }
    if let Some(icc) = &image.icc_profile {
        if encoder.set_icc_profile(icc.clone()).is_err() {
            log::debug!("encoder does not support ICC profiles, dropping");
        }
    }
}

fn attach_exif(encoder: &mut impl ImageEncoder, image: &RustImage, writer: &Writer) {
    if !writer.keep_exif {
        return;
    }
    if let Some(exif) = &image.exif {
        if encoder.set_exif_metadata(exif.clone()).is_err() {
            log::debug!("encoder does not support EXIF, dropping");
        }
    }
}

fn encode_error(e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Encode failed: {}", e))
}

impl ImageBackend for RustBackend {
    type Image = RustImage;

    fn load(&self, path: &Path, mode: LoadMode) -> Result<RustImage, BackendError> {
        load_image(path, mode)
    }

    fn apply(&self, mut image: RustImage, op: &Operation) -> Result<RustImage, BackendError> {
        let current = Dimensions::new(image.pixels.width(), image.pixels.height());
        image.pixels = match op {
            Operation::Resample {
                interpolation,
                ratio,
            } => {
                let target = resampled_dimensions(current, *ratio);
                let filter = match interpolation {
                    Interpolation::Nearest => FilterType::Nearest,
                    Interpolation::Bicubic => FilterType::CatmullRom,
                };
                image.pixels.resize_exact(target.width, target.height, filter)
            }
            Operation::Shrink { factor } => {
                let target = shrunk_dimensions(current, *factor);
                image.pixels.thumbnail_exact(target.width, target.height)
            }
            // Decoded images are fully in memory; nothing to cache.
            Operation::TileCache { .. } => return Ok(image),
            Operation::Convolve(mask) => convolve(&image.pixels, mask)?,
            Operation::ConvolveSeparable(mask) => convolve_separable(&image.pixels, mask)?,
            Operation::Extract {
                left,
                top,
                width,
                height,
            } => extract(&image.pixels, *left, *top, *width, *height)?,
            Operation::Rotate(Rotation::Rotate90) => image.pixels.rotate90(),
            Operation::Rotate(Rotation::Rotate180) => image.pixels.rotate180(),
            Operation::Rotate(Rotation::Rotate270) => image.pixels.rotate270(),
            Operation::RemoveMetadata(key) => {
                image.metadata.remove(key);
                if metadata::is_orientation_key(key) {
                    if let Some(exif) = image.exif.as_mut() {
                        metadata::clear_orientation(exif);
                    }
                }
                return Ok(image);
            }
        };
        Ok(image)
    }

    fn dimensions(&self, image: &RustImage) -> Dimensions {
        Dimensions::new(image.pixels.width(), image.pixels.height())
    }

    fn metadata(&self, image: &RustImage, key: &str) -> Option<String> {
        image.metadata.get(key).cloned()
    }

    fn write(&self, image: &RustImage, writer: &Writer, path: &Path) -> Result<(), BackendError> {
        let format = match writer.format {
            Some(OutputFormat::Jpeg) => ImageFormat::Jpeg,
            Some(OutputFormat::Png) => ImageFormat::Png,
            None => ImageFormat::from_path(path).map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Cannot infer output format for {}: {}",
                    path.display(),
                    e
                ))
            })?,
        };

        let file = File::create(path).map_err(BackendError::Io)?;
        let mut out = BufWriter::new(file);

        match format {
            ImageFormat::Jpeg => {
                let quality = writer
                    .options
                    .quality
                    .map(|q| q.value() as u8)
                    .unwrap_or(DEFAULT_JPEG_QUALITY);
                let mut encoder = JpegEncoder::new_with_quality(out, quality);
                attach_icc(&mut encoder, image, writer);
                attach_exif(&mut encoder, image, writer);
                DynamicImage::ImageRgb8(image.pixels.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(encode_error)
            }
            ImageFormat::Png => {
                if writer.options.interlace {
                    log::warn!("PNG interlacing is not supported, writing non-interlaced");
                }
                let mut encoder = PngEncoder::new_with_quality(
                    out,
                    png_compression(writer.options.compression),
                    PngFilter::Adaptive,
                );
                attach_icc(&mut encoder, image, writer);
                attach_exif(&mut encoder, image, writer);
                image.pixels.write_with_encoder(encoder).map_err(encode_error)
            }
            other => image.pixels.write_to(&mut out, other).map_err(encode_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::kernels::{gaussian_mask, sharpen_mask};
    use crate::imaging::params::{FormatOptions, Quality};
    use crate::test_helpers::{create_test_jpeg, create_test_jpeg_with_orientation, create_test_png};

    fn loaded(width: u32, height: u32) -> (tempfile::TempDir, RustImage) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("source.jpg");
        create_test_jpeg(&path, width, height);
        let image = RustBackend::new().load(&path, LoadMode::Jpeg).unwrap();
        (tmp, image)
    }

    #[test]
    fn load_synthetic_jpeg() {
        let (_tmp, image) = loaded(200, 150);
        assert_eq!(
            RustBackend::new().dimensions(&image),
            Dimensions::new(200, 150)
        );
        assert!(image.metadata.is_empty());
    }

    #[test]
    fn load_reads_orientation_tag() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rotated.jpg");
        create_test_jpeg_with_orientation(&path, 40, 20, 6);

        let backend = RustBackend::new();
        let image = backend.load(&path, LoadMode::Jpeg).unwrap();
        assert_eq!(
            backend.metadata(&image, metadata::IFD0_ORIENTATION),
            Some("6".to_string())
        );

        let image = backend
            .apply(
                image,
                &Operation::RemoveMetadata(metadata::IFD0_ORIENTATION.into()),
            )
            .unwrap();
        assert!(image.metadata.is_empty());
    }

    fn rotated_source(tmp: &tempfile::TempDir) -> RustImage {
        let path = tmp.path().join("rotated.jpg");
        create_test_jpeg_with_orientation(&path, 40, 20, 6);
        RustBackend::new().load(&path, LoadMode::Jpeg).unwrap()
    }

    fn reload_orientation(path: &Path) -> Option<String> {
        let backend = RustBackend::new();
        let image = backend.load(path, LoadMode::Jpeg).unwrap();
        backend.metadata(&image, metadata::IFD0_ORIENTATION)
    }

    #[test]
    fn exif_is_carried_to_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let image = rotated_source(&tmp);
        assert!(image.exif.is_some());
        let output = tmp.path().join("out.jpg");

        let writer = Writer::new(None, FormatOptions::default());
        RustBackend::new().write(&image, &writer, &output).unwrap();
        assert_eq!(reload_orientation(&output), Some("6".to_string()));
    }

    #[test]
    fn removed_exif_is_not_written() {
        let tmp = tempfile::TempDir::new().unwrap();
        let image = rotated_source(&tmp);
        let output = tmp.path().join("out.jpg");

        let mut writer = Writer::new(None, FormatOptions::default());
        writer.remove_exif();
        RustBackend::new().write(&image, &writer, &output).unwrap();

        let reloaded = RustBackend::new().load(&output, LoadMode::Jpeg).unwrap();
        assert!(reloaded.exif.is_none());
        assert!(reloaded.metadata.is_empty());
    }

    #[test]
    fn removing_orientation_resets_written_tag() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = RustBackend::new();
        let image = backend
            .apply(
                rotated_source(&tmp),
                &Operation::RemoveMetadata(metadata::IFD0_ORIENTATION.into()),
            )
            .unwrap();
        let output = tmp.path().join("out.jpg");

        let writer = Writer::new(None, FormatOptions::default());
        backend.write(&image, &writer, &output).unwrap();
        assert_eq!(reload_orientation(&output), Some("1".to_string()));
    }

    #[test]
    fn png_source_written_as_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        let output = tmp.path().join("out.jpg");
        create_test_png(&source, 64, 32);

        let backend = RustBackend::new();
        let image = backend.load(&source, LoadMode::Png).unwrap();
        let writer = Writer::new(Some(OutputFormat::Jpeg), FormatOptions::default());
        backend.write(&image, &writer, &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(image::image_dimensions(&output).unwrap(), (64, 32));
    }

    #[test]
    fn load_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.load(Path::new("/nonexistent/image.jpg"), LoadMode::Jpeg);
        assert!(result.is_err());
    }

    #[test]
    fn load_text_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("notes.png");
        std::fs::write(&path, "not a png").unwrap();
        let result = RustBackend::new().load(&path, LoadMode::Png);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn resample_and_shrink_follow_calculated_sizes() {
        let backend = RustBackend::new();
        let (_tmp, image) = loaded(300, 200);

        let image = backend
            .apply(image, &Operation::Shrink { factor: 7 })
            .unwrap();
        assert_eq!(backend.dimensions(&image), Dimensions::new(42, 28));

        let image = backend
            .apply(
                image,
                &Operation::Resample {
                    interpolation: Interpolation::Nearest,
                    ratio: 2.5,
                },
            )
            .unwrap();
        assert_eq!(backend.dimensions(&image), Dimensions::new(105, 70));
    }

    #[test]
    fn convolutions_keep_dimensions() {
        let backend = RustBackend::new();
        let (_tmp, image) = loaded(64, 48);

        let image = backend
            .apply(image, &Operation::Convolve(sharpen_mask()))
            .unwrap();
        let image = backend
            .apply(
                image,
                &Operation::ConvolveSeparable(gaussian_mask(2.0, 0.2).unwrap()),
            )
            .unwrap();
        assert_eq!(backend.dimensions(&image), Dimensions::new(64, 48));
    }

    #[test]
    fn extract_out_of_bounds_errors() {
        let backend = RustBackend::new();
        let (_tmp, image) = loaded(100, 100);
        let result = backend.apply(
            image,
            &Operation::Extract {
                left: 50,
                top: 0,
                width: 60,
                height: 10,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn rotate_swaps_axes() {
        let backend = RustBackend::new();
        let (_tmp, image) = loaded(120, 80);
        let image = backend
            .apply(image, &Operation::Rotate(Rotation::Rotate90))
            .unwrap();
        assert_eq!(backend.dimensions(&image), Dimensions::new(80, 120));
    }

    #[test]
    fn write_jpeg_with_quality() {
        let backend = RustBackend::new();
        let (tmp, image) = loaded(80, 60);
        let output = tmp.path().join("out.jpg");
        let writer = Writer::new(
            None,
            FormatOptions {
                quality: Some(Quality::new(40)),
                ..FormatOptions::default()
            },
        );

        backend.write(&image, &writer, &output).unwrap();
        assert_eq!(image::image_dimensions(&output).unwrap(), (80, 60));
    }

    #[test]
    fn write_override_ignores_extension() {
        let backend = RustBackend::new();
        let (tmp, image) = loaded(32, 32);
        let output = tmp.path().join("out.jpg");
        let writer = Writer::new(Some(OutputFormat::Png), FormatOptions::default());

        backend.write(&image, &writer, &output).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn write_unknown_extension_errors() {
        let backend = RustBackend::new();
        let (tmp, image) = loaded(16, 16);
        let writer = Writer::new(None, FormatOptions::default());
        let result = backend.write(&image, &writer, &tmp.path().join("out.unknown"));
        assert!(result.is_err());
    }

    #[test]
    fn png_compression_levels() {
        assert!(matches!(png_compression(None), CompressionType::Default));
        assert!(matches!(png_compression(Some(1)), CompressionType::Fast));
        assert!(matches!(png_compression(Some(9)), CompressionType::Best));
    }
}
