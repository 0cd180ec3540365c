//! Pure Rust raster codec — no system image libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Bounds probe | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Subsampled JPEG decode | `jpeg_decoder::Decoder::scale` (reduced IDCT, down to 1/8) |
//! | Subsampling, other formats | `image::DynamicImage::thumbnail_exact` (integer box reduction) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! A subsampled JPEG is decoded straight at the reduced size, so the
//! full-resolution frame never exists in memory. Factors past 1/8, and
//! formats without a scaled decode, finish with a box reduction.

use super::calculations::subsampled_dimensions;
use super::codec::{CodecError, Dimensions, RasterCodec};
use super::params::Quality;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{
    DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageFormat, ImageReader, RgbImage,
    RgbaImage,
};
use jpeg_decoder::PixelFormat;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

type FileReader = ImageReader<BufReader<File>>;

fn open_reader(path: &Path) -> Result<FileReader, CodecError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn decode_full(reader: FileReader, path: &Path) -> Result<DynamicImage, CodecError> {
    reader.decode().map_err(|e| {
        CodecError::DecodeFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// Decode a JPEG through the reduced IDCT, at the smallest of 1, 1/2, 1/4
/// or 1/8 that still covers `1/subsample` of the stored size.
///
/// Returns the raster with the stored size, or `None` for pixel formats
/// the scaled path does not handle (CMYK, 16-bit lossless); nothing has
/// been decoded at that point.
fn decode_jpeg_scaled(
    input: BufReader<File>,
    path: &Path,
    subsample: u32,
) -> Result<Option<(DynamicImage, (u32, u32))>, CodecError> {
    let failed = |e: jpeg_decoder::Error| {
        CodecError::DecodeFailed(format!("Failed to decode {}: {}", path.display(), e))
    };

    let mut decoder = jpeg_decoder::Decoder::new(input);
    decoder.read_info().map_err(failed)?;
    let info = decoder
        .info()
        .ok_or_else(|| CodecError::DecodeFailed(format!("No JPEG header in {}", path.display())))?;
    if !matches!(info.pixel_format, PixelFormat::RGB24 | PixelFormat::L8) {
        return Ok(None);
    }

    let stored = (u32::from(info.width), u32::from(info.height));
    let (target_w, target_h) = subsampled_dimensions(stored, subsample);
    let (width, height) = decoder
        .scale(
            u16::try_from(target_w).unwrap_or(u16::MAX),
            u16::try_from(target_h).unwrap_or(u16::MAX),
        )
        .map_err(failed)?;
    let pixels = decoder.decode().map_err(failed)?;

    let (width, height) = (u32::from(width), u32::from(height));
    let image = match info.pixel_format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        _ => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
    };
    image.map(|image| Some((image, stored))).ok_or_else(|| {
        CodecError::DecodeFailed(format!("Truncated pixel data in {}", path.display()))
    })
}

impl RasterCodec for ImageCodec {
    fn decode_bounds(&self, path: &Path) -> Result<Dimensions, CodecError> {
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            CodecError::DecodeFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path, subsample: u32) -> Result<RgbaImage, CodecError> {
        let reader = open_reader(path)?;
        if subsample <= 1 {
            return Ok(decode_full(reader, path)?.into_rgba8());
        }

        let scaled = match reader.format() {
            Some(ImageFormat::Jpeg) => decode_jpeg_scaled(reader.into_inner(), path, subsample)?,
            _ => None,
        };
        let (decoded, stored) = match scaled {
            Some(scaled) => scaled,
            None => {
                let full = decode_full(open_reader(path)?, path)?;
                let stored = (full.width(), full.height());
                (full, stored)
            }
        };

        // Reduced IDCT rounds up; align with the floor of stored / subsample.
        let (width, height) = subsampled_dimensions(stored, subsample);
        if decoded.width() == width && decoded.height() == height {
            return Ok(decoded.into_rgba8());
        }
        let reduced = decoded.thumbnail_exact(width, height);
        drop(decoded);
        Ok(reduced.into_rgba8())
    }

    fn encode(
        &self,
        image: &RgbaImage,
        output: &mut dyn Write,
        quality: Quality,
    ) -> Result<(), CodecError> {
        // JPEG has no alpha channel.
        let rgb: RgbImage = image.convert();
        JpegEncoder::new_with_quality(output, quality.value())
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| CodecError::EncodeFailed(format!("JPEG encode failed: {}", e)))
    }
}
