//! Raster codec trait and shared types.
//!
//! The [`RasterCodec`] trait defines the three operations the engine needs
//! from a pixel codec: a bounds-only probe, a decode with power-of-two
//! subsampling, and a JPEG encode.
//!
//! The production implementation is
//! [`ImageCodec`](super::image_codec::ImageCodec) — pure Rust, built on the
//! `image` crate. Operations are written against the trait so they can be
//! exercised with a recording mock.

use super::params::Quality;
use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Result of a bounds-only decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster codecs.
///
/// Implementations hand back decoded pixels in stored (not display)
/// orientation; orientation handling belongs to the operations layer.
pub trait RasterCodec: Send + Sync {
    /// Read stored pixel dimensions without materializing pixel data.
    fn decode_bounds(&self, path: &Path) -> Result<Dimensions, CodecError>;

    /// Decode to RGBA8 at `1/subsample` resolution (`subsample` is a power of two).
    fn decode(&self, path: &Path, subsample: u32) -> Result<RgbaImage, CodecError>;

    /// Encode as JPEG. Alpha is discarded.
    fn encode(
        &self,
        image: &RgbaImage,
        output: &mut dyn Write,
        quality: Quality,
    ) -> Result<(), CodecError>;
}
