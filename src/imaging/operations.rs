//! High-level image operations.
//!
//! [`ImageProcessor`] combines the pure calculations with a [`RasterCodec`]
//! and a [`MetadataStore`]: it reads the descriptor, decides the geometry,
//! runs the pixel transforms and writes the result into the scratch
//! directory.
//!
//! Every raster produced along the way is a [`RasterBuffer`] owned by the
//! current stage, so all of them are released on every return path,
//! including `?` early returns. [`ImageProcessor::ledger`] exposes the live
//! count.

use super::calculations::{
    calculate_crop_dimensions, calculate_sample_resize, calculate_source_rect,
    calculate_subsample_factor, display_dimensions, needs_pixel_rotation,
};
use super::codec::{CodecError, RasterCodec};
use super::params::{
    CropRegion, DisplayDimensions, ImageDescriptor, Quality, RegionError, SampleBounds,
};
use super::raster::{RasterBuffer, RasterLedger};
use super::transform::{self, ResampleFilter};
use crate::metadata::{MetadataStore, preserve_metadata, read_rotation};
use crate::scratch::ScratchDir;
use std::fmt;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a source image could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unreadable {
    /// The file does not exist.
    Missing,
    /// The file exists but yields no pixel data.
    Undecodable(String),
}

impl fmt::Display for Unreadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("cannot be opened"),
            Self::Undecodable(reason) => write!(f, "cannot be decoded: {reason}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Image source {} {cause}", path.display())]
    SourceUnreadable { path: PathBuf, cause: Unreadable },
    #[error("Image could not be saved: {0}")]
    EncodeFailed(#[source] CodecError),
    #[error("Invalid crop region: {0}")]
    InvalidRegion(#[from] RegionError),
    #[error("Invalid sample bounds {width}x{height}: both must be positive")]
    InvalidBounds { width: u32, height: u32 },
}

impl ImagingError {
    fn missing(path: &Path) -> Self {
        Self::SourceUnreadable {
            path: path.to_path_buf(),
            cause: Unreadable::Missing,
        }
    }

    fn undecodable(path: &Path, reason: impl ToString) -> Self {
        Self::SourceUnreadable {
            path: path.to_path_buf(),
            cause: Unreadable::Undecodable(reason.to_string()),
        }
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Crop, sample and describe images through a codec and a metadata store.
///
/// Holds no per-call state; a single processor can serve any number of
/// concurrent calls.
pub struct ImageProcessor<C: RasterCodec, M: MetadataStore> {
    codec: C,
    ledger: RasterLedger,
    scratch: ScratchDir,
    quality: Quality,
    filter: ResampleFilter,
    metadata: PhantomData<fn() -> M>,
}

impl<C: RasterCodec, M: MetadataStore> ImageProcessor<C, M> {
    pub fn new(codec: C, scratch: ScratchDir) -> Self {
        Self {
            codec,
            ledger: RasterLedger::new(),
            scratch,
            quality: Quality::default(),
            filter: ResampleFilter::default(),
            metadata: PhantomData,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn ledger(&self) -> &RasterLedger {
        &self.ledger
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Stored dimensions and rotation of a source file.
    ///
    /// Orientation that cannot be read is treated as upright. The
    /// dimensions come from a bounds-only decode.
    pub fn read_descriptor(&self, path: &Path) -> Result<ImageDescriptor> {
        if !path.is_file() {
            return Err(ImagingError::missing(path));
        }
        let rotation = read_rotation::<M>(path);
        let bounds = self
            .codec
            .decode_bounds(path)
            .map_err(|e| ImagingError::undecodable(path, e))?;
        if bounds.width == 0 || bounds.height == 0 {
            return Err(ImagingError::undecodable(path, "image has no dimensions"));
        }
        Ok(ImageDescriptor {
            stored_width: bounds.width,
            stored_height: bounds.height,
            rotation,
        })
    }

    /// Orientation-corrected dimensions of a source file.
    pub fn describe(&self, path: &Path) -> Result<DisplayDimensions> {
        Ok(display_dimensions(&self.read_descriptor(path)?))
    }

    /// Crop `region` out of the display-oriented source and scale it.
    pub fn crop_raster(&self, path: &Path, region: &CropRegion) -> Result<RasterBuffer> {
        let descriptor = self.read_descriptor(path)?;
        let display = display_dimensions(&descriptor);
        let (width, height) = calculate_crop_dimensions(display, region)?;

        let decoded = self.decode(path, 1)?;
        let oriented = if needs_pixel_rotation(&descriptor) {
            transform::rotate(decoded, descriptor.rotation)
        } else {
            decoded
        };

        let source_rect = calculate_source_rect(oriented.dimensions(), region);
        log::debug!(
            "Crop {}: rotated {}°, {:?} of {}x{} -> {}x{}",
            path.display(),
            descriptor.rotation.degrees(),
            source_rect,
            oriented.width(),
            oriented.height(),
            width,
            height
        );
        Ok(transform::crop_resample(
            oriented,
            source_rect,
            width,
            height,
            self.filter,
        ))
    }

    /// [`crop_raster`](Self::crop_raster), encoded to a new scratch file.
    ///
    /// The source metadata is not carried over: the output lives in a
    /// rotated, re-framed pixel space the source tags no longer describe.
    pub fn crop(&self, path: &Path, region: &CropRegion) -> Result<PathBuf> {
        let raster = self.crop_raster(path, region)?;
        self.encode_to_scratch(raster)
    }

    /// Decode at the coarsest power-of-two subsampling that still covers
    /// `bounds`, then scale down uniformly if both axes are still over.
    ///
    /// The raster stays in stored orientation.
    pub fn sample_raster(&self, path: &Path, bounds: SampleBounds) -> Result<RasterBuffer> {
        let descriptor = self.read_descriptor(path)?;
        let stored = (descriptor.stored_width, descriptor.stored_height);
        let factor = calculate_subsample_factor(stored, bounds);
        log::debug!(
            "Sample {}: {}x{} at 1/{factor}",
            path.display(),
            stored.0,
            stored.1
        );

        let decoded = self.decode(path, factor)?;
        match calculate_sample_resize(decoded.dimensions(), bounds) {
            Some((width, height)) => Ok(transform::resize(decoded, width, height, self.filter)),
            None => Ok(decoded),
        }
    }

    /// [`sample_raster`](Self::sample_raster), encoded to a new scratch file
    /// with the allow-listed source metadata copied onto it.
    ///
    /// A metadata failure is logged and does not fail the call.
    pub fn sample(&self, path: &Path, max_width: u32, max_height: u32) -> Result<PathBuf> {
        let bounds =
            SampleBounds::new(max_width, max_height).ok_or(ImagingError::InvalidBounds {
                width: max_width,
                height: max_height,
            })?;
        let raster = self.sample_raster(path, bounds)?;
        let output = self.encode_to_scratch(raster)?;
        preserve_metadata::<M>(path, &output);
        Ok(output)
    }

    fn decode(&self, path: &Path, subsample: u32) -> Result<RasterBuffer> {
        let image = self
            .codec
            .decode(path, subsample)
            .map_err(|e| ImagingError::undecodable(path, e))?;
        Ok(self.ledger.track(image))
    }

    /// Encode into a fresh scratch file and keep it. The raster is
    /// released before the file is persisted.
    fn encode_to_scratch(&self, raster: RasterBuffer) -> Result<PathBuf> {
        let mut file = self
            .scratch
            .create_output()
            .map_err(|e| ImagingError::EncodeFailed(e.into()))?;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            self.codec
                .encode(raster.image(), &mut writer, self.quality)
                .map_err(ImagingError::EncodeFailed)?;
            writer
                .flush()
                .map_err(|e| ImagingError::EncodeFailed(e.into()))?;
        }
        drop(raster);

        let (_, path) = file
            .keep()
            .map_err(|e| ImagingError::EncodeFailed(e.error.into()))?;
        Ok(path)
    }
}
