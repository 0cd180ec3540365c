//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They sit between
//! the high-level [`operations`](super::operations) (which decide what raster
//! to produce) and the [`codec`](super::codec) (which does the actual decode
//! and encode work).
//!
//! ## Types
//!
//! - [`Quality`] — JPEG encoding quality (1–100, default 100). Clamped on construction.
//! - [`Rotation`] — Stored orientation, reduced to a clockwise quarter turn.
//! - [`ImageDescriptor`] — Stored dimensions + rotation, read once from a source file.
//! - [`DisplayDimensions`] — Orientation-corrected dimensions derived from a descriptor.
//! - [`CropRegion`] — Validated fractional crop rectangle + output scale.
//! - [`SampleBounds`] — Validated maximum output size for the sampling path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    /// Output is always written at maximum quality unless configured otherwise.
    fn default() -> Self {
        Self(100)
    }
}

/// Clockwise rotation needed to bring stored pixels into display space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map an EXIF `Orientation` value to its rotation component.
    ///
    /// Mirrored orientations collapse onto the rotation they carry:
    ///
    /// | EXIF | Meaning | Rotation |
    /// |---|---|---|
    /// | 1, 2 | normal / mirrored | 0° |
    /// | 3, 4 | 180° / flipped vertically | 180° |
    /// | 6, 7 | 90° CW / transverse | 90° |
    /// | 8, 5 | 270° CW / transposed | 270° |
    ///
    /// Anything outside 1..=8 is treated as no rotation.
    pub fn from_exif_orientation(value: u32) -> Self {
        match value {
            6 | 7 => Self::Cw90,
            3 | 4 => Self::Cw180,
            8 | 5 => Self::Cw270,
            _ => Self::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }
}

/// What a source file looks like on disk, before orientation correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub stored_width: u32,
    pub stored_height: u32,
    pub rotation: Rotation,
}

/// Width and height as a viewer sees the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("region edges must be finite numbers")]
    NotFinite,
    #[error("horizontal edges must satisfy 0 <= left < right <= 1 (got {left}..{right})")]
    Horizontal { left: f64, right: f64 },
    #[error("vertical edges must satisfy 0 <= top < bottom <= 1 (got {top}..{bottom})")]
    Vertical { top: f64, bottom: f64 },
    #[error("scale must be a positive finite number (got {0})")]
    Scale(f64),
    #[error("region produces an empty {width}x{height} image")]
    Empty { width: u32, height: u32 },
    #[error("region produces a {width}x{height} image, over the {limit} pixel limit")]
    TooLarge { width: u64, height: u64, limit: u64 },
}

/// A crop rectangle in display space, as fractions of the displayed size,
/// plus the scale applied to the cropped pixels.
///
/// Construction validates the rectangle, so every `CropRegion` in the system
/// is non-degenerate and lies inside the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    scale: f64,
}

impl CropRegion {
    pub fn new(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        scale: f64,
    ) -> Result<Self, RegionError> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return Err(RegionError::NotFinite);
        }
        if !(0.0..=1.0).contains(&left) || !(0.0..=1.0).contains(&right) || left >= right {
            return Err(RegionError::Horizontal { left, right });
        }
        if !(0.0..=1.0).contains(&top) || !(0.0..=1.0).contains(&bottom) || top >= bottom {
            return Err(RegionError::Vertical { top, bottom });
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RegionError::Scale(scale));
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
            scale,
        })
    }

    /// The whole image at its native size.
    pub fn full() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 1.0,
            bottom: 1.0,
            scale: 1.0,
        }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Fraction of the display width covered by the region.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Fraction of the display height covered by the region.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Maximum output size for the sampling path.
///
/// `u32::MAX` on an axis means "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl SampleBounds {
    /// Zero bounds are rejected: no raster can fit them and the subsampling
    /// search would never terminate.
    pub fn new(max_width: u32, max_height: u32) -> Option<Self> {
        (max_width > 0 && max_height > 0).then_some(Self {
            max_width,
            max_height,
        })
    }

    pub fn unbounded() -> Self {
        Self {
            max_width: u32::MAX,
            max_height: u32::MAX,
        }
    }
}
