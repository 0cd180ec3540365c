//! Pure calculation functions for orientation and output geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{
    CropRegion, DisplayDimensions, ImageDescriptor, RegionError, Rotation, SampleBounds,
};

/// Orientation-corrected dimensions of a source image.
///
/// Quarter turns swap width and height; 0° and 180° leave them alone.
pub fn display_dimensions(descriptor: &ImageDescriptor) -> DisplayDimensions {
    match descriptor.rotation {
        Rotation::Cw90 | Rotation::Cw270 => DisplayDimensions {
            width: descriptor.stored_height,
            height: descriptor.stored_width,
        },
        Rotation::None | Rotation::Cw180 => DisplayDimensions {
            width: descriptor.stored_width,
            height: descriptor.stored_height,
        },
    }
}

/// Whether decoded pixels must be physically rotated before display-space
/// geometry can be applied to them.
///
/// Not the same predicate as "dimensions swap": 180° keeps the size but
/// still turns every pixel coordinate around.
pub fn needs_pixel_rotation(descriptor: &ImageDescriptor) -> bool {
    descriptor.rotation != Rotation::None
}

/// Largest crop output, in pixels: 512 MiB of RGBA, the same ceiling
/// `image::Limits` puts on a single decode by default.
pub const MAX_OUTPUT_PIXELS: u64 = 512 * 1024 * 1024 / 4;

/// Calculate the pixel size of a crop output.
///
/// `round(display × region extent × scale)` on each axis. A region that
/// rounds to zero on either axis is rejected, and so is one whose output
/// would exceed [`MAX_OUTPUT_PIXELS`].
///
/// # Examples
/// ```
/// # use image_crop::imaging::{calculate_crop_dimensions, CropRegion, DisplayDimensions};
/// let display = DisplayDimensions { width: 800, height: 600 };
/// let region = CropRegion::new(0.25, 0.25, 0.75, 0.75, 1.0).unwrap();
/// assert_eq!(calculate_crop_dimensions(display, &region), Ok((400, 300)));
/// ```
pub fn calculate_crop_dimensions(
    display: DisplayDimensions,
    region: &CropRegion,
) -> Result<(u32, u32), RegionError> {
    // Float-to-int casts saturate, so huge scales land on u64::MAX.
    let width = (display.width as f64 * region.width() * region.scale()).round() as u64;
    let height = (display.height as f64 * region.height() * region.scale()).round() as u64;

    if width == 0 || height == 0 {
        return Err(RegionError::Empty {
            width: width.min(u32::MAX as u64) as u32,
            height: height.min(u32::MAX as u64) as u32,
        });
    }
    match width.checked_mul(height) {
        Some(pixels) if pixels <= MAX_OUTPUT_PIXELS => Ok((width as u32, height as u32)),
        _ => Err(RegionError::TooLarge {
            width,
            height,
            limit: MAX_OUTPUT_PIXELS,
        }),
    }
}

/// A rectangle in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a fractional region onto a raster that is already in display
/// orientation.
///
/// Edges are truncated to whole pixels. The result always covers at least
/// one pixel and never leaves the raster, even for slivers thinner than a
/// pixel.
pub fn calculate_source_rect(raster: (u32, u32), region: &CropRegion) -> PixelRect {
    let (raster_w, raster_h) = raster;
    let edge = |fraction: f64, extent: u32| (extent as f64 * fraction) as u32;

    let x = edge(region.left(), raster_w).min(raster_w.saturating_sub(1));
    let y = edge(region.top(), raster_h).min(raster_h.saturating_sub(1));
    let right = edge(region.right(), raster_w).min(raster_w);
    let bottom = edge(region.bottom(), raster_h).min(raster_h);

    PixelRect {
        x,
        y,
        width: right.saturating_sub(x).max(1),
        height: bottom.saturating_sub(y).max(1),
    }
}

/// Calculate the power-of-two subsampling factor applied while decoding.
///
/// Starts at 1 and doubles while decoding at `1/factor` would still produce
/// an image at least twice the requested bounds on both axes, so the decoded
/// raster always meets or exceeds the bounds.
///
/// # Examples
/// ```
/// # use image_crop::imaging::{calculate_subsample_factor, SampleBounds};
/// let bounds = SampleBounds::new(1000, 1000).unwrap();
/// assert_eq!(calculate_subsample_factor((4000, 3000), bounds), 2);
/// assert_eq!(calculate_subsample_factor((800, 600), bounds), 1);
/// ```
pub fn calculate_subsample_factor(stored: (u32, u32), bounds: SampleBounds) -> u32 {
    let (width, height) = stored;
    let mut factor = 1;

    if height > bounds.max_height || width > bounds.max_width {
        let half_height = height / 2;
        let half_width = width / 2;
        while half_height / factor >= bounds.max_height && half_width / factor >= bounds.max_width
        {
            factor *= 2;
        }
    }

    factor
}

/// Dimensions of a raster decoded at `1/factor` resolution.
pub fn subsampled_dimensions(stored: (u32, u32), factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    ((stored.0 / factor).max(1), (stored.1 / factor).max(1))
}

/// Calculate the final scale-down after a subsampled decode.
///
/// Returns `None` unless the decoded raster exceeds the bounds on *both*
/// axes. The uniform ratio is the larger of the two axis ratios, i.e. the
/// gentler shrink: one axis lands exactly on its bound and the other stays
/// at or above its own, so neither axis is undershot.
pub fn calculate_sample_resize(decoded: (u32, u32), bounds: SampleBounds) -> Option<(u32, u32)> {
    let (width, height) = decoded;
    if width <= bounds.max_width || height <= bounds.max_height {
        return None;
    }

    let ratio = (bounds.max_width as f64 / width as f64)
        .max(bounds.max_height as f64 / height as f64);

    let scaled_w = ((width as f64 * ratio).round() as u32).max(1);
    let scaled_h = ((height as f64 * ratio).round() as u32).max(1);
    Some((scaled_w, scaled_h))
}
