//! Pixel transforms applied between decode and encode.
//!
//! Every transform consumes a [`RasterBuffer`] and returns a new one, so
//! the input is released as soon as its successor exists.

use super::calculations::PixelRect;
use super::params::Rotation;
use super::raster::RasterBuffer;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resampling filter used for crop blits and scale-downs.
///
/// Ordered from fastest to sharpest. All of them interpolate, so even the
/// fastest choice is bilinear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic (Catmull-Rom).
    #[default]
    CatmullRom,
    /// Lanczos with 3 lobes: slowest, sharpest.
    Lanczos3,
}

impl ResampleFilter {
    const fn to_image_filter(self) -> FilterType {
        match self {
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triangle => f.write_str("triangle"),
            Self::CatmullRom => f.write_str("catmull-rom"),
            Self::Lanczos3 => f.write_str("lanczos3"),
        }
    }
}

/// Rotate clockwise into display orientation.
pub fn rotate(raster: RasterBuffer, rotation: Rotation) -> RasterBuffer {
    match rotation {
        Rotation::None => raster,
        Rotation::Cw90 => raster.transform(imageops::rotate90),
        Rotation::Cw180 => raster.transform(imageops::rotate180),
        Rotation::Cw270 => raster.transform(imageops::rotate270),
    }
}

/// Stretch `source_rect` of the raster onto a fresh `width × height` raster.
///
/// One resample pass from the sub-rectangle straight to the output size;
/// no intermediate copy of the cropped pixels is made.
pub fn crop_resample(
    raster: RasterBuffer,
    source_rect: PixelRect,
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> RasterBuffer {
    raster.transform(|image| {
        let view = imageops::crop_imm(
            image,
            source_rect.x,
            source_rect.y,
            source_rect.width,
            source_rect.height,
        );
        imageops::resize(&*view, width, height, filter.to_image_filter())
    })
}

/// Scale the whole raster to `width × height`.
pub fn resize(raster: RasterBuffer, width: u32, height: u32, filter: ResampleFilter) -> RasterBuffer {
    raster.transform(|image| imageops::resize(image, width, height, filter.to_image_filter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::raster::RasterLedger;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// 4x2 raster: left half red, right half blue.
    fn split_raster(ledger: &RasterLedger) -> RasterBuffer {
        ledger.track(RgbaImage::from_fn(4, 2, |x, _| if x < 2 { RED } else { BLUE }))
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions() {
        let ledger = RasterLedger::new();
        let rotated = rotate(split_raster(&ledger), Rotation::Cw90);
        assert_eq!(rotated.dimensions(), (2, 4));
        // Clockwise: the left (red) column ends up on top.
        assert_eq!(*rotated.image().get_pixel(0, 0), RED);
        assert_eq!(*rotated.image().get_pixel(0, 3), BLUE);
        assert_eq!(ledger.live(), 1);
    }

    #[test]
    fn rotate_half_turn_keeps_dimensions() {
        let ledger = RasterLedger::new();
        let rotated = rotate(split_raster(&ledger), Rotation::Cw180);
        assert_eq!(rotated.dimensions(), (4, 2));
        assert_eq!(*rotated.image().get_pixel(0, 0), BLUE);
    }

    #[test]
    fn rotate_none_is_passthrough() {
        let ledger = RasterLedger::new();
        let raster = rotate(split_raster(&ledger), Rotation::None);
        assert_eq!(*raster.image().get_pixel(0, 0), RED);
    }

    #[test]
    fn crop_resample_takes_only_the_rect() {
        let ledger = RasterLedger::new();
        let rect = PixelRect {
            x: 2,
            y: 0,
            width: 2,
            height: 2,
        };
        let cropped = crop_resample(split_raster(&ledger), rect, 6, 6, ResampleFilter::Triangle);
        assert_eq!(cropped.dimensions(), (6, 6));
        assert!(cropped.image().pixels().all(|p| *p == BLUE));
        assert_eq!(ledger.live(), 1);
    }

    #[test]
    fn resize_to_exact_dimensions() {
        let ledger = RasterLedger::new();
        let resized = resize(split_raster(&ledger), 2, 1, ResampleFilter::Lanczos3);
        assert_eq!(resized.dimensions(), (2, 1));
    }

    #[test]
    fn filter_serde_names() {
        let filter: ResampleFilter = serde_json::from_str("\"lanczos3\"").unwrap();
        assert_eq!(filter, ResampleFilter::Lanczos3);
        assert_eq!(
            serde_json::to_string(&ResampleFilter::CatmullRom).unwrap(),
            "\"catmull-rom\""
        );
        assert_eq!(ResampleFilter::Triangle.to_string(), "triangle");
    }
}
