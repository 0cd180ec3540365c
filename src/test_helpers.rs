//! Shared test utilities for the image-crop test suite.
//!
//! Fixtures are generated on the fly into temp directories, so tests never
//! depend on checked-in binaries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("portrait.jpg");
//! create_oriented_jpeg(&path, 400, 300, 6);
//! ```

use crate::metadata::{ExifStore, MetadataStore, MetadataTag};
use image::{Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Fixture images
// =========================================================================

/// Left half red, right half blue. Survives JPEG compression well enough
/// to tell which way an image was turned.
pub fn split_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([220, 20, 20])
        } else {
            Rgb([20, 20, 220])
        }
    })
}

/// Write a JPEG with no metadata.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    split_image(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

/// Write a PNG with no metadata.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    split_image(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a JPEG whose stored pixels are `width × height` and whose EXIF
/// `Orientation` tag is `orientation`.
pub fn create_oriented_jpeg(path: &Path, width: u32, height: u32, orientation: u16) {
    create_test_jpeg(path, width, height);
    let mut store = ExifStore::open(path).unwrap();
    store.set(
        MetadataTag::Orientation,
        exif::Value::Short(vec![orientation]),
    );
    store.commit().unwrap();
}

// =========================================================================
// Pixel assertions
// =========================================================================

/// Whether a pixel is closer to red than to blue.
pub fn is_reddish(pixel: &image::Rgba<u8>) -> bool {
    pixel[0] > pixel[2]
}
