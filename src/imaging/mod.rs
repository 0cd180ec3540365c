//! Image processing: pure Rust, no system image libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Bounds probe** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` crate decoders; `jpeg_decoder` reduced IDCT for subsampled JPEG |
//! | **Rotate** | `image::imageops::rotate90/180/270` |
//! | **Crop / resize** | `image::imageops::resize` (Catmull-Rom by default) |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for orientation and output geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Codec**: [`RasterCodec`] trait + [`ImageCodec`]
//! - **Raster**: [`RasterBuffer`] ownership and the [`RasterLedger`] live count
//! - **Transform**: Pixel transforms between decode and encode
//! - **Operations**: [`ImageProcessor`], combining calculations + codec + metadata

mod calculations;
pub mod codec;
pub mod image_codec;
pub mod operations;
mod params;
pub mod raster;
pub mod transform;

pub use calculations::{
    MAX_OUTPUT_PIXELS, PixelRect, calculate_crop_dimensions, calculate_sample_resize, calculate_source_rect,
    calculate_subsample_factor, display_dimensions, needs_pixel_rotation, subsampled_dimensions,
};
pub use codec::{CodecError, Dimensions, RasterCodec};
pub use image_codec::ImageCodec;
pub use operations::{ImageProcessor, ImagingError, Unreadable};
pub use params::{
    CropRegion, DisplayDimensions, ImageDescriptor, Quality, RegionError, Rotation, SampleBounds,
};
pub use raster::{RasterBuffer, RasterLedger};
pub use transform::ResampleFilter;
