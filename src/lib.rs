//! # image-crop
//!
//! Crop and downsample images on the device that holds them, keeping the
//! descriptive EXIF metadata that still applies to the result.
//!
//! # Architecture: One Engine, Two Surfaces
//!
//! Every operation runs through an [`engine::Engine`], which owns a worker
//! pool and an [`imaging::ImageProcessor`]. Two thin surfaces sit on top:
//!
//! ```text
//! image-crop crop|sample|options   →  Engine::run      (one call, wait)
//! image-crop serve (JSON lines)    →  Engine::submit   (many calls, concurrent)
//! ```
//!
//! Inside the processor each call goes through the same stages:
//!
//! ```text
//! read descriptor  →  orient  →  crop | subsample + resize  →  encode  →  copy tags
//! (bounds + EXIF)     (display)                                 (JPEG)     (sample only)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry calculations, codec trait, raster ownership, pixel transforms, [`imaging::ImageProcessor`] |
//! | [`metadata`] | EXIF orientation lookup and allow-list tag copying behind the `MetadataStore` trait |
//! | [`engine`] | `Request` dispatch on an explicitly owned rayon pool |
//! | [`bridge`] | JSON-lines transport for host applications |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`scratch`] | Output file placement and naming |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Geometry in Display Space
//!
//! Crop regions are fractions of the image *as displayed*, after EXIF
//! orientation. The crop path therefore rotates decoded pixels into display
//! space before cutting, and its output carries no orientation tag. The
//! sample path never rotates pixels, so it keeps the source orientation tag
//! along with the rest of the allow-list.
//!
//! ## Memory Proportional to the Target
//!
//! Sampling picks a power-of-two decode reduction from the stored bounds
//! before any pixels exist, so a 48 MP source sampled to a thumbnail never
//! keeps a full-resolution raster around longer than the decode itself.
//!
//! ## Metadata Is Best-Effort
//!
//! A metadata failure is logged and never fails the operation. The encoded
//! output is valid with or without the copied tags.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod scratch;

#[cfg(test)]
pub(crate) mod test_helpers;
