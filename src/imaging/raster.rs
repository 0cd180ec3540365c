//! Owned pixel buffers with live-buffer accounting.
//!
//! Every raster that passes between pipeline stages is a [`RasterBuffer`]:
//! an RGBA8 image plus a handle on the [`RasterLedger`] that created it.
//! Transform stages consume their input buffer and hand back a new one, so
//! exactly one stage owns a raster at any moment and the previous buffer is
//! released as soon as the next one exists.
//!
//! The ledger counts buffers that are still alive. It never affects
//! behaviour; it exists so callers (and tests) can check that no raster
//! survives an operation, whichever path the operation took.

use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counter of live [`RasterBuffer`]s.
///
/// Cloning is cheap and every clone observes the same count.
#[derive(Debug, Clone, Default)]
pub struct RasterLedger {
    live: Arc<AtomicUsize>,
}

impl RasterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a decoded or freshly produced image.
    pub fn track(&self, image: RgbaImage) -> RasterBuffer {
        self.live.fetch_add(1, Ordering::SeqCst);
        RasterBuffer {
            image,
            ledger: self.clone(),
        }
    }

    /// Number of buffers created through this ledger that have not been dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// An exclusively owned RGBA8 raster.
#[derive(Debug)]
pub struct RasterBuffer {
    image: RgbaImage,
    ledger: RasterLedger,
}

impl RasterBuffer {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Produce the next stage's buffer from this one, releasing this one.
    ///
    /// The new buffer is registered before the old one is dropped, so the
    /// ledger briefly counts both, matching the real peak memory.
    pub fn transform(self, f: impl FnOnce(&RgbaImage) -> RgbaImage) -> RasterBuffer {
        let next = f(&self.image);
        self.ledger.track(next)
    }
}

impl Drop for RasterBuffer {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::SeqCst);
    }
}
