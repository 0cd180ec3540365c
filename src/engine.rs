//! Request dispatch on an explicitly owned worker pool.
//!
//! An [`Engine`] is built once at startup from an [`ImageProcessor`] and a
//! thread count, and torn down with [`Engine::shutdown`]. Every [`Request`]
//! is an independent unit of work: it carries its own paths and produces its
//! own rasters, so any number of them can run on the pool at once.
//!
//! There is no cancellation and no timeout. A submitted request always runs
//! to completion and always reports back through its callback.

use crate::config::{EngineConfig, effective_threads};
use crate::imaging::{
    CropRegion, DisplayDimensions, ImageCodec, ImageProcessor, ImagingError, Quality,
    RasterCodec,
};
use crate::metadata::{ExifStore, MetadataStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// One operation, with its arguments.
///
/// Serialized adjacently tagged, as the bridge sends it:
/// `{"method": "cropImage", "arguments": {"path": "...", "scale": 1.0, ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "arguments",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Request {
    CropImage {
        path: PathBuf,
        scale: f64,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
    SampleImage {
        path: PathBuf,
        maximum_width: u32,
        maximum_height: u32,
    },
    GetImageOptions {
        path: PathBuf,
    },
    RequestPermissions,
}

impl Request {
    /// Every method name the engine answers.
    pub const METHODS: [&'static str; 4] = [
        "cropImage",
        "sampleImage",
        "getImageOptions",
        "requestPermissions",
    ];

    pub fn method(&self) -> &'static str {
        match self {
            Self::CropImage { .. } => Self::METHODS[0],
            Self::SampleImage { .. } => Self::METHODS[1],
            Self::GetImageOptions { .. } => Self::METHODS[2],
            Self::RequestPermissions => Self::METHODS[3],
        }
    }
}

/// Successful outcome of a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// The new output file (crop, sample).
    Path(PathBuf),
    /// Display dimensions (getImageOptions).
    Options(DisplayDimensions),
    /// Whether the scratch directory is usable (requestPermissions).
    Granted(bool),
}

pub type Outcome = Result<Reply, ImagingError>;

/// Run one request on the current thread.
pub fn dispatch<C, M>(processor: &ImageProcessor<C, M>, request: Request) -> Outcome
where
    C: RasterCodec,
    M: MetadataStore,
{
    match request {
        Request::CropImage {
            path,
            scale,
            left,
            top,
            right,
            bottom,
        } => {
            let region = CropRegion::new(left, top, right, bottom, scale)?;
            processor.crop(&path, &region).map(Reply::Path)
        }
        Request::SampleImage {
            path,
            maximum_width,
            maximum_height,
        } => processor
            .sample(&path, maximum_width, maximum_height)
            .map(Reply::Path),
        Request::GetImageOptions { path } => processor.describe(&path).map(Reply::Options),
        Request::RequestPermissions => {
            let scratch = processor.scratch();
            match scratch.check_access() {
                Ok(()) => Ok(Reply::Granted(true)),
                Err(e) => {
                    log::warn!("Scratch directory {} unusable: {e}", scratch.dir().display());
                    Ok(Reply::Granted(false))
                }
            }
        }
    }
}

/// Owns the worker pool and the processor shared by every request.
pub struct Engine<C = ImageCodec, M = ExifStore>
where
    C: RasterCodec + 'static,
    M: MetadataStore + 'static,
{
    pool: rayon::ThreadPool,
    processor: Arc<ImageProcessor<C, M>>,
}

impl Engine<ImageCodec, ExifStore> {
    /// Production engine: `image` codec, EXIF metadata, settings from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let processor = ImageProcessor::new(ImageCodec::new(), config.scratch())
            .with_quality(Quality::new(config.output.quality))
            .with_filter(config.resampling.filter);
        Self::new(processor, effective_threads(&config.processing))
    }
}

impl<C, M> Engine<C, M>
where
    C: RasterCodec + 'static,
    M: MetadataStore + 'static,
{
    pub fn new(processor: ImageProcessor<C, M>, threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("image-crop-{i}"))
            .build()?;
        log::debug!("Engine started with {} workers", pool.current_num_threads());
        Ok(Self {
            pool,
            processor: Arc::new(processor),
        })
    }

    pub fn processor(&self) -> &ImageProcessor<C, M> {
        &self.processor
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run a request on the pool and wait for it.
    pub fn run(&self, request: Request) -> Outcome {
        self.pool.install(|| dispatch(&self.processor, request))
    }

    /// Queue a request on the pool. `on_complete` runs on a worker thread
    /// with the outcome.
    pub fn submit<F>(&self, request: Request, on_complete: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let processor = Arc::clone(&self.processor);
        self.pool.spawn(move || {
            let method = request.method();
            let outcome = dispatch(&processor, request);
            if let Err(e) = &outcome {
                log::debug!("{method} failed: {e}");
            }
            on_complete(outcome);
        });
    }

    /// Rasters currently alive across all in-flight requests.
    pub fn live_rasters(&self) -> usize {
        self.processor.ledger().live()
    }

    /// Stop accepting work and release the pool. Requests already queued
    /// still run to completion on the exiting workers.
    pub fn shutdown(self) {
        log::debug!("Engine shutting down");
        drop(self.pool);
    }
}
