//! Image metadata: orientation lookup and allow-list tag preservation.
//!
//! The engine touches metadata in exactly two places:
//!
//! - **Reading orientation** ([`read_rotation`]) — every operation needs the
//!   stored rotation to know which way is up. Unreadable or missing
//!   metadata is not an error: the image is treated as unrotated and a
//!   warning is logged.
//!
//! - **Copying tags** ([`copy_tags`], [`preserve_metadata`]) — the sampling
//!   path carries the [`MetadataTag::ALL`] allow-list from the source onto
//!   the freshly encoded output. The crop path does not: its output lives in
//!   a rotated, re-framed pixel space that the source tags no longer describe.
//!
//! Metadata is best-effort throughout. A failure here never fails the
//! operation that asked for it; the encoded output is valid on its own.
//!
//! Storage is behind the [`MetadataStore`] trait so operations can be tested
//! against an in-memory store. The production store is [`ExifStore`].

mod exif_store;
mod tags;

pub use exif_store::ExifStore;
pub use tags::MetadataTag;

use crate::imaging::Rotation;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata from {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },
    #[error("Failed to write metadata to {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },
}

/// An attribute store attached to one image file.
///
/// Values are kept in their EXIF representation so a copy is bit-for-bit
/// verbatim, whatever the tag's type. `set` only stages a change; nothing
/// reaches the file until `commit`, which writes all staged changes at once.
pub trait MetadataStore: Sized {
    /// Attach to the file at `path`. A file without any metadata yields an
    /// empty store, not an error.
    fn open(path: &Path) -> Result<Self, MetadataError>;

    fn get(&self, tag: MetadataTag) -> Option<exif::Value>;

    fn set(&mut self, tag: MetadataTag, value: exif::Value);

    /// Persist every staged change in a single write.
    fn commit(&mut self) -> Result<(), MetadataError>;
}

/// Read the stored rotation of an image.
///
/// Falls back to [`Rotation::None`] when the metadata cannot be read or has
/// no usable orientation.
pub fn read_rotation<M: MetadataStore>(path: &Path) -> Rotation {
    let store = match M::open(path) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("Orientation unavailable, assuming upright: {e}");
            return Rotation::None;
        }
    };

    store
        .get(MetadataTag::Orientation)
        .and_then(|value| value.get_uint(0))
        .map(Rotation::from_exif_orientation)
        .unwrap_or_default()
}

/// Copy every allow-listed tag present on `source` onto `dest`, then commit
/// `dest` once.
///
/// Tags absent on the source leave whatever `dest` already holds untouched.
/// Returns the number of tags copied.
pub fn copy_tags<S, D>(source: &S, dest: &mut D) -> Result<usize, MetadataError>
where
    S: MetadataStore,
    D: MetadataStore,
{
    let mut copied = 0;
    for tag in MetadataTag::ALL {
        if let Some(value) = source.get(tag) {
            dest.set(tag, value);
            copied += 1;
        }
    }
    dest.commit()?;
    Ok(copied)
}

/// Open both files and copy the allow-list from `source` to `dest`.
pub fn copy_metadata<M: MetadataStore>(
    source: &Path,
    dest: &Path,
) -> Result<usize, MetadataError> {
    let source_store = M::open(source)?;
    let mut dest_store = M::open(dest)?;
    copy_tags(&source_store, &mut dest_store)
}

/// [`copy_metadata`], with any failure logged and swallowed.
pub fn preserve_metadata<M: MetadataStore>(source: &Path, dest: &Path) {
    match copy_metadata::<M>(source, dest) {
        Ok(copied) => log::debug!(
            "Preserved {copied} metadata tags from {} on {}",
            source.display(),
            dest.display()
        ),
        Err(e) => log::warn!("Failed to preserve metadata: {e}"),
    }
}
