//! EXIF-backed [`MetadataStore`].
//!
//! | Step | Crate / function |
//! |---|---|
//! | Parse (JPEG, TIFF, PNG, WebP, HEIF) | `exif::Reader::read_from_container` |
//! | Serialize TIFF structure | `exif::experimental::Writer` |
//! | Splice APP1 segment into JPEG | `img_parts::jpeg::Jpeg::set_exif` |
//! | Atomic replace | `tempfile::NamedTempFile::persist` |
//!
//! Only primary-image (IFD0 and its Exif/GPS sub-IFDs) fields are kept. The
//! thumbnail IFD is dropped on read: an embedded thumbnail of the source
//! would not match the output pixels.
//!
//! Writing is supported for JPEG files only, which is all the engine ever
//! produces.

use super::{MetadataError, MetadataStore, MetadataTag};
use exif::{Field, In, Value};
use img_parts::Bytes;
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

pub struct ExifStore {
    path: PathBuf,
    fields: Vec<Field>,
    little_endian: bool,
}

impl ExifStore {
    fn write_error(&self, reason: impl ToString) -> MetadataError {
        MetadataError::WriteFailed {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Serialize the staged fields as a bare TIFF structure (no `Exif\0\0` prefix).
    fn serialize(&self) -> Result<Vec<u8>, MetadataError> {
        let mut writer = exif::experimental::Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer
            .write(&mut buf, self.little_endian)
            .map_err(|e| self.write_error(e))?;
        Ok(buf.into_inner())
    }
}

impl MetadataStore for ExifStore {
    fn open(path: &Path) -> Result<Self, MetadataError> {
        let read_error = |reason: String| MetadataError::ReadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| read_error(e.to_string()))?;
        let mut reader = BufReader::new(file);

        match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Ok(Self {
                path: path.to_path_buf(),
                fields: exif
                    .fields()
                    .filter(|f| f.ifd_num == In::PRIMARY)
                    .filter(|f| !matches!(f.value, Value::Unknown(..)))
                    .cloned()
                    .collect(),
                little_endian: exif.little_endian(),
            }),
            Err(exif::Error::NotFound(_)) => Ok(Self {
                path: path.to_path_buf(),
                fields: Vec::new(),
                little_endian: false,
            }),
            Err(e) => Err(read_error(e.to_string())),
        }
    }

    fn get(&self, tag: MetadataTag) -> Option<Value> {
        let tag = tag.exif_tag();
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.clone())
    }

    fn set(&mut self, tag: MetadataTag, value: Value) {
        let tag = tag.exif_tag();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.value = value,
            None => self.fields.push(Field {
                tag,
                ifd_num: In::PRIMARY,
                value,
            }),
        }
    }

    fn commit(&mut self) -> Result<(), MetadataError> {
        let exif = if self.fields.is_empty() {
            None
        } else {
            Some(Bytes::from(self.serialize()?))
        };

        let original = std::fs::read(&self.path).map_err(|e| self.write_error(e))?;
        let mut jpeg = Jpeg::from_bytes(Bytes::from(original)).map_err(|e| self.write_error(e))?;
        jpeg.set_exif(exif);

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        jpeg.encoder()
            .write_to(&mut staged)
            .map_err(|e| self.write_error(e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }
}
