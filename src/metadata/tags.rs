//! The fixed allow-list of descriptive EXIF tags carried from source to output.
//!
//! Only these tags survive a sample operation. Everything else in the source
//! (thumbnails, maker notes, dimension tags that no longer match the pixels)
//! is left behind on purpose. The list is versioned with the crate; adding a
//! tag is a behaviour change.

use exif::Tag;
use std::fmt;

/// One entry of the metadata allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataTag {
    FNumber,
    ExposureTime,
    PhotographicSensitivity,
    GpsAltitude,
    GpsAltitudeRef,
    FocalLength,
    GpsDateStamp,
    WhiteBalance,
    GpsProcessingMethod,
    GpsTimeStamp,
    DateTime,
    Flash,
    GpsLatitude,
    GpsLatitudeRef,
    GpsLongitude,
    GpsLongitudeRef,
    Make,
    Model,
    /// Kept as-is on the sampling path, where pixels are scaled but never
    /// rotated, so the stored orientation still describes the output.
    Orientation,
}

impl MetadataTag {
    /// The allow-list, in copy order.
    pub const ALL: [MetadataTag; 19] = [
        Self::FNumber,
        Self::ExposureTime,
        Self::PhotographicSensitivity,
        Self::GpsAltitude,
        Self::GpsAltitudeRef,
        Self::FocalLength,
        Self::GpsDateStamp,
        Self::WhiteBalance,
        Self::GpsProcessingMethod,
        Self::GpsTimeStamp,
        Self::DateTime,
        Self::Flash,
        Self::GpsLatitude,
        Self::GpsLatitudeRef,
        Self::GpsLongitude,
        Self::GpsLongitudeRef,
        Self::Make,
        Self::Model,
        Self::Orientation,
    ];

    pub fn exif_tag(self) -> Tag {
        match self {
            Self::FNumber => Tag::FNumber,
            Self::ExposureTime => Tag::ExposureTime,
            Self::PhotographicSensitivity => Tag::PhotographicSensitivity,
            Self::GpsAltitude => Tag::GPSAltitude,
            Self::GpsAltitudeRef => Tag::GPSAltitudeRef,
            Self::FocalLength => Tag::FocalLength,
            Self::GpsDateStamp => Tag::GPSDateStamp,
            Self::WhiteBalance => Tag::WhiteBalance,
            Self::GpsProcessingMethod => Tag::GPSProcessingMethod,
            Self::GpsTimeStamp => Tag::GPSTimeStamp,
            Self::DateTime => Tag::DateTime,
            Self::Flash => Tag::Flash,
            Self::GpsLatitude => Tag::GPSLatitude,
            Self::GpsLatitudeRef => Tag::GPSLatitudeRef,
            Self::GpsLongitude => Tag::GPSLongitude,
            Self::GpsLongitudeRef => Tag::GPSLongitudeRef,
            Self::Make => Tag::Make,
            Self::Model => Tag::Model,
            Self::Orientation => Tag::Orientation,
        }
    }
}

impl fmt::Display for MetadataTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exif_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allow_list_has_no_duplicates() {
        let unique: HashSet<Tag> = MetadataTag::ALL.iter().map(|t| t.exif_tag()).collect();
        assert_eq!(unique.len(), MetadataTag::ALL.len());
    }

    #[test]
    fn allow_list_order_starts_with_exposure_and_ends_with_orientation() {
        assert_eq!(MetadataTag::ALL[0], MetadataTag::FNumber);
        assert_eq!(MetadataTag::ALL[18], MetadataTag::Orientation);
    }

    #[test]
    fn allow_list_never_carries_geometry_tags() {
        let forbidden = [
            Tag::PixelXDimension,
            Tag::PixelYDimension,
            Tag::ImageWidth,
            Tag::ImageLength,
            Tag::JPEGInterchangeFormat,
        ];
        for tag in MetadataTag::ALL {
            assert!(!forbidden.contains(&tag.exif_tag()), "{tag} must not be copied");
        }
    }

    #[test]
    fn display_uses_exif_names() {
        assert_eq!(MetadataTag::Make.to_string(), "Make");
        assert_eq!(MetadataTag::GpsLatitude.to_string(), "GPSLatitude");
    }
}
