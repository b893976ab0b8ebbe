//! EXIF metadata carried on a decoded image.
//!
//! The decoder hands over the raw EXIF block (a TIFF structure, without the
//! JPEG `Exif\0\0` prefix). It is parsed with `kamadak-exif` for the
//! orientation tag, which can sit in two places:
//! - IFD0: the standard location, reported as `exif-ifd0-Orientation`
//! - the Exif sub-IFD: written by some cameras, reported as `exif-Orientation`
//!
//! The raw block itself is kept so encoders can re-embed it.

use image::metadata::Orientation;
use std::collections::BTreeMap;

/// Metadata key for the orientation found in IFD0.
pub const IFD0_ORIENTATION: &str = "exif-ifd0-Orientation";
/// Metadata key for the orientation found in the Exif sub-IFD.
pub const EXIF_ORIENTATION: &str = "exif-Orientation";

/// Orientation tag number (0x0112), valid in both IFD0 and the Exif sub-IFD.
const ORIENTATION_TAG: u16 = 0x0112;

/// Read orientation tags from a raw EXIF block, keyed by
/// [`IFD0_ORIENTATION`] / [`EXIF_ORIENTATION`]. Unparseable data gives an
/// empty map.
pub fn read_orientation(raw: &[u8]) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    let parsed = match exif::Reader::new().read_raw(raw.to_vec()) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::debug!("ignoring unreadable EXIF block: {}", e);
            return result;
        }
    };

    let locations = [
        (exif::Tag::Orientation, IFD0_ORIENTATION),
        (exif::Tag(exif::Context::Exif, ORIENTATION_TAG), EXIF_ORIENTATION),
    ];
    for (tag, key) in locations {
        if let Some(value) = parsed
            .get_field(tag, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
        {
            result.insert(key.to_string(), value.to_string());
        }
    }
    result
}

/// Whether `key` names one of the orientation entries.
pub fn is_orientation_key(key: &str) -> bool {
    key == IFD0_ORIENTATION || key == EXIF_ORIENTATION
}

/// Reset the IFD0 orientation inside a raw EXIF block to "no transform", so a
/// re-embedded block does not rotate already upright pixels again.
pub fn clear_orientation(raw: &mut [u8]) {
    if Orientation::remove_from_exif_chunk(raw).is_none() {
        log::debug!("no IFD0 orientation to clear in EXIF block");
    }
}
