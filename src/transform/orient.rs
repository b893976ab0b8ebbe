//! Auto-orientation from the EXIF orientation tag.
//!
//! Only the pure rotations (1, 3, 6, 8) are supported; mirrored orientations
//! are rejected.

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::metadata::{EXIF_ORIENTATION, IFD0_ORIENTATION};
use crate::imaging::{ImageBackend, Operation, Rotation};

/// Rotation for an EXIF orientation value, `None` for upright.
fn rotation_for(orientation: &str) -> Result<Option<Rotation>> {
    // Backends may append a description, e.g. "6 (Rotate 90 CW)"
    let code = orientation.split_whitespace().next().unwrap_or("");
    match code {
        "1" => Ok(None),
        "3" => Ok(Some(Rotation::Rotate180)),
        "6" => Ok(Some(Rotation::Rotate270)),
        "8" => Ok(Some(Rotation::Rotate90)),
        _ => Err(ProcessError::InvalidOrientation(orientation.to_string())),
    }
}

impl<B: ImageBackend> ImageHandle<B> {
    /// Bake the EXIF orientation into the pixels.
    ///
    /// The Exif sub-IFD tag is preferred over the IFD0 one. A missing tag
    /// counts as upright. Both tags are removed afterwards so the rotation
    /// is not applied a second time by a viewer.
    pub fn auto_orient(&mut self) -> Result<&mut Self> {
        self.manipulate(|backend, image| {
            let orientation = backend
                .metadata(&image, EXIF_ORIENTATION)
                .or_else(|| backend.metadata(&image, IFD0_ORIENTATION))
                .unwrap_or_else(|| "1".to_string());

            let mut ops = Vec::with_capacity(3);
            if let Some(rotation) = rotation_for(&orientation)? {
                ops.push(Operation::Rotate(rotation));
            }
            ops.push(Operation::RemoveMetadata(EXIF_ORIENTATION.to_string()));
            ops.push(Operation::RemoveMetadata(IFD0_ORIENTATION.to_string()));
            super::run_operations(backend, image, &ops)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn rotations(handle: &ImageHandle<MockBackend>) -> Vec<Rotation> {
        handle
            .backend()
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Apply(Operation::Rotate(r)) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn maps_known_orientations() {
        assert_eq!(rotation_for("1").unwrap(), None);
        assert_eq!(rotation_for("3").unwrap(), Some(Rotation::Rotate180));
        assert_eq!(rotation_for("6").unwrap(), Some(Rotation::Rotate270));
        assert_eq!(rotation_for("8 (Rotate 270 CW)").unwrap(), Some(Rotation::Rotate90));
    }

    #[test]
    fn rejects_other_orientations() {
        for value in ["2", "5", "7", "", "up"] {
            let err = rotation_for(value).unwrap_err();
            assert!(matches!(err, ProcessError::InvalidOrientation(ref v) if v == value));
        }
    }

    #[test]
    fn missing_tag_is_upright_and_clears_tags() {
        let mut h = ImageHandle::new(MockBackend::new(40, 30), "a.jpg");
        h.auto_orient().unwrap();

        assert!(rotations(&h).is_empty());
        assert_eq!(h.dimensions(), Some(Dimensions::new(40, 30)));
        let history = &h.current().unwrap().history;
        assert_eq!(
            history,
            &vec![
                Operation::RemoveMetadata(EXIF_ORIENTATION.into()),
                Operation::RemoveMetadata(IFD0_ORIENTATION.into()),
            ]
        );
    }

    #[test]
    fn ifd0_tag_rotates_and_is_removed() {
        let backend = MockBackend::new(40, 30).with_metadata(IFD0_ORIENTATION, "6");
        let mut h = ImageHandle::new(backend, "a.jpg");
        h.auto_orient().unwrap();

        assert_eq!(rotations(&h), vec![Rotation::Rotate270]);
        assert_eq!(h.dimensions(), Some(Dimensions::new(30, 40)));
        assert!(h.current().unwrap().metadata.is_empty());
    }

    #[test]
    fn exif_tag_wins_over_ifd0() {
        let backend = MockBackend::new(40, 30)
            .with_metadata(EXIF_ORIENTATION, "3")
            .with_metadata(IFD0_ORIENTATION, "6");
        let mut h = ImageHandle::new(backend, "a.jpg");
        h.auto_orient().unwrap();

        assert_eq!(rotations(&h), vec![Rotation::Rotate180]);
    }

    #[test]
    fn invalid_orientation_fails() {
        let backend = MockBackend::new(40, 30).with_metadata(IFD0_ORIENTATION, "4");
        let mut h = ImageHandle::new(backend, "a.jpg");
        let err = h.auto_orient().unwrap_err();

        assert_eq!(err.to_string(), "Invalid value for Orientation: 4");
        assert!(!h.is_loaded());
    }

    #[test]
    fn second_call_is_a_noop_rotation() {
        let backend = MockBackend::new(40, 30).with_metadata(IFD0_ORIENTATION, "8");
        let mut h = ImageHandle::new(backend, "a.jpg");
        h.auto_orient().unwrap().auto_orient().unwrap();

        assert_eq!(rotations(&h), vec![Rotation::Rotate90]);
    }
}
