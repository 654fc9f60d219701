//! Caller-facing image handle.
//!
//! An [`ImageHandle`] wraps one source image and the transform requested for
//! it. Transform calls chain in any order; [`ImageHandle::save`] then asks a
//! [`Materializer`] for the file and updates the handle:
//!
//! ```text
//! ImageHandle::from_url(..)          url = original
//!     .width(345).height(120)
//!     .crop_top()
//!     .save(&materializer)   ok  ──► url = variant, asset = Some(..)
//!                            err ──► url = None,    asset = None
//! ```
//!
//! A failed save never leaves the previous URL in place, so a caller cannot
//! mistake a stale URL for the requested variant.

use crate::imaging::ImageBackend;
use crate::materialize::{DerivedAsset, MaterializeError, Materializer};
use crate::storage::{AttachmentLookup, ImageReference, StorageError, UploadsMapping};
use crate::transform::TransformSpec;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ImageHandle {
    image: ImageReference,
    spec: TransformSpec,
    url: Option<String>,
    asset: Option<DerivedAsset>,
}

impl ImageHandle {
    /// Handle for the image at `url`, which must lie under the uploads base URL.
    pub fn from_url(mapping: &UploadsMapping, url: &str) -> Result<Self, StorageError> {
        mapping.reference(url).map(Self::from_reference)
    }

    /// Handle for the image registered under attachment `id`.
    pub fn from_attachment(
        mapping: &UploadsMapping,
        id: u64,
        lookup: &impl AttachmentLookup,
    ) -> Result<Self, StorageError> {
        mapping
            .reference_for_attachment(id, lookup)
            .map(Self::from_reference)
    }

    pub fn from_reference(image: ImageReference) -> Self {
        Self {
            url: Some(image.url().to_string()),
            image,
            spec: TransformSpec::new(),
            asset: None,
        }
    }

    pub fn width(self, px: i64) -> Self {
        self.map_spec(|s| s.width(px))
    }

    pub fn height(self, px: i64) -> Self {
        self.map_spec(|s| s.height(px))
    }

    pub fn crop(self) -> Self {
        self.map_spec(TransformSpec::crop)
    }

    pub fn crop_top(self) -> Self {
        self.map_spec(TransformSpec::crop_top)
    }

    pub fn crop_bottom(self) -> Self {
        self.map_spec(TransformSpec::crop_bottom)
    }

    pub fn crop_middle(self) -> Self {
        self.map_spec(TransformSpec::crop_middle)
    }

    pub fn crop_left(self) -> Self {
        self.map_spec(TransformSpec::crop_left)
    }

    pub fn crop_right(self) -> Self {
        self.map_spec(TransformSpec::crop_right)
    }

    pub fn crop_center(self) -> Self {
        self.map_spec(TransformSpec::crop_center)
    }

    pub fn cancel_crop(self) -> Self {
        self.map_spec(TransformSpec::cancel_crop)
    }

    /// Replace the whole transform request.
    pub fn with_spec(mut self, spec: TransformSpec) -> Self {
        self.spec = spec;
        self
    }

    fn map_spec(mut self, f: impl FnOnce(TransformSpec) -> TransformSpec) -> Self {
        self.spec = f(self.spec);
        self
    }

    /// Materialize the requested variant and point the handle at it.
    ///
    /// On failure the URL and asset are cleared and the error is returned.
    pub fn save<B: ImageBackend>(
        &mut self,
        materializer: &Materializer<B>,
    ) -> Result<&DerivedAsset, MaterializeError> {
        match materializer.materialize(&self.image, &self.spec) {
            Ok(asset) => {
                self.url = Some(asset.url.clone());
                Ok(&*self.asset.insert(asset))
            }
            Err(err) => {
                warn!(url = self.image.url(), error = %err, "could not save image variant");
                self.url = None;
                self.asset = None;
                Err(err)
            }
        }
    }

    /// Current URL: the original before any save, the variant after a
    /// successful one, `None` after a failed one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The file produced by the last successful save.
    pub fn asset(&self) -> Option<&DerivedAsset> {
        self.asset.as_ref()
    }

    /// Size of the file produced by the last successful save.
    pub fn saved_size(&self) -> Option<(u32, u32)> {
        self.asset.as_ref().map(|a| (a.width, a.height))
    }

    /// Crop position names, e.g. `(Some("left"), Some("top"))`.
    pub fn crop_positions(&self) -> (Option<&'static str>, Option<&'static str>) {
        (
            self.spec.crop_x().map(|a| a.horizontal_name()),
            self.spec.crop_y().map(|a| a.vertical_name()),
        )
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::materialize::MaterializeOptions;
    use crate::test_helpers::TestUploads;
    use std::collections::HashMap;

    fn setup() -> (TestUploads, Materializer<MockBackend>, String) {
        let uploads = TestUploads::new();
        let source = uploads.add_file("2017/12/wallpaper.jpg");
        let backend = MockBackend::with_dimensions(source.clone(), 1000, 500);
        let materializer = Materializer::new(
            backend,
            uploads.mapping().clone(),
            MaterializeOptions::default(),
        );
        let url = uploads.url_of(&source);
        (uploads, materializer, url)
    }

    #[test]
    fn fresh_handle_points_at_original() {
        let (uploads, _, url) = setup();
        let handle = ImageHandle::from_url(uploads.mapping(), &url).unwrap();
        assert_eq!(handle.url(), Some(url.as_str()));
        assert_eq!(handle.asset(), None);
        assert_eq!(handle.crop_positions(), (None, None));
    }

    #[test]
    fn url_is_scheme_normalized() {
        let (uploads, _, _) = setup();
        let handle =
            ImageHandle::from_url(uploads.mapping(), "//example.com/uploads/2017/12/wallpaper.jpg")
                .unwrap();
        assert_eq!(
            handle.url(),
            Some("https://example.com/uploads/2017/12/wallpaper.jpg")
        );
    }

    #[test]
    fn save_points_handle_at_variant() {
        let (uploads, materializer, url) = setup();
        let mut handle = ImageHandle::from_url(uploads.mapping(), &url)
            .unwrap()
            .width(345)
            .height(120)
            .crop_top();

        let asset = handle.save(&materializer).unwrap().clone();
        assert_eq!(handle.image().url(), url.as_str());
        assert_ne!(handle.image().path(), asset.path.as_path());

        assert_eq!(
            asset.url,
            "https://example.com/uploads/2017/12/wallpaper-ct-345x120.jpg"
        );
        assert_eq!(handle.url(), Some(asset.url.as_str()));
        assert_eq!(handle.saved_size(), Some((345, 120)));
        assert_eq!(handle.crop_positions(), (Some("center"), Some("top")));
    }

    #[test]
    fn failed_save_clears_url() {
        let (uploads, materializer, _) = setup();
        let missing = uploads.url_of(&uploads.mapping().base_dir().join("2017/12/gone.jpg"));
        let mut handle = ImageHandle::from_url(uploads.mapping(), &missing)
            .unwrap()
            .width(100);

        assert!(handle.save(&materializer).is_err());
        assert_eq!(handle.url(), None);
        assert_eq!(handle.asset(), None);
    }

    #[test]
    fn failed_save_after_success_drops_previous_variant() {
        let (uploads, materializer, url) = setup();
        let mut handle = ImageHandle::from_url(uploads.mapping(), &url)
            .unwrap()
            .width(100);
        handle.save(&materializer).unwrap();

        // No width or height left: nothing to resolve.
        let mut handle = handle.with_spec(TransformSpec::new().crop());
        assert!(matches!(
            handle.save(&materializer),
            Err(MaterializeError::InvalidSpec(_))
        ));
        assert_eq!(handle.url(), None);
        assert_eq!(handle.saved_size(), None);
    }

    #[test]
    fn chained_calls_build_the_spec() {
        let (uploads, _, url) = setup();
        let handle = ImageHandle::from_url(uploads.mapping(), &url)
            .unwrap()
            .crop_left()
            .crop_bottom()
            .height(320)
            .width(170);
        assert_eq!(
            handle.spec(),
            &TransformSpec::new()
                .width(170)
                .height(320)
                .crop_left()
                .crop_bottom()
        );
        assert_eq!(handle.crop_positions(), (Some("left"), Some("bottom")));

        let handle = handle.cancel_crop();
        assert_eq!(handle.crop_positions(), (None, None));
    }

    #[test]
    fn handle_from_attachment_id() {
        let (uploads, materializer, url) = setup();
        let attachments = HashMap::from([(42u64, url.replace("https://", "http://"))]);

        let mut handle = ImageHandle::from_attachment(uploads.mapping(), 42, &attachments)
            .unwrap()
            .width(500);
        assert_eq!(handle.url(), Some(url.as_str()));

        let asset = handle.save(&materializer).unwrap();
        assert_eq!((asset.width, asset.height), (500, 250));

        let err = ImageHandle::from_attachment(uploads.mapping(), 7, &attachments).unwrap_err();
        assert_eq!(err, StorageError::UnknownAttachment(7));
    }

    #[test]
    fn url_outside_uploads_is_rejected() {
        let (uploads, _, _) = setup();
        let result = ImageHandle::from_url(uploads.mapping(), "https://elsewhere.org/a.jpg");
        assert!(matches!(result, Err(StorageError::OutsideUploads(_))));
    }
}
