//! Turning a transform request into a file on disk.
//!
//! [`Materializer::materialize`] runs the whole request:
//!
//! ```text
//! ImageReference ──► exists? ──► identify ──► resolve ──┬─ skip ──► original
//!                                                       └─ variant path
//!                                                            │
//!                                  reuse existing? ◄─────────┤
//!                                                            ▼
//!                                     backend.resize → temp file → rename
//! ```
//!
//! ## Concurrent writers
//!
//! Variant names are deterministic, so two requests for the same variant
//! target the same path. The backend always writes into a fresh temp file in
//! the destination directory which is then renamed over the final path.
//! Renames within a directory are atomic, so readers see either no file or a
//! complete one, and duplicate writers simply replace one finished file with
//! an identical one. A failed encode deletes its temp file and leaves the
//! destination untouched.
//!
//! ## Reuse
//!
//! By default every request re-encodes its variant. With
//! [`MaterializeOptions::reuse_existing`] an existing variant is returned as
//! is, provided the backend can identify it and its size matches.

use crate::config::Config;
use crate::imaging::{BackendError, ImageBackend, Quality, ResizeParams, ResolveError};
use crate::naming::derive_variant_path;
use crate::storage::{ImageReference, StorageError, UploadsMapping};
use crate::transform::TransformSpec;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error(transparent)]
    InvalidSpec(#[from] ResolveError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Image processing failed: {0}")]
    Codec(#[from] BackendError),
    #[error("Cannot resolve image reference: {0}")]
    Reference(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The file answering a request: either a variant or the original itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAsset {
    pub path: PathBuf,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterializeOptions {
    pub quality: Quality,
    /// Return an existing variant file instead of re-encoding it.
    pub reuse_existing: bool,
}

pub struct Materializer<B: ImageBackend> {
    backend: B,
    mapping: UploadsMapping,
    options: MaterializeOptions,
}

impl<B: ImageBackend> Materializer<B> {
    pub fn new(backend: B, mapping: UploadsMapping, options: MaterializeOptions) -> Self {
        Self {
            backend,
            mapping,
            options,
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, config.uploads_mapping(), config.materialize_options())
    }

    pub fn mapping(&self) -> &UploadsMapping {
        &self.mapping
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> MaterializeOptions {
        self.options
    }

    /// Produce (or find) the file for `spec` applied to `image`.
    pub fn materialize(
        &self,
        image: &ImageReference,
        spec: &TransformSpec,
    ) -> Result<DerivedAsset, MaterializeError> {
        let source = image.path();
        if !source.is_file() {
            return Err(MaterializeError::SourceNotFound(source.to_path_buf()));
        }

        let original = self.backend.identify(source)?;
        let resolved = spec.resolve(original)?;

        if resolved.skip {
            debug!(source = %source.display(), "original already matches, skipping");
            return Ok(DerivedAsset {
                path: source.to_path_buf(),
                url: image.url().to_string(),
                width: original.width,
                height: original.height,
            });
        }

        let (width, height) = (resolved.dest_width, resolved.dest_height);
        let dest = derive_variant_path(source, width, height, spec.crop_anchor());
        let asset = DerivedAsset {
            url: self.mapping.path_to_url(&dest)?,
            path: dest,
            width,
            height,
        };

        if self.options.reuse_existing && self.is_reusable(&asset) {
            debug!(variant = %asset.path.display(), "reusing existing variant");
            return Ok(asset);
        }

        self.write_atomically(source, &asset.path, |tmp| {
            self.backend.resize(&ResizeParams {
                source: source.to_path_buf(),
                output: tmp.to_path_buf(),
                crop: resolved.source_crop,
                width,
                height,
                quality: self.options.quality,
            })
        })?;
        debug!(variant = %asset.path.display(), width, height, "wrote variant");

        Ok(asset)
    }

    /// Materialize many requests in parallel on the rayon pool.
    ///
    /// Results come back in request order; one failure does not stop the others.
    pub fn materialize_all(
        &self,
        requests: &[(ImageReference, TransformSpec)],
    ) -> Vec<Result<DerivedAsset, MaterializeError>> {
        requests
            .par_iter()
            .map(|(image, spec)| self.materialize(image, spec))
            .collect()
    }

    fn is_reusable(&self, asset: &DerivedAsset) -> bool {
        asset.path.is_file()
            && self
                .backend
                .identify(&asset.path)
                .is_ok_and(|dims| dims.width == asset.width && dims.height == asset.height)
    }

    /// Run `write` against a temp path next to `dest`, then rename it into place.
    ///
    /// The temp file is created owner-only; it takes the permissions of
    /// `source` before the rename so the variant is readable by whoever can
    /// read the original.
    fn write_atomically(
        &self,
        source: &Path,
        dest: &Path,
        write: impl FnOnce(&Path) -> Result<(), BackendError>,
    ) -> Result<(), MaterializeError> {
        let dir = dest.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no parent directory for {}", dest.display()),
            )
        })?;
        let suffix = dest
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let tmp = tempfile::Builder::new()
            .prefix(".variant-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        write(tmp.path())?;
        fs::set_permissions(tmp.path(), fs::metadata(source)?.permissions())?;
        tmp.persist(dest).map_err(|e| MaterializeError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::CropRect;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::scheme::Scheme;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        source: PathBuf,
        materializer: Materializer<MockBackend>,
    }

    /// A 1000x500 "image" at `<uploads>/2017/12/wallpaper.jpg`.
    fn fixture(options: MaterializeOptions, backend: MockBackend) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let uploads = tmp.path().join("uploads");
        let source = uploads.join("2017/12/wallpaper.jpg");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"jpeg").unwrap();
        backend.set_dimensions(source.clone(), 1000, 500);

        let mapping = UploadsMapping::new(&uploads, "https://example.com/uploads", Scheme::Https);
        Fixture {
            _tmp: tmp,
            source,
            materializer: Materializer::new(backend, mapping, options),
        }
    }

    fn reference(f: &Fixture) -> ImageReference {
        f.materializer
            .mapping()
            .reference("https://example.com/uploads/2017/12/wallpaper.jpg")
            .unwrap()
    }

    #[test]
    fn writes_cropped_variant_next_to_original() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let spec = TransformSpec::new().width(345).height(120).crop_top();

        let asset = f.materializer.materialize(&reference(&f), &spec).unwrap();

        let expected = f.source.with_file_name("wallpaper-ct-345x120.jpg");
        assert_eq!(asset.path, expected);
        assert_eq!(
            asset.url,
            "https://example.com/uploads/2017/12/wallpaper-ct-345x120.jpg"
        );
        assert_eq!((asset.width, asset.height), (345, 120));
        assert!(expected.is_file());

        let resize = f
            .materializer
            .backend()
            .get_operations()
            .into_iter()
            .find(|op| matches!(op, RecordedOp::Resize { .. }))
            .unwrap();
        assert!(matches!(
            resize,
            RecordedOp::Resize {
                crop: Some(CropRect { x: 0, y: 0, width: 1000, height: 348 }),
                width: 345,
                height: 120,
                quality: 90,
                ..
            }
        ));
    }

    #[test]
    fn backend_writes_to_temp_path_not_destination() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let spec = TransformSpec::new().width(400);

        let asset = f.materializer.materialize(&reference(&f), &spec).unwrap();

        let ops = f.materializer.backend().get_operations();
        let output = ops
            .iter()
            .find_map(|op| match op {
                RecordedOp::Resize { output, .. } => Some(output.clone()),
                _ => None,
            })
            .unwrap();
        assert_ne!(Path::new(&output), asset.path);
        assert!(output.ends_with(".jpg"));
        assert!(!Path::new(&output).exists());
    }

    #[test]
    fn skip_returns_original() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let spec = TransformSpec::new().width(1000);

        let asset = f.materializer.materialize(&reference(&f), &spec).unwrap();

        assert_eq!(asset.path, f.source);
        assert_eq!(asset.url, "https://example.com/uploads/2017/12/wallpaper.jpg");
        assert_eq!((asset.width, asset.height), (1000, 500));
        assert_eq!(f.materializer.backend().resize_count(), 0);
    }

    #[test]
    fn missing_source_is_reported_and_nothing_written() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let missing = f
            .materializer
            .mapping()
            .reference("https://example.com/uploads/2017/12/gone.jpg")
            .unwrap();

        let err = f
            .materializer
            .materialize(&missing, &TransformSpec::new().width(10))
            .unwrap_err();

        assert!(matches!(err, MaterializeError::SourceNotFound(_)));
        assert!(f.materializer.backend().get_operations().is_empty());
        let entries = std::fs::read_dir(f.source.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn spec_without_size_is_invalid() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let err = f
            .materializer
            .materialize(&reference(&f), &TransformSpec::new().crop())
            .unwrap_err();
        assert!(matches!(err, MaterializeError::InvalidSpec(_)));
    }

    #[test]
    fn codec_failure_leaves_no_file() {
        let f = fixture(MaterializeOptions::default(), MockBackend::failing());
        let spec = TransformSpec::new().width(300).height(300).crop();

        let err = f.materializer.materialize(&reference(&f), &spec).unwrap_err();

        assert!(matches!(err, MaterializeError::Codec(_)));
        let names: Vec<_> = std::fs::read_dir(f.source.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("wallpaper.jpg")]);
    }

    #[test]
    fn destination_without_parent_is_io_not_found() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let err = f
            .materializer
            .write_atomically(&f.source, Path::new("/"), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, MaterializeError::Io(e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn repeat_requests_are_identical() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let spec = TransformSpec::new().width(170).height(320).crop_left();

        let first = f.materializer.materialize(&reference(&f), &spec).unwrap();
        let second = f.materializer.materialize(&reference(&f), &spec).unwrap();

        assert_eq!(first, second);
        assert_eq!(f.materializer.backend().resize_count(), 2);
    }

    #[test]
    fn reuse_skips_encoding_when_variant_exists() {
        let options = MaterializeOptions {
            reuse_existing: true,
            ..MaterializeOptions::default()
        };
        let f = fixture(options, MockBackend::new());
        let spec = TransformSpec::new().width(170).height(320).crop_left();

        let first = f.materializer.materialize(&reference(&f), &spec).unwrap();
        let second = f.materializer.materialize(&reference(&f), &spec).unwrap();

        assert_eq!(first, second);
        assert_eq!(f.materializer.backend().resize_count(), 1);
    }

    #[test]
    fn reuse_rejects_variant_with_wrong_size() {
        let options = MaterializeOptions {
            reuse_existing: true,
            ..MaterializeOptions::default()
        };
        let f = fixture(options, MockBackend::new());
        let stale = f.source.with_file_name("wallpaper-400x200.jpg");
        std::fs::write(&stale, b"old").unwrap();
        f.materializer.backend().set_dimensions(stale, 399, 200);

        f.materializer
            .materialize(&reference(&f), &TransformSpec::new().width(400))
            .unwrap();

        assert_eq!(f.materializer.backend().resize_count(), 1);
    }

    #[test]
    fn batch_keeps_request_order() {
        let f = fixture(MaterializeOptions::default(), MockBackend::new());
        let image = reference(&f);
        let requests = vec![
            (image.clone(), TransformSpec::new().width(100)),
            (image.clone(), TransformSpec::new()),
            (image, TransformSpec::new().height(50).crop_bottom()),
        ];

        let results = f.materializer.materialize_all(&requests);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().width, 100);
        assert!(matches!(results[1], Err(MaterializeError::InvalidSpec(_))));
        assert!(
            results[2]
                .as_ref()
                .unwrap()
                .path
                .ends_with("wallpaper-cb-100x50.jpg")
        );
    }
}
