//! Shared test utilities.
//!
//! Synthetic images for backend tests and a throwaway uploads directory for
//! anything that goes through an [`UploadsMapping`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let uploads = TestUploads::new();
//! let source = uploads.add_file("2017/12/wallpaper.jpg");
//! let image = uploads.mapping().reference(&uploads.url_of(&source)).unwrap();
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::scheme::Scheme;
use crate::storage::UploadsMapping;

pub const TEST_BASE_URL: &str = "https://example.com/uploads";

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a `width` x `height` gradient JPEG to `path`.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a `width` x `height` gradient PNG to `path`.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Uploads directory
// =========================================================================

/// An uploads directory in a temp dir, served at [`TEST_BASE_URL`].
pub struct TestUploads {
    _tmp: TempDir,
    mapping: UploadsMapping,
}

impl TestUploads {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let mapping = UploadsMapping::new(tmp.path().join("uploads"), TEST_BASE_URL, Scheme::Https);
        std::fs::create_dir_all(mapping.base_dir()).unwrap();
        Self { _tmp: tmp, mapping }
    }

    pub fn mapping(&self) -> &UploadsMapping {
        &self.mapping
    }

    /// Create a placeholder file (not a decodable image) at `relative`.
    pub fn add_file(&self, relative: &str) -> PathBuf {
        let path = self.prepare(relative);
        std::fs::write(&path, b"placeholder").unwrap();
        path
    }

    pub fn url_of(&self, path: &Path) -> String {
        self.mapping.path_to_url(path).unwrap()
    }

    fn prepare(&self, relative: &str) -> PathBuf {
        let path = self.mapping.base_dir().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        path
    }
}
