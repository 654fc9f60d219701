//! Variant filename convention.
//!
//! A variant lives next to its original and encodes the transform in its name:
//!
//! ```text
//! 2017/12/wallpaper.jpg              original
//! 2017/12/wallpaper-345x120.jpg      fit, or crop centered on both axes
//! 2017/12/wallpaper-ct-345x120.jpg   crop (center, top)
//! 2017/12/wallpaper-lt-170x320.jpg   crop (left, top)
//! ```
//!
//! The letter prefix is the first letter of the horizontal position name
//! (left/center/right) followed by the first letter of the vertical one
//! (top/center/bottom). It is only added when the two names differ, which
//! leaves centered crops and plain fits sharing the bare `{w}x{h}` suffix:
//! at equal sizes both cover the whole source with the same aspect ratio.
//!
//! The same (size, position) always gives the same name, so repeat requests
//! land on the same file.

use crate::imaging::CropAnchor;
use std::path::{Path, PathBuf};

/// Suffix encoding the variant size and crop position, e.g. `lt-345x120`.
pub fn variant_suffix(width: u32, height: u32, crop: Option<CropAnchor>) -> String {
    let mut suffix = String::new();
    if let Some(anchor) = crop {
        let (x_name, y_name) = anchor.names();
        if x_name != y_name {
            suffix.extend(x_name.chars().take(1));
            suffix.extend(y_name.chars().take(1));
            suffix.push('-');
        }
    }
    suffix.push_str(&format!("{}x{}", width, height));
    suffix
}

/// Path of the variant of `original` at the given size and crop position.
///
/// `photo.jpg` becomes `photo-{suffix}.jpg` in the same directory; a file
/// without an extension gets `-{suffix}` appended.
pub fn derive_variant_path(
    original: &Path,
    width: u32,
    height: u32,
    crop: Option<CropAnchor>,
) -> PathBuf {
    let suffix = variant_suffix(width, height, crop);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match original.extension() {
        Some(ext) => format!("{}-{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}-{}", stem, suffix),
    };
    original.with_file_name(file_name)
}
