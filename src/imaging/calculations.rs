//! Pure calculation functions for variant geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Given the original size, the requested width and/or height and an optional
//! crop anchor, [`resolve`] works out the window to cut from the source, the
//! size of the variant, and whether the original can be served unchanged.
//!
//! Degenerate input never errors: zero original dimensions are treated as 1,
//! and every computed dimension is at least 1 and at most the source size.

use super::params::{CropAnchor, CropRect};
use thiserror::Error;

/// Two sizes closer than this (per axis) are considered the same image.
pub const SIZE_TOLERANCE: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid transform: neither a target width nor a target height was given")]
    InvalidSpec,
}

/// Output of [`resolve`].
///
/// When `skip` is set the original file is already the answer: the
/// destination equals the original size and there is no crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTransform {
    pub source_crop: Option<CropRect>,
    pub dest_width: u32,
    pub dest_height: u32,
    pub skip: bool,
}

/// The three "request already matches the original" conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExactMatch {
    /// Height unset and the target width equals the original width.
    pub width_only: bool,
    /// Width unset and the target height equals the original height.
    pub height_only: bool,
    /// Both set and both equal the original.
    pub both: bool,
}

impl ExactMatch {
    pub fn evaluate(original: (u32, u32), target_w: Option<u32>, target_h: Option<u32>) -> Self {
        let (orig_w, orig_h) = original;
        Self {
            width_only: target_h.is_none() && target_w == Some(orig_w),
            height_only: target_w.is_none() && target_h == Some(orig_h),
            both: target_w == Some(orig_w) && target_h == Some(orig_h),
        }
    }

    /// Exclusive-or of the three conditions, in order.
    ///
    /// Not an OR: when two conditions hold at once the answer is "process".
    pub fn skip(self) -> bool {
        (self.width_only ^ self.height_only) ^ self.both
    }
}

fn round_dim(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Scale `current` to fit inside the given bounds, preserving aspect ratio.
///
/// Unset bounds are unconstrained. The result is never larger than
/// `current`. A dimension that lands one pixel short of the bound it was
/// scaled against is snapped up to the bound.
pub fn constrain_dimensions(
    current: (u32, u32),
    max_w: Option<u32>,
    max_h: Option<u32>,
) -> (u32, u32) {
    let (cur_w, cur_h) = current;
    let max_w = max_w.unwrap_or(0);
    let max_h = max_h.unwrap_or(0);
    if max_w == 0 && max_h == 0 {
        return current;
    }

    let did_width = max_w > 0 && cur_w > max_w;
    let did_height = max_h > 0 && cur_h > max_h;
    let width_ratio = if did_width {
        max_w as f64 / cur_w as f64
    } else {
        1.0
    };
    let height_ratio = if did_height {
        max_h as f64 / cur_h as f64
    } else {
        1.0
    };

    let smaller = width_ratio.min(height_ratio);
    let larger = width_ratio.max(height_ratio);
    let overflows = max_w == 0
        || max_h == 0
        || (cur_w as f64 * larger).round() as u32 > max_w
        || (cur_h as f64 * larger).round() as u32 > max_h;
    let ratio = if overflows { smaller } else { larger };

    let mut w = round_dim(cur_w as f64 * ratio);
    let mut h = round_dim(cur_h as f64 * ratio);
    if did_width && w + 1 == max_w {
        w = max_w;
    }
    if did_height && h + 1 == max_h {
        h = max_h;
    }
    (w, h)
}

/// Destination size when cropping.
///
/// Each given target is capped at the original; a missing target is derived
/// from the original aspect ratio. Without any target the original is returned.
pub fn cover_dimensions(
    original: (u32, u32),
    target_w: Option<u32>,
    target_h: Option<u32>,
) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let aspect = orig_w as f64 / orig_h as f64;
    let new_w = target_w.map(|w| w.min(orig_w));
    let new_h = target_h.map(|h| h.min(orig_h));

    match (new_w, new_h) {
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        (Some(w), None) => (w.max(1), round_dim(w as f64 / aspect).min(orig_h)),
        (None, Some(h)) => (round_dim(h as f64 * aspect).min(orig_w), h.max(1)),
        (None, None) => original,
    }
}

/// Largest window of the destination's aspect ratio that fits in the source.
///
/// Scaling this window down to `dest` covers the destination exactly; the
/// rest of the source is discarded on at most one axis.
pub fn crop_window(original: (u32, u32), dest: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (dest_w, dest_h) = dest;
    let size_ratio = (dest_w as f64 / orig_w as f64).max(dest_h as f64 / orig_h as f64);
    (
        round_dim(dest_w as f64 / size_ratio).min(orig_w),
        round_dim(dest_h as f64 / size_ratio).min(orig_h),
    )
}

/// Resolve a transform request against the original image size.
///
/// Zero targets count as unset. With a crop anchor the variant covers the
/// target box and the overflow is cut according to the anchor; without one
/// the image is scaled to fit inside the box. Neither mode upscales.
pub fn resolve(
    original: (u32, u32),
    target_w: Option<u32>,
    target_h: Option<u32>,
    crop: Option<CropAnchor>,
) -> Result<ResolvedTransform, ResolveError> {
    let original = (original.0.max(1), original.1.max(1));
    let (orig_w, orig_h) = original;
    let target_w = target_w.filter(|&w| w > 0);
    let target_h = target_h.filter(|&h| h > 0);
    if target_w.is_none() && target_h.is_none() {
        return Err(ResolveError::InvalidSpec);
    }

    let ((dest_w, dest_h), source_crop) = match crop {
        Some(anchor) => {
            let dest = cover_dimensions(original, target_w, target_h);
            let (crop_w, crop_h) = crop_window(original, dest);
            let rect = CropRect {
                x: anchor.x.offset(orig_w, crop_w),
                y: anchor.y.offset(orig_h, crop_h),
                width: crop_w,
                height: crop_h,
            };
            (dest, Some(rect))
        }
        None => (constrain_dimensions(original, target_w, target_h), None),
    };

    let identity =
        dest_w.abs_diff(orig_w) <= SIZE_TOLERANCE && dest_h.abs_diff(orig_h) <= SIZE_TOLERANCE;
    let skip = identity || ExactMatch::evaluate(original, target_w, target_h).skip();

    if skip {
        return Ok(ResolvedTransform {
            source_crop: None,
            dest_width: orig_w,
            dest_height: orig_h,
            skip: true,
        });
    }

    Ok(ResolvedTransform {
        source_crop,
        dest_width: dest_w,
        dest_height: dest_h,
        skip: false,
    })
}
