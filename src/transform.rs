//! Fluent description of a variant request.
//!
//! A [`TransformSpec`] collects the target width/height and crop position
//! through chained calls, in any order:
//!
//! ```
//! use cropvariant::transform::TransformSpec;
//! use cropvariant::imaging::Anchor;
//!
//! let spec = TransformSpec::new().width(345).height(120).crop_top();
//! assert_eq!(spec.crop_x(), Some(Anchor::Center));
//! assert_eq!(spec.crop_y(), Some(Anchor::Start));
//! ```
//!
//! ## Crop auto-fill
//!
//! Cropping always has a position on both axes. Setting one axis fills the
//! other with `Center` if it is still unset; a later explicit call on that
//! axis overwrites the filled value. So `crop_top()` alone means
//! (center, top) and `crop_top().crop_left()` means (left, top).
//!
//! ## Lenient sizes
//!
//! `width`/`height` ignore zero, negative and out-of-range values: the axis
//! simply stays unset. Requests assembled from user input therefore never
//! fail at configuration time; a spec with no usable size is rejected later,
//! when it is resolved.

use crate::imaging::calculations::{self, ResolveError, ResolvedTransform};
use crate::imaging::{Anchor, CropAnchor, Dimensions};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformSpec {
    width: Option<u32>,
    height: Option<u32>,
    crop_x: Option<Anchor>,
    crop_y: Option<Anchor>,
}

fn positive(px: i64) -> Option<u32> {
    u32::try_from(px).ok().filter(|&v| v > 0)
}

impl TransformSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target width in pixels. Non-positive values are ignored.
    pub fn width(mut self, px: i64) -> Self {
        if let Some(px) = positive(px) {
            self.width = Some(px);
        }
        self
    }

    /// Target height in pixels. Non-positive values are ignored.
    pub fn height(mut self, px: i64) -> Self {
        if let Some(px) = positive(px) {
            self.height = Some(px);
        }
        self
    }

    /// Crop centered on both axes.
    pub fn crop(self) -> Self {
        self.set_crop(Axis::X, Anchor::Center)
            .set_crop(Axis::Y, Anchor::Center)
    }

    pub fn crop_top(self) -> Self {
        self.set_crop(Axis::Y, Anchor::Start)
    }

    pub fn crop_bottom(self) -> Self {
        self.set_crop(Axis::Y, Anchor::End)
    }

    /// Vertical center.
    pub fn crop_middle(self) -> Self {
        self.set_crop(Axis::Y, Anchor::Center)
    }

    pub fn crop_left(self) -> Self {
        self.set_crop(Axis::X, Anchor::Start)
    }

    pub fn crop_right(self) -> Self {
        self.set_crop(Axis::X, Anchor::End)
    }

    /// Horizontal center.
    pub fn crop_center(self) -> Self {
        self.set_crop(Axis::X, Anchor::Center)
    }

    /// Drop any crop position on both axes.
    pub fn cancel_crop(mut self) -> Self {
        self.crop_x = None;
        self.crop_y = None;
        self
    }

    fn set_crop(mut self, axis: Axis, anchor: Anchor) -> Self {
        match axis {
            Axis::X => {
                self.crop_x = Some(anchor);
                if self.crop_y.is_none() {
                    self.crop_y = Some(Anchor::Center);
                }
            }
            Axis::Y => {
                self.crop_y = Some(anchor);
                if self.crop_x.is_none() {
                    self.crop_x = Some(Anchor::Center);
                }
            }
        }
        self
    }

    pub fn target_width(&self) -> Option<u32> {
        self.width
    }

    pub fn target_height(&self) -> Option<u32> {
        self.height
    }

    pub fn crop_x(&self) -> Option<Anchor> {
        self.crop_x
    }

    pub fn crop_y(&self) -> Option<Anchor> {
        self.crop_y
    }

    /// The crop position, if cropping was requested.
    pub fn crop_anchor(&self) -> Option<CropAnchor> {
        match (self.crop_x, self.crop_y) {
            (Some(x), Some(y)) => Some(CropAnchor::new(x, y)),
            _ => None,
        }
    }

    /// Resolve this request against the original image size.
    pub fn resolve(&self, original: Dimensions) -> Result<ResolvedTransform, ResolveError> {
        calculations::resolve(
            original.as_tuple(),
            self.width,
            self.height,
            self.crop_anchor(),
        )
    }
}
