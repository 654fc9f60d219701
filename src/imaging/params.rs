//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the geometry resolver and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing the materializer.
//!
//! ## Types
//!
//! - [`Anchor`] / [`CropAnchor`]: where the crop window sits on each axis.
//! - [`CropRect`]: a window on the source image, in source pixels.
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeParams`]: everything needed for one variant: source, output, crop, size, quality.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of the crop window along one axis.
///
/// Horizontally the positions read as left / center / right, vertically as
/// top / center / bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Center,
    End,
}

impl Anchor {
    /// Offset of a `window`-sized span inside a `source`-sized span.
    pub fn offset(self, source: u32, window: u32) -> u32 {
        let slack = source.saturating_sub(window);
        match self {
            Anchor::Start => 0,
            Anchor::Center => slack / 2,
            Anchor::End => slack,
        }
    }

    /// Name of this position on the horizontal axis.
    pub fn horizontal_name(self) -> &'static str {
        match self {
            Anchor::Start => "left",
            Anchor::Center => "center",
            Anchor::End => "right",
        }
    }

    /// Name of this position on the vertical axis.
    pub fn vertical_name(self) -> &'static str {
        match self {
            Anchor::Start => "top",
            Anchor::Center => "center",
            Anchor::End => "bottom",
        }
    }
}

/// Two-axis crop position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropAnchor {
    pub x: Anchor,
    pub y: Anchor,
}

impl CropAnchor {
    pub fn new(x: Anchor, y: Anchor) -> Self {
        Self { x, y }
    }

    /// Both axes centered.
    pub fn centered() -> Self {
        Self::new(Anchor::Center, Anchor::Center)
    }

    /// `(x, y)` as human names, e.g. `("left", "top")`.
    pub fn names(self) -> (&'static str, &'static str) {
        (self.x.horizontal_name(), self.y.vertical_name())
    }
}

impl Default for CropAnchor {
    fn default() -> Self {
        Self::centered()
    }
}

/// Rectangle on the source image, in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for producing one variant: optional crop on the source, then an
/// exact resize to `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub crop: Option<CropRect>,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
