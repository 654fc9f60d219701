//! Image geometry and pixel work.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Crop + resize** | `crop_imm` + Lanczos3 `resize_exact` |
//! | **Encode** | same format as the source, quality for JPEG/AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop/resize geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{ExactMatch, ResolveError, ResolvedTransform, resolve};
pub use params::{Anchor, CropAnchor, CropRect, Quality, ResizeParams};
pub use rust_backend::RustBackend;
