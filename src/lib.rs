//! # cropvariant
//!
//! Resized and cropped variants of uploaded images, computed on demand and
//! cached as files next to their originals.
//!
//! # Architecture: Request → Geometry → Name → File
//!
//! A request names a source image and how it should look. Each stage is a
//! pure function of the previous one until the last, which touches disk:
//!
//! ```text
//! 1. Transform    width / height / crop calls  →  TransformSpec
//! 2. Geometry     spec + original size         →  crop window, output size, skip?
//! 3. Naming       original path + size + crop  →  variant path
//! 4. Materialize  all of the above             →  file on disk + public URL
//! ```
//!
//! Geometry and naming never perform I/O, so most of the crate is tested
//! without touching an image codec.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | Fluent `TransformSpec` builder with crop auto-fill |
//! | [`imaging`] | Geometry resolver, backend trait, `image`-crate backend |
//! | [`naming`] | Deterministic `{stem}-{prefix}{w}x{h}.{ext}` variant names |
//! | [`materialize`] | Identify, resolve, write-to-temp-and-rename, batch processing |
//! | [`storage`] | Uploads directory ↔ public URL mapping, attachment lookup |
//! | [`scheme`] | `http://` / `https://` / `//` URL normalization |
//! | [`handle`] | Caller-facing `ImageHandle` with chained calls and `save` |
//! | [`config`] | `cropvariant.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting, text and JSON |
//!
//! # Design Decisions
//!
//! ## Files Are the Cache
//!
//! A variant's name encodes its size and crop position, so the same request
//! always maps to the same file and a web server can serve it directly on the
//! next hit. There is no index or database to keep in sync.
//!
//! ## Fit vs. Crop
//!
//! Without a crop the image is scaled to fit inside the requested box,
//! keeping its aspect ratio, and never upscaled. With a crop the output has
//! exactly the requested size: the largest window of the target aspect ratio
//! is cut from the source at the requested position, then scaled.
//!
//! ## Atomic Writes
//!
//! Variants are encoded into a temp file in the destination directory and
//! renamed into place. Concurrent requests for the same variant therefore
//! never expose a half-written file.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling) for
//! decoding, cropping, resizing, and encoding. No ImageMagick or system
//! libraries are needed.

pub mod config;
pub mod handle;
pub mod imaging;
pub mod materialize;
pub mod naming;
pub mod output;
pub mod scheme;
pub mod storage;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;
