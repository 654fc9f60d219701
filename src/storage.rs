//! Uploads directory ↔ public URL mapping.
//!
//! Source images live under one base directory that the web server exposes
//! under one base URL:
//!
//! ```text
//! /srv/site/uploads/2017/12/wallpaper.jpg
//! https://example.com/uploads/2017/12/wallpaper.jpg
//! ```
//!
//! [`UploadsMapping`] translates in both directions, and is the only way to
//! build an [`ImageReference`], so a reference's path and URL always name the
//! same file. URLs are scheme-normalized (see [`crate::scheme`]) before they
//! are compared with the base URL or stored.
//!
//! Images referenced by an opaque attachment ID are first turned into a URL
//! through an [`AttachmentLookup`].

use crate::scheme::{Scheme, normalize_scheme};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("URL is not under the uploads base URL: {0}")]
    OutsideUploads(String),
    #[error("Path is not under the uploads directory: {0}")]
    PathOutsideUploads(PathBuf),
    #[error("Unknown attachment ID: {0}")]
    UnknownAttachment(u64),
}

/// Resolves opaque attachment IDs to image URLs.
pub trait AttachmentLookup {
    fn attachment_url(&self, id: u64) -> Option<String>;
}

impl AttachmentLookup for HashMap<u64, String> {
    fn attachment_url(&self, id: u64) -> Option<String> {
        self.get(&id).cloned()
    }
}

/// String-keyed table, as read from a TOML `[attachments]` section.
impl AttachmentLookup for BTreeMap<String, String> {
    fn attachment_url(&self, id: u64) -> Option<String> {
        self.get(&id.to_string()).cloned()
    }
}

/// A source image: its absolute local path and its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    path: PathBuf,
    url: String,
}

impl ImageReference {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsMapping {
    base_dir: PathBuf,
    base_url: String,
    scheme: Scheme,
}

impl UploadsMapping {
    /// `base_url` is normalized to `scheme` and stored without a trailing slash.
    pub fn new(base_dir: impl Into<PathBuf>, base_url: &str, scheme: Scheme) -> Self {
        Self {
            base_dir: base_dir.into(),
            base_url: normalize_scheme(base_url.trim_end_matches('/'), scheme),
            scheme,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Local path of the file behind `url`.
    ///
    /// Query strings and fragments are ignored. `.` and `..` segments are
    /// rejected rather than resolved, so the result is always inside the
    /// base directory.
    pub fn url_to_path(&self, url: &str) -> Result<PathBuf, StorageError> {
        let url = normalize_scheme(url, self.scheme);
        let outside = || StorageError::OutsideUploads(url.clone());

        let relative = url
            .strip_prefix(self.base_url.as_str())
            .filter(|rest| rest.starts_with('/'))
            .ok_or_else(outside)?;
        let relative = relative.split(['?', '#']).next().unwrap_or_default();

        let mut path = self.base_dir.clone();
        let mut segments = 0;
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(outside());
            }
            path.push(segment);
            segments += 1;
        }
        if segments == 0 {
            return Err(outside());
        }
        Ok(path)
    }

    /// Public URL of a file under the base directory.
    pub fn path_to_url(&self, path: &Path) -> Result<String, StorageError> {
        let relative = path
            .strip_prefix(&self.base_dir)
            .map_err(|_| StorageError::PathOutsideUploads(path.to_path_buf()))?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                _ => return Err(StorageError::PathOutsideUploads(path.to_path_buf())),
            }
        }
        Ok(format!("{}/{}", self.base_url, segments.join("/")))
    }

    /// Reference for an image given by URL.
    pub fn reference(&self, url: &str) -> Result<ImageReference, StorageError> {
        let path = self.url_to_path(url)?;
        Ok(ImageReference {
            path,
            url: normalize_scheme(url, self.scheme),
        })
    }

    /// Reference for an image given by attachment ID.
    pub fn reference_for_attachment(
        &self,
        id: u64,
        lookup: &impl AttachmentLookup,
    ) -> Result<ImageReference, StorageError> {
        let url = lookup
            .attachment_url(id)
            .ok_or(StorageError::UnknownAttachment(id))?;
        self.reference(&url)
    }
}
