//! URL scheme normalization.
//!
//! Stored URLs may have been recorded over plain HTTP, over HTTPS, or as
//! protocol-relative (`//host/path`). Before two URLs are compared, or a URL
//! is handed back to a caller, it is rewritten to the scheme the current
//! request is served over.

use serde::{Deserialize, Serialize};
use std::fmt;

const HTTP: &str = "http://";
const HTTPS: &str = "https://";
const PROTOCOL_RELATIVE: &str = "//";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Http => HTTP,
            Scheme::Https => HTTPS,
        }
    }

    fn opposite(self) -> Self {
        match self {
            Scheme::Http => Scheme::Https,
            Scheme::Https => Scheme::Http,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Rewrite the scheme of `url` to `scheme`.
///
/// Only a leading `http://`, `https://` or `//` is touched; anything else
/// (relative paths, other schemes) is returned unchanged.
pub fn normalize_scheme(url: &str, scheme: Scheme) -> String {
    let wrong = scheme.opposite().prefix();
    if let Some(rest) = url.strip_prefix(wrong) {
        format!("{}{}", scheme.prefix(), rest)
    } else if url.starts_with(scheme.prefix()) {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix(PROTOCOL_RELATIVE) {
        format!("{}{}", scheme.prefix(), rest)
    } else {
        url.to_string()
    }
}
