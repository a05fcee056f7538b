//! Where stage assets come from: local files, in-memory blobs or (with the `http` feature) HTTP.

use std::{
    collections::HashMap,
    io::Read as _,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::foundation::error::AssetError;

pub mod preload;
pub mod svg;

/// Bytes read between deadline checks.
const READ_CHUNK: usize = 64 * 1024;

/// A place assets can be fetched from.
///
/// Every fetch carries a time budget. Implementations report exceeding it as
/// [`AssetError::Timeout`] instead of blocking past it.
pub trait AssetSource {
    fn fetch_bytes(&self, location: &str, timeout: Duration) -> Result<Vec<u8>, AssetError>;

    fn fetch_text(&self, location: &str, timeout: Duration) -> Result<String, AssetError> {
        let bytes = self.fetch_bytes(location, timeout)?;
        String::from_utf8(bytes).map_err(|e| AssetError::Parse(format!("not utf-8: {e}")))
    }
}

impl<S: AssetSource + ?Sized> AssetSource for &S {
    fn fetch_bytes(&self, location: &str, timeout: Duration) -> Result<Vec<u8>, AssetError> {
        (**self).fetch_bytes(location, timeout)
    }

    fn fetch_text(&self, location: &str, timeout: Duration) -> Result<String, AssetError> {
        (**self).fetch_text(location, timeout)
    }
}

/// Normalize a relative asset location into a stable, slash-separated form.
///
/// Absolute locations are accepted when written web-style (`/logo.svg` is relative to the
/// source root). `..` segments are rejected.
pub fn normalize_location(location: &str) -> Result<String, AssetError> {
    let s = location.trim().replace('\\', "/");
    if s.is_empty() {
        return Err(AssetError::InvalidLocation(
            "asset location must be non-empty".to_owned(),
        ));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AssetError::InvalidLocation(format!(
                "'{location}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AssetError::InvalidLocation(format!(
            "'{location}' must contain a file name"
        )));
    }
    Ok(out.join("/"))
}

/// Reads assets from a directory on disk.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    #[tracing::instrument(skip(self), level = "debug")]
    fn fetch_bytes(&self, location: &str, timeout: Duration) -> Result<Vec<u8>, AssetError> {
        let norm = normalize_location(location)?;
        let path = self.root.join(Path::new(&norm));
        let deadline = Instant::now().checked_add(timeout);
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(norm.clone()),
            _ => AssetError::Io(e),
        })?;
        let mut bytes = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if expired() {
                return Err(AssetError::Timeout(timeout));
            }
            match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => bytes.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(AssetError::Io(e)),
            }
        }
        Ok(bytes)
    }
}

/// In-memory assets keyed by normalized location.
#[derive(Clone, Debug, Default)]
pub struct InlineAssetSource {
    blobs: HashMap<String, Vec<u8>>,
}

impl InlineAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one asset. Invalid locations are rejected.
    pub fn insert(
        &mut self,
        location: &str,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<(), AssetError> {
        self.blobs.insert(normalize_location(location)?, bytes.into());
        Ok(())
    }

    pub fn with(mut self, location: &str, bytes: impl Into<Vec<u8>>) -> Result<Self, AssetError> {
        self.insert(location, bytes)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl AssetSource for InlineAssetSource {
    fn fetch_bytes(&self, location: &str, _timeout: Duration) -> Result<Vec<u8>, AssetError> {
        let norm = normalize_location(location)?;
        self.blobs
            .get(&norm)
            .cloned()
            .ok_or(AssetError::NotFound(norm))
    }
}

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpAssetSource;

#[cfg(test)]
#[path = "../../tests/unit/assets/mod.rs"]
mod tests;
