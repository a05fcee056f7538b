use std::time::Duration;

use crate::{assets::AssetSource, foundation::error::AssetError};

/// Result of warming one bitmap.
#[derive(Clone, Debug, PartialEq)]
pub enum PreloadOutcome {
    Loaded {
        location: String,
        width: u32,
        height: u32,
    },
    Failed {
        location: String,
        reason: String,
    },
}

impl PreloadOutcome {
    pub fn location(&self) -> &str {
        match self {
            Self::Loaded { location, .. } | Self::Failed { location, .. } => location,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Fetches and decodes bitmaps ahead of time.
///
/// Each image is bounded by `timeout`; failures are reported, never propagated.
pub struct Preloader<'a> {
    source: &'a dyn AssetSource,
    timeout: Duration,
}

impl<'a> Preloader<'a> {
    pub fn new(source: &'a dyn AssetSource, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn preload<S: AsRef<str>>(&self, locations: &[S]) -> Vec<PreloadOutcome> {
        locations
            .iter()
            .map(|loc| {
                let location = loc.as_ref().to_owned();
                match self.load_one(&location) {
                    Ok((width, height)) => PreloadOutcome::Loaded {
                        location,
                        width,
                        height,
                    },
                    Err(err) => {
                        tracing::warn!(%location, error = %err, "preload failed");
                        PreloadOutcome::Failed {
                            location,
                            reason: err.to_string(),
                        }
                    }
                }
            })
            .collect()
    }

    fn load_one(&self, location: &str) -> Result<(u32, u32), AssetError> {
        let bytes = self.source.fetch_bytes(location, self.timeout)?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| AssetError::Parse(format!("decode image: {e}")))?;
        Ok((img.width(), img.height()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/preload.rs"]
mod tests;
