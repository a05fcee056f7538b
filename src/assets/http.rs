use std::{io::Read, time::Duration};

use isahc::{
    Request,
    config::{Configurable, RedirectPolicy},
};

use crate::{assets::AssetSource, foundation::error::AssetError};

/// Fetches assets over HTTP(S) relative to a base URL.
#[derive(Clone, Debug)]
pub struct HttpAssetSource {
    base_url: String,
}

impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_owned();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            location.trim_start_matches('/')
        )
    }
}

impl AssetSource for HttpAssetSource {
    #[tracing::instrument(skip(self), level = "debug")]
    fn fetch_bytes(&self, location: &str, timeout: Duration) -> Result<Vec<u8>, AssetError> {
        let url = self.url_for(location);
        let request = Request::get(&url)
            .timeout(timeout)
            .redirect_policy(RedirectPolicy::Limit(5))
            .body(())
            .map_err(|e| AssetError::InvalidLocation(format!("{url}: {e}")))?;

        let mut response = isahc::send(request).map_err(|e| {
            if matches!(e.kind(), isahc::error::ErrorKind::Timeout) {
                AssetError::Timeout(timeout)
            } else {
                AssetError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let mut bytes = Vec::new();
        response.body_mut().read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
