//! Network probe used to tell short-form items apart from regular ones.

use crate::error::ProbeError;
use async_trait::async_trait;
use log::debug;
use reqwest::redirect;

#[async_trait]
pub trait Probe: Send + Sync {
    /// Probes the short-form URL for `item_id` and returns the observed HTTP status.
    async fn probe(&self, item_id: &str) -> Result<u16, ProbeError>;
}

/// Issues `HEAD <base>/<item_id>` without following redirects.
///
/// A short-form item answers 2xx on its short-form URL; a regular item is
/// redirected away (3xx).
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProbe {
    pub fn new(base_url: &str) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// `client` must not follow redirects, or every item will probe as short-form.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn probe_url(&self, item_id: &str) -> String {
        format!("{}/{}", self.base_url, item_id)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, item_id: &str) -> Result<u16, ProbeError> {
        let url = self.probe_url(item_id);
        let res = self.client.head(&url).send().await?;
        let status = res.status().as_u16();
        debug!("HEAD {} -> {}", url, status);
        Ok(status)
    }
}
