//! Short-form classification, memoised in the cache under `is-short:<itemId>`.

pub mod probe;

pub use probe::{HttpProbe, Probe};

use crate::cache::{Cache, Namespace};
use crate::error::{ClassifyError, ProbeError};
use crate::utils::cancellable;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Maps a probe status onto a classification.
///
/// 2xx means the short-form URL served the item, 3xx means it redirected
/// away. Everything else is an error rather than a "not short" verdict, so
/// the caller skips the item instead of letting it through.
pub fn status_to_flag(status: u16) -> Result<bool, ProbeError> {
    match status {
        200..=299 => Ok(true),
        300..=399 => Ok(false),
        other => Err(ProbeError::UnexpectedStatus(other)),
    }
}

pub fn encode_flag(is_short: bool) -> &'static str {
    if is_short {
        "1"
    } else {
        "0"
    }
}

pub fn decode_flag(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Classifier {
    cache: Arc<dyn Cache>,
    probe: Arc<dyn Probe>,
    ttl: Duration,
}

impl Classifier {
    pub fn new(cache: Arc<dyn Cache>, probe: Arc<dyn Probe>, ttl: Duration) -> Self {
        Self { cache, probe, ttl }
    }

    /// Returns whether `item_id` is a short-form item.
    ///
    /// Cache faults are logged and treated as a miss; a failed or cancelled
    /// write-back is logged and the computed result is still returned. Probe failures and
    /// cancellation are returned as errors.
    pub async fn classify(
        &self,
        item_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ClassifyError> {
        match cancellable(cancel, self.cache.get(Namespace::IsShort, item_id)).await? {
            Ok(Some(cached)) => match decode_flag(&cached) {
                Some(is_short) => {
                    debug!("classify {}: cached is_short={}", item_id, is_short);
                    return Ok(is_short);
                }
                None => warn!("classify {}: ignoring corrupt cache value {:?}", item_id, cached),
            },
            Ok(None) => {}
            Err(e) => warn!("classify {}: cache get error: {}", item_id, e),
        }

        let status = cancellable(cancel, self.probe.probe(item_id)).await??;
        let is_short = status_to_flag(status)?;

        let write = self
            .cache
            .set(Namespace::IsShort, item_id, self.ttl, encode_flag(is_short));
        match cancellable(cancel, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("classify {}: cache set error: {}", item_id, e),
            Err(e) => warn!("classify {}: cache set abandoned: {}", item_id, e),
        }

        Ok(is_short)
    }
}
