use super::model::{Author, Entry, Feed, Link};
use super::source::{FeedSource, UpstreamItem};
use crate::classifier::Classifier;
use crate::error::{Cancelled, ClassifyError, FilterError};
use crate::utils::cancellable;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Extracts the item id from an item link (the `v` query parameter).
pub fn item_id_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Fetches an upstream feed and drops every short-form item from it.
#[derive(Clone)]
pub struct FeedFilter {
    source: Arc<dyn FeedSource>,
    classifier: Classifier,
    concurrency: usize,
}

impl FeedFilter {
    pub fn new(source: Arc<dyn FeedSource>, classifier: Classifier) -> Self {
        Self {
            source,
            classifier,
            concurrency: 1,
        }
    }

    /// Allows up to `n` classifications in flight. Output order is unaffected.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub async fn filter_feed(
        &self,
        upstream_id: &str,
        upstream_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Feed, FilterError> {
        let upstream = cancellable(cancel, self.source.fetch(upstream_url)).await??;
        let link = upstream.link.unwrap_or_default();

        let mut feed = Feed::new(upstream_id, upstream.title, link.clone());
        feed.published = upstream.published;
        feed.author = upstream.authors.into_iter().next().map(|name| Author {
            name,
            uri: link,
        });

        let total = upstream.items.len();
        let author = feed.author.as_ref();
        let kept: Vec<Option<Entry>> = stream::iter(upstream.items)
            .map(|item| self.filter_item(item, author, cancel))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        feed.entries = kept.into_iter().flatten().collect();
        info!(
            "Filtered feed {}: kept {} of {} items",
            upstream_id,
            feed.entries.len(),
            total
        );
        Ok(feed)
    }

    /// `Ok(None)` drops the item: unusable link, failed classification, or short-form.
    async fn filter_item(
        &self,
        item: UpstreamItem,
        author: Option<&Author>,
        cancel: &CancellationToken,
    ) -> Result<Option<Entry>, Cancelled> {
        let Some(item_id) = item_id_from_link(&item.link) else {
            warn!("couldn't get ID for {}", item.link);
            return Ok(None);
        };

        match self.classifier.classify(&item_id, cancel).await {
            Ok(true) => {
                debug!("skipping short {}", item.link);
                Ok(None)
            }
            Ok(false) => Ok(Some(Entry {
                id: item.guid,
                title: item.title,
                author: author.cloned(),
                published: item.published,
                updated: item.updated,
                link: Link::alternate(item.link),
                summary: item.description,
            })),
            Err(ClassifyError::Cancelled(c)) => Err(c),
            Err(ClassifyError::Probe(e)) => {
                warn!("couldn't determine short status for {}: {}", item.link, e);
                Ok(None)
            }
        }
    }
}
