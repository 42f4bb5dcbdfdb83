//! Upstream feed collaborator: fetches a feed document and reduces it to a
//! format-independent item list.

use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use url::Url;

/// Upstream feed after parsing. Timestamps are RFC 3339 strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamFeed {
    pub title: String,
    pub link: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub items: Vec<UpstreamItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamItem {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches and parses the feed at `url`. A missing feed is `SourceError::NotFound`.
    async fn fetch(&self, url: &str) -> Result<UpstreamFeed, SourceError>;
}

/// Builds the upstream URL for a channel: `<base>?channel_id=<id>`.
pub fn channel_feed_url(base: &Url, channel_id: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("channel_id", channel_id);
    url
}

#[derive(Debug, Clone, Default)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<UpstreamFeed, SourceError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        debug!("GET {} -> {}", url, status);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = res.bytes().await?;
        let parsed = feed_rs::parser::parse(&body[..])?;
        Ok(UpstreamFeed::from(parsed))
    }
}

fn timestamp(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|dt| dt.to_rfc3339())
}

/// Picks the `alternate` link (or an untyped one), falling back to the first link.
fn alternate_link(links: &[feed_rs::model::Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

impl From<feed_rs::model::Feed> for UpstreamFeed {
    fn from(feed: feed_rs::model::Feed) -> Self {
        UpstreamFeed {
            title: feed.title.map(|t| t.content).unwrap_or_default(),
            link: alternate_link(&feed.links),
            authors: feed.authors.into_iter().map(|p| p.name).collect(),
            published: timestamp(feed.published),
            items: feed.entries.into_iter().map(UpstreamItem::from).collect(),
        }
    }
}

impl From<feed_rs::model::Entry> for UpstreamItem {
    fn from(entry: feed_rs::model::Entry) -> Self {
        let description = entry.summary.map(|t| t.content).or_else(|| {
            entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|t| t.content.clone()))
        });

        UpstreamItem {
            link: alternate_link(&entry.links).unwrap_or_default(),
            guid: entry.id,
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            published: timestamp(entry.published),
            updated: timestamp(entry.updated),
            description,
        }
    }
}
