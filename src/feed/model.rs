//! Output Atom document. Field order is element order.

use serde::Serialize;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";
pub const YT_NS: &str = "http://www.youtube.com/xml/schemas/2015";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "feed")]
pub struct Feed {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    #[serde(rename = "@xmlns:media")]
    pub xmlns_media: &'static str,
    #[serde(rename = "@xmlns:yt")]
    pub xmlns_yt: &'static str,
    pub id: String,
    pub title: String,
    #[serde(rename = "link")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(rename = "entry")]
    pub entries: Vec<Entry>,
}

impl Feed {
    /// Empty feed for `channel_id` with the namespaces declared.
    pub fn new(channel_id: &str, title: String, link: String) -> Self {
        Feed {
            xmlns: ATOM_NS,
            xmlns_media: MEDIA_NS,
            xmlns_yt: YT_NS,
            id: format!("enteral:channel:{}", channel_id),
            title,
            links: vec![Link::alternate(link)],
            author: None,
            published: None,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@rel", skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

impl Link {
    pub fn alternate(href: String) -> Self {
        Link {
            href,
            rel: Some("alternate".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub link: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
