use super::model::Feed;
use crate::error::RenderError;
use serde::Serialize;

pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

pub const CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// Serialises `feed` as an indented Atom document with an XML declaration.
pub fn to_atom(feed: &Feed) -> Result<String, RenderError> {
    let mut body = String::new();
    let mut ser = quick_xml::se::Serializer::new(&mut body);
    ser.indent(' ', 4);
    feed.serialize(ser)?;

    Ok(format!("{}{}", XML_HEADER, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::model::{Author, Entry, Link};

    fn sample_feed() -> Feed {
        let author = Author {
            name: "Chan".to_string(),
            uri: "https://example.com/c".to_string(),
        };
        let mut feed = Feed::new("UC1", "Chan <videos>".to_string(), "https://example.com/c".to_string());
        feed.author = Some(author.clone());
        feed.published = Some("2015-04-01T10:00:00+00:00".to_string());
        feed.entries.push(Entry {
            id: "yt:video:v1".to_string(),
            title: "Tom & Jerry".to_string(),
            author: Some(author),
            published: Some("2024-05-01T12:00:00+00:00".to_string()),
            updated: None,
            link: Link::alternate("https://example.com/watch?v=v1".to_string()),
            summary: None,
        });
        feed
    }

    #[test]
    fn test_render_declares_namespaces_and_escapes_text() {
        let doc = to_atom(&sample_feed()).unwrap();

        assert!(doc.starts_with(XML_HEADER));
        assert!(doc.contains(r#"xmlns="http://www.w3.org/2005/Atom""#));
        assert!(doc.contains(r#"xmlns:media="http://search.yahoo.com/mrss/""#));
        assert!(doc.contains(r#"xmlns:yt="http://www.youtube.com/xml/schemas/2015""#));
        assert!(doc.contains("<id>enteral:channel:UC1</id>"));
        assert!(doc.contains("Chan &lt;videos&gt;"));
        assert!(doc.contains("Tom &amp; Jerry"));
        assert!(doc.contains(r#"href="https://example.com/watch?v=v1""#));
        assert!(!doc.contains("<updated>"));
        assert!(!doc.contains("<summary>"));
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let doc = to_atom(&sample_feed()).unwrap();
        let parsed = feed_rs::parser::parse(doc.as_bytes()).unwrap();

        assert_eq!(parsed.title.map(|t| t.content).as_deref(), Some("Chan <videos>"));
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].id, "yt:video:v1");
    }

    #[test]
    fn test_empty_feed_renders() {
        let feed = Feed::new("UC1", "Empty".to_string(), String::new());
        let doc = to_atom(&feed).unwrap();
        assert!(!doc.contains("<entry>"));
        assert!(doc.contains("<title>Empty</title>"));
    }
}
