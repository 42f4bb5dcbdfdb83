pub mod filter;
pub mod model;
pub mod render;
pub mod source;

pub use filter::{item_id_from_link, FeedFilter};
pub use model::Feed;
pub use source::{FeedSource, HttpFeedSource, UpstreamFeed, UpstreamItem};
