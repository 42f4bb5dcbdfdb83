pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod feed;
pub mod server;
pub mod service;
pub mod testing; // Test doubles shared by unit and integration tests
pub mod utils;

pub use cache::{Cache, MemoryCache, Namespace, NoopCache, RedisCache};
pub use classifier::{Classifier, HttpProbe, Probe};
pub use feed::{FeedFilter, FeedSource, HttpFeedSource};
pub use service::{FeedResponse, FeedService, FeedTtls};
