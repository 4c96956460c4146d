mod fetcher;

pub use fetcher::{FeedFetcher, FeedItem, FeedReader};
