pub mod adapter;
pub mod mastodon;
pub mod reddit;
pub mod rss;

pub use adapter::{quota_per_target, SourceAdapter};
pub use mastodon::MastodonAdapter;
pub use reddit::RedditAdapter;
pub use rss::RssAdapter;
