/// Content caching layer
///
/// Holds the process-wide home page cache. Write paths that change the home
/// listing call `FeedCache::invalidate`.
pub mod feed_cache;

pub use feed_cache::{FeedCache, DEFAULT_TTL, INDEX_PAGE_KEY};
