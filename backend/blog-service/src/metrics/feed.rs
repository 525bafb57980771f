use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Home page cache events (hit/miss/invalidate).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_feed_cache_events_total",
        "Home page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register blog_feed_cache_events_total");

    /// Follow attempts (created/ignored_self/ignored_duplicate/removed).
    pub static ref FOLLOW_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_follow_events_total",
        "Follow and unfollow actions segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register blog_follow_events_total");

    /// Time spent assembling listings, by listing kind.
    pub static ref LISTING_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_listing_duration_seconds",
        "Listing assembly duration segmented by listing kind",
        &["listing"]
    )
    .expect("failed to register blog_listing_duration_seconds");

    /// HTTP requests by method and status class.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_http_requests_total",
        "HTTP requests segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register blog_http_requests_total");
}
