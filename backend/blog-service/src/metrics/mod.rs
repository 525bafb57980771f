//! Prometheus collectors for blog-service, rendered by `GET /metrics`.

pub mod feed;
