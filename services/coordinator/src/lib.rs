//! Coordinator service: HTTP shell around `fedcoord-core`.

pub mod http_dispatch;
pub mod routes;
