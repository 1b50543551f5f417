use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use super::errors::RequestError;

/// No overall request timeout: item data can run to hundreds of megabytes.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, RequestError> {
    ClientBuilder::new()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .pool_max_idle_per_host(8)
        .connect_timeout(connect_timeout)
        .build()
        .map_err(RequestError::Client)
}
