//! HTTP client building with bounded timeouts.

mod client;

pub use client::{HttpClientBuilder, HttpClientConfig};
