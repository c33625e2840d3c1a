//! Access tokens and the per-client caches that hold them.

mod cache;
mod tokens;

pub use cache::{Cache, CacheRegistry, ACCESS_TOKEN_CACHE_KEY};
pub use tokens::AccessToken;
