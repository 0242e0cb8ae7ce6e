mod cache;
mod options;
mod service;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, PatternCache, PatternCacheKey};
pub use options::{RegistryOptions, RegistryOptionsBuilder};
pub use service::PatternRegistry;
