use crate::pattern::{CompileResult, Pattern, compile_with};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;

use super::RegistryOptions;
use super::cache::{CacheStats, PatternCache, PatternCacheKey};

#[derive(Debug)]
pub struct PatternRegistry {
    options: RegistryOptions,
    cache: Option<RwLock<PatternCache>>,
    stats: Option<CacheStats>,
}

impl PatternRegistry {
    pub fn new(options: Option<RegistryOptions>) -> Self {
        let options = options.unwrap_or_default();
        let cache = options
            .cache_patterns
            .then(|| RwLock::new(PatternCache::new(options.cache_capacity)));
        let stats = cache.as_ref().map(|_| CacheStats::default());

        Self {
            options,
            cache,
            stats,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn get_or_compile(&self, pattern: &str) -> CompileResult<Arc<Pattern>> {
        let Some(cache) = &self.cache else {
            return compile_with(pattern, &self.options.compile).map(Arc::new);
        };

        let key = PatternCacheKey::new(pattern, self.options.compile.debug_trace);
        let guard = cache.upgradable_read();
        let cached = guard.peek(&key);

        if let Some(hit) = cached {
            // the hottest entry is already in place; skip the write lock
            if !guard.is_most_recent(&key) {
                let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
                guard.touch(&key);
            }
            self.record(true);
            tracing::trace!(pattern, "pattern cache hit");
            return Ok(hit);
        }

        drop(guard);
        self.record(false);
        tracing::trace!(pattern, "pattern cache miss");

        // compile outside the lock; a concurrent miss on the same key just overwrites
        let compiled = Arc::new(compile_with(pattern, &self.options.compile)?);
        cache.write().insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn is_match(&self, pattern: &str, input: &str) -> CompileResult<bool> {
        Ok(self.get_or_compile(pattern)?.is_match(input))
    }

    pub fn cache_metrics(&self) -> Option<(u64, u64)> {
        self.stats.as_ref().map(CacheStats::snapshot)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map(|c| c.read().len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
        if let Some(stats) = &self.stats {
            stats.reset();
        }
    }

    fn record(&self, hit: bool) {
        if let Some(stats) = &self.stats {
            if hit {
                stats.record_hit();
            } else {
                stats.record_miss();
            }
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
