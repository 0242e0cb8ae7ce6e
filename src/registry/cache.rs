use crate::pattern::Pattern;
use hashbrown::HashMap as FastHashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct PatternCache {
    capacity: usize,
    map: FastHashMap<PatternCacheKey, Arc<Pattern>>,
    order: VecDeque<PatternCacheKey>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            capacity: cap,
            map: FastHashMap::with_capacity(cap),
            order: VecDeque::with_capacity(cap),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn peek(&self, key: &PatternCacheKey) -> Option<Arc<Pattern>> {
        self.map.get(key).cloned()
    }

    pub fn is_most_recent(&self, key: &PatternCacheKey) -> bool {
        self.order.front() == Some(key)
    }

    pub fn touch(&mut self, key: &PatternCacheKey) {
        if self.map.contains_key(key) && !self.is_most_recent(key) {
            self.promote(key);
        }
    }

    pub fn insert(&mut self, key: PatternCacheKey, pattern: Arc<Pattern>) {
        if let Some(entry) = self.map.get_mut(&key) {
            *entry = pattern;
            self.promote(&key);
            return;
        }

        if self.order.len() == self.capacity
            && let Some(oldest) = self.order.pop_back()
        {
            self.map.remove(&oldest);
        }

        self.order.push_front(key.clone());
        self.map.insert(key, pattern);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn promote(&mut self, key: &PatternCacheKey) {
        if self.is_most_recent(key) {
            return;
        }
        if let Some(pos) = self.order.iter().position(|existing| existing == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key.clone());
    }
}

// the same source compiled with and without tracing yields distinct entries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternCacheKey {
    source: Box<str>,
    debug_trace: bool,
}

impl PatternCacheKey {
    pub fn new(source: &str, debug_trace: bool) -> Self {
        Self {
            source: source.into(),
            debug_trace,
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{CompileFlags, compile};

    fn compiled(source: &str) -> Arc<Pattern> {
        Arc::new(compile(source, CompileFlags::empty()).expect("pattern should compile"))
    }

    #[test]
    fn peek_returns_value_without_changing_order() {
        let mut cache = PatternCache::new(4);
        let key = PatternCacheKey::new("ab+", false);
        cache.insert(key.clone(), compiled("ab+"));

        let front_before = cache.order.front().cloned();
        let result = cache.peek(&key);
        let front_after = cache.order.front().cloned();

        assert_eq!(result.map(|p| p.as_str().to_string()), Some("ab+".to_string()));
        assert_eq!(front_before, front_after);
        assert_eq!(front_after, Some(key));
    }

    #[test]
    fn touch_promotes_entry_to_front() {
        let mut cache = PatternCache::new(4);
        let first = PatternCacheKey::new("a", false);
        let second = PatternCacheKey::new("b", false);
        cache.insert(first.clone(), compiled("a"));
        cache.insert(second.clone(), compiled("b"));

        assert_eq!(cache.order.front(), Some(&second));
        cache.touch(&first);
        assert_eq!(cache.order.front(), Some(&first));
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut cache = PatternCache::new(2);
        let a = PatternCacheKey::new("a", false);
        let b = PatternCacheKey::new("b", false);
        let c = PatternCacheKey::new("c", false);
        cache.insert(a.clone(), compiled("a"));
        cache.insert(b.clone(), compiled("b"));
        cache.touch(&a);
        cache.insert(c.clone(), compiled("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&a).is_some());
        assert!(cache.peek(&b).is_none());
        assert!(cache.peek(&c).is_some());
    }

    #[test]
    fn reinserting_the_front_entry_keeps_a_single_slot() {
        let mut cache = PatternCache::new(2);
        let a = PatternCacheKey::new("a", false);
        let b = PatternCacheKey::new("b", false);
        cache.insert(a.clone(), compiled("a"));
        cache.insert(b.clone(), compiled("b"));
        cache.insert(b.clone(), compiled("b"));
        cache.touch(&b);

        assert!(cache.is_most_recent(&b));
        assert!(!cache.is_most_recent(&a));
        assert_eq!(cache.order.len(), 2);
        assert!(cache.peek(&a).is_some());
    }

    #[test]
    fn trace_flag_is_part_of_the_key() {
        let mut cache = PatternCache::new(4);
        cache.insert(PatternCacheKey::new("a", false), compiled("a"));
        assert!(cache.peek(&PatternCacheKey::new("a", true)).is_none());
    }
}
