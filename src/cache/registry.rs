//! Cache registry - central management for all caches.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{CacheConfig, TypedCache};

/// Registry of named caches.
///
/// Repositories ask the registry for their cache by name, so two
/// components using the same name share one cache.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cache registered under `name`, creating it with `config`
    /// if it does not exist yet.
    ///
    /// If the name is taken by a cache of different key/value types, a
    /// fresh unregistered cache is returned instead.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if let Some(existing) = self.caches.read().get(name) {
            if let Some(cache) = existing.downcast_ref::<TypedCache<K, V>>() {
                return cache.clone();
            }
        }

        let mut caches = self.caches.write();
        match caches.get(name) {
            Some(existing) => match existing.downcast_ref::<TypedCache<K, V>>() {
                Some(cache) => cache.clone(),
                None => {
                    warn!(
                        "Cache '{}' already registered with different types, not sharing it",
                        name
                    );
                    TypedCache::new(name, config)
                }
            },
            None => {
                debug!("Creating cache: {}", name);
                let cache = TypedCache::<K, V>::new(name, config);
                caches.insert(name.to_string(), Box::new(cache.clone()));
                cache
            }
        }
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_shares_cache() {
        let registry = CacheRegistry::new();
        let a: TypedCache<i64, String> = registry.get_or_create("flood", CacheConfig::default());
        let b: TypedCache<i64, String> = registry.get_or_create("flood", CacheConfig::default());

        a.insert(1, "x".to_string());
        assert_eq!(b.get(&1).as_deref(), Some("x"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_type_mismatch_gets_private_cache() {
        let registry = CacheRegistry::new();
        let a: TypedCache<i64, String> = registry.get_or_create("flood", CacheConfig::default());
        let b: TypedCache<i64, u32> = registry.get_or_create("flood", CacheConfig::default());

        a.insert(1, "x".to_string());
        assert_eq!(b.get(&1), None);
        assert_eq!(b.name(), "flood");
    }
}
