use std::collections::HashMap;
use std::hash::Hash;

/// Cache for renderer-side resources derived from panels (textures,
/// materials, baked maps). The fold pipeline never fills it itself; renderers
/// own one and hand it to whatever produces the resources.
pub trait ResourceCache<K, R> {
    fn get(&self, key: &K) -> Option<&R>;
    fn put(&mut self, key: K, resource: R) -> Option<R>;
    fn remove(&mut self, key: &K) -> Option<R>;
    fn clear(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

static_assertions::assert_obj_safe!(ResourceCache<String, u32>);

#[derive(Debug, Clone)]
pub struct InMemoryCache<K, R> {
    entries: HashMap<K, R>,
}

impl<K, R> Default for InMemoryCache<K, R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, R> InMemoryCache<K, R> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash, R> ResourceCache<K, R> for InMemoryCache<K, R> {
    fn get(&self, key: &K) -> Option<&R> {
        self.entries.get(key)
    }

    fn put(&mut self, key: K, resource: R) -> Option<R> {
        self.entries.insert(key, resource)
    }

    fn remove(&mut self, key: &K) -> Option<R> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Drops the resources of panels that went away, returns how many were held.
pub fn evict<K, R, C>(cache: &mut C, stale: impl IntoIterator<Item = K>) -> usize
where
    C: ResourceCache<K, R> + ?Sized,
{
    let evicted = stale
        .into_iter()
        .filter(|key| cache.remove(key).is_some())
        .count();
    if evicted > 0 {
        tracing::trace!("evicted {evicted} stale resource(s)");
    }
    evicted
}
