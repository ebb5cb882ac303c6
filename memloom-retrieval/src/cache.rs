use moka::sync::Cache;

/// Embedding cache keyed `(model, blake3(text))`, sharing the token
/// counter's moka-backed discipline (bounded size, TTL, immutable entries).
pub struct EmbeddingCache {
    cache: Cache<(String, [u8; 32]), Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(max_entries: u64, ttl: std::time::Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).time_to_live(ttl).build(),
        }
    }

    pub fn get(&self, model: &str, text: &str) -> Option<Vec<f32>> {
        self.cache.get(&key(model, text))
    }

    pub fn insert(&self, model: &str, text: &str, vector: Vec<f32>) {
        self.cache.insert(key(model, text), vector);
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(10_000, std::time::Duration::from_secs(3600))
    }
}

fn key(model: &str, text: &str) -> (String, [u8; 32]) {
    (model.to_string(), *blake3::hash(text.as_bytes()).as_bytes())
}
