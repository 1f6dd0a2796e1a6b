use super::{Document, RenderEngine};
use crate::error::ApiError;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Content fingerprint of the raw HTML text. Hash equality is treated as
/// content identity; the collision probability is negligible in practice but
/// this is an approximation, not a guarantee.
pub fn fingerprint(html: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Arc<Document>>,
    recency: VecDeque<String>,
}

/// Fingerprint-keyed document cache, bounded to a fixed number of entries
/// with least-recently-used eviction.
pub struct DocumentCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the cached document for this HTML, building and inserting it
    /// on a miss.
    pub fn get_or_build(
        &self,
        html: &str,
        engine: &dyn RenderEngine,
    ) -> Result<Arc<Document>, ApiError> {
        let key = fingerprint(html);
        let mut inner = self.inner.lock().unwrap();

        if let Some(doc) = inner.entries.get(&key).cloned() {
            debug!("Document cache hit: {}", &key[..12]);
            if let Some(pos) = inner.recency.iter().position(|k| k == &key) {
                inner.recency.remove(pos);
            }
            inner.recency.push_back(key);
            return Ok(doc);
        }

        let doc = Arc::new(engine.build(html)?);
        inner.entries.insert(key.clone(), doc.clone());
        inner.recency.push_back(key);

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.recency.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!("Evicted cached document: {}", &oldest[..12]);
        }

        Ok(doc)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }
}
