//! 渲染结果缓存：同一图片定位串在有效期内只下载一次。
//!
//! 按 LRU 淘汰，条目过期后在下次访问时移除。容量为 0 时缓存关闭。

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::RenderedImage;

struct CachedRender {
    created_at: Instant,
    image: RenderedImage,
}

pub(super) struct RenderCache {
    entries: Option<LruCache<String, CachedRender>>,
    ttl: Duration,
}

impl RenderCache {
    pub(super) fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            ttl,
        }
    }

    pub(super) fn get(&mut self, url: &str) -> Option<RenderedImage> {
        let ttl = self.ttl;
        let entries = self.entries.as_mut()?;

        let expired = entries.peek(url)?.created_at.elapsed() > ttl;
        if expired {
            entries.pop(url);
            return None;
        }

        entries.get(url).map(|item| item.image.clone())
    }

    pub(super) fn insert(&mut self, url: &str, image: &RenderedImage) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        entries.put(
            url.to_string(),
            CachedRender {
                created_at: Instant::now(),
                image: image.clone(),
            },
        );
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.entries.as_ref().map(LruCache::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::source::tests::create_png_bytes;

    fn sample_image() -> RenderedImage {
        RenderedImage::from_bytes(create_png_bytes(2, 2)).expect("valid png")
    }

    #[test]
    fn evicts_least_recently_used_entry() {
        let mut cache = RenderCache::new(2, Duration::from_secs(60));
        let image = sample_image();

        cache.insert("a", &image);
        cache.insert("b", &image);
        assert!(cache.get("a").is_some());
        cache.insert("c", &image);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_dropped_on_access() {
        let mut cache = RenderCache::new(4, Duration::ZERO);
        cache.insert("a", &sample_image());
        std::thread::sleep(Duration::from_millis(2));

        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let mut cache = RenderCache::new(0, Duration::from_secs(60));
        cache.insert("a", &sample_image());

        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }
}
