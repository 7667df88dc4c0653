//! Public URL resolution for playback.

use crate::keys::fallback_public_url;
use crate::traits::AssetStore;
use morsel_core::MediaError;
use std::sync::Arc;

/// Turns whatever is on record for a media item into a URL a player can fetch.
///
/// Records may hold a full URL or a path relative to a bucket. Resolution never fails: when
/// the store cannot produce a URL, a statically constructed one is returned instead.
#[derive(Clone)]
pub struct PublicUrlResolver {
    store: Arc<dyn AssetStore>,
    fallback_base: String,
}

impl PublicUrlResolver {
    pub fn new(store: Arc<dyn AssetStore>, fallback_base: impl Into<String>) -> Self {
        Self {
            store,
            fallback_base: fallback_base.into(),
        }
    }

    pub async fn resolve(&self, media_url: &str, namespace: &str) -> String {
        if has_network_scheme(media_url) {
            return media_url.to_string();
        }

        let path = media_url.trim_start_matches('/');
        match self.store.public_url(namespace, path).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                MediaError::Resolution("store returned an empty URL".to_string()).log("resolve");
                fallback_public_url(&self.fallback_base, namespace, path)
            }
            Err(e) => {
                MediaError::Resolution(e.to_string()).log("resolve");
                fallback_public_url(&self.fallback_base, namespace, path)
            }
        }
    }
}

fn has_network_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn resolver(store: Arc<MemoryStorage>) -> PublicUrlResolver {
        PublicUrlResolver::new(store, "https://abc.example.co")
    }

    #[tokio::test]
    async fn test_absolute_url_returned_unchanged() {
        let store = Arc::new(MemoryStorage::default());
        let url = "https://cdn.example.com/stories/u/a.mp4?sig=1";
        assert_eq!(resolver(store.clone()).resolve(url, "stories").await, url);
        assert_eq!(store.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_relative_path_asks_store() {
        let store = Arc::new(MemoryStorage::new("https://cdn.test"));
        let url = resolver(store).resolve("u/a.mp4", "stories").await;
        assert_eq!(url, "https://cdn.test/stories/u/a.mp4");
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back() {
        let store = Arc::new(MemoryStorage::default());
        store.set_fail_lookups(true);
        let url = resolver(store).resolve("u/a.mp4", "stories").await;
        assert_eq!(
            url,
            "https://abc.example.co/storage/v1/object/public/stories/u/a.mp4"
        );
    }

    #[tokio::test]
    async fn test_invalid_path_still_resolves() {
        let store = Arc::new(MemoryStorage::default());
        let url = resolver(store).resolve("../x.mp4", "stories").await;
        assert!(!url.is_empty());
    }
}
