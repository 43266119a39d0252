use crate::error::{ArtworkError, Result};
use crate::types::ArtworkData;
use lofty::{PictureType, TaggedFileExt};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Maximum artwork size (5MB)
const MAX_ARTWORK_SIZE: usize = 5 * 1024 * 1024;

/// Extracts artwork from audio files with LRU caching
///
/// Misses are cached too, so a file without artwork is only parsed once.
pub struct ArtworkExtractor {
    cache: Arc<Mutex<LruCache<PathBuf, Option<Arc<ArtworkData>>>>>,
}

impl ArtworkExtractor {
    /// Create a new artwork extractor with the specified cache size
    ///
    /// # Arguments
    /// * `cache_size` - Maximum number of files to cache (0 keeps a single entry)
    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Extract artwork from an audio file
    ///
    /// Returns `Ok(Some(artwork))` if artwork found, `Ok(None)` if no artwork,
    /// or `Err` if there was an error reading the file.
    pub fn extract(&self, path: &Path) -> Result<Option<ArtworkData>> {
        // Canonicalize path for consistent cache keys
        let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&canonical_path) {
                return Ok(cached.as_deref().cloned());
            }
        }

        let artwork = Self::extract_from_file(path)?;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.put(canonical_path, artwork.clone().map(Arc::new));

        Ok(artwork)
    }

    /// Number of cached entries (hits and misses)
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Extract artwork from a file without caching
    fn extract_from_file(path: &Path) -> Result<Option<ArtworkData>> {
        if !path.exists() {
            return Err(ArtworkError::FileNotFound(path.to_path_buf()));
        }

        let tagged_file = lofty::read_from_path(path)?;

        // Primary tag first, then whatever tag the container has
        let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        else {
            return Ok(None);
        };

        let pictures = tag.pictures();

        // Prefer front cover, otherwise use first picture
        let Some(picture) = pictures
            .iter()
            .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
            .or_else(|| pictures.first())
        else {
            return Ok(None);
        };

        let data = picture.data();
        if data.len() > MAX_ARTWORK_SIZE {
            tracing::warn!(
                path = %path.display(),
                size = data.len(),
                max = MAX_ARTWORK_SIZE,
                "Embedded artwork too large, skipping"
            );
            return Err(ArtworkError::TooLarge(data.len(), MAX_ARTWORK_SIZE));
        }

        let artwork = match picture.mime_type() {
            Some(mime) => ArtworkData::new(data.to_vec(), mime.as_str()),
            None => ArtworkData::from_bytes(data.to_vec()),
        };

        Ok(Some(artwork))
    }
}

impl Default for ArtworkExtractor {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_starts_with_empty_cache() {
        let extractor = ArtworkExtractor::new(10);
        assert_eq!(extractor.cached_len(), 0);
    }

    #[test]
    fn zero_cache_size_still_constructs() {
        let extractor = ArtworkExtractor::new(0);
        assert_eq!(extractor.cached_len(), 0);
    }

    #[test]
    fn extract_nonexistent_file_returns_error() {
        let extractor = ArtworkExtractor::new(10);
        let result = extractor.extract(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(ArtworkError::FileNotFound(_))));
        assert_eq!(extractor.cached_len(), 0);
    }

    #[test]
    fn clear_cache_works() {
        let extractor = ArtworkExtractor::new(10);
        extractor.clear_cache();
        assert_eq!(extractor.cached_len(), 0);
    }
}
