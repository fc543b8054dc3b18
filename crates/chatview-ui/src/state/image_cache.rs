//! Decoded images written to disk so GPUI can load them by path

use chatview_core::preview::ImageSurface;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct ImageCache {
    dir: PathBuf,
    /// SHA-256 hex digest of the image bytes to the cached file
    paths: HashMap<String, PathBuf>,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: HashMap::new(),
        }
    }

    /// Path of the image on disk, writing it on first use
    pub fn path_for(&mut self, image: &ImageSurface) -> Option<PathBuf> {
        let key = content_hash(&image.bytes);

        if let Some(path) = self.paths.get(&key) {
            return Some(path.clone());
        }

        let ext = Path::new(&image.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("img");
        let path = self.dir.join(format!("img-{}.{}", key, ext));
        let written = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(&path, &image.bytes));
        if let Err(e) = written {
            warn!(file_name = %image.file_name, "Failed to cache image: {}", e);
            return None;
        }
        self.paths.insert(key, path.clone());
        Some(path)
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn surface(bytes: &[u8]) -> ImageSurface {
        ImageSurface {
            file_name: "cat.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: Arc::from(bytes),
            max_width: 448.0,
        }
    }

    #[test]
    fn test_same_bytes_share_a_file() {
        let dir = tempdir().unwrap();
        let mut cache = ImageCache::new(dir.path().join("images"));

        let first = cache.path_for(&surface(&[1, 2, 3])).unwrap();
        let again = cache.path_for(&surface(&[1, 2, 3])).unwrap();
        let other = cache.path_for(&surface(&[4])).unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(std::fs::read(&first).unwrap(), vec![1, 2, 3]);
        assert!(first.to_string_lossy().ends_with(".png"));
    }

    #[test]
    fn test_file_named_by_sha256_of_bytes() {
        let dir = tempdir().unwrap();
        let mut cache = ImageCache::new(dir.path());

        let path = cache.path_for(&surface(b"abc")).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "img-ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png"
        );
    }
}
