//! Attachment downloads through short-lived object URLs
//!
//! A download decodes the attachment into a blob, registers it under an
//! object URL, hands the URL to a save sink and revokes it afterwards. The
//! revoke happens on every exit path, including a failing save.

use crate::error::{AttachmentError, Result};
use crate::types::FileAttachment;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Decoded attachment bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl Blob {
    pub fn from_attachment(file: &FileAttachment) -> Result<Self> {
        Ok(Self {
            bytes: file.decode_bytes()?.into(),
            mime_type: file.blob_mime_type().to_string(),
        })
    }
}

/// Handle to a registered blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live object URLs
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: Mutex<HashMap<ObjectUrl, Blob>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(&self, blob: Blob) -> ObjectUrl {
        let url = ObjectUrl(format!("blob:chatview/{}", uuid::Uuid::new_v4()));
        self.blobs.lock().insert(url.clone(), blob);
        url
    }

    pub fn revoke_object_url(&self, url: &ObjectUrl) {
        if self.blobs.lock().remove(url).is_some() {
            debug!(%url, "revoked object URL");
        }
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Result<Blob> {
        self.blobs
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| AttachmentError::UnknownObjectUrl(url.to_string()).into())
    }

    /// Number of URLs not yet revoked
    pub fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }
}

/// Destination that performs the actual save for a triggered download
pub trait SaveSink {
    fn save(&mut self, registry: &BlobRegistry, url: &ObjectUrl, file_name: &str) -> Result<()>;
}

/// Writes downloads to a fixed path
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveSink for FileSink {
    fn save(&mut self, registry: &BlobRegistry, url: &ObjectUrl, file_name: &str) -> Result<()> {
        let blob = registry.resolve(url)?;
        std::fs::write(&self.path, &blob.bytes)?;
        info!(file_name, path = ?self.path, "saved download");
        Ok(())
    }
}

/// Writes downloads into a directory under their own file name
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveSink for DirectorySink {
    fn save(&mut self, registry: &BlobRegistry, url: &ObjectUrl, file_name: &str) -> Result<()> {
        // Only the final path component of a sender-supplied name is used
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "download".into());
        FileSink::new(self.dir.join(name)).save(registry, url, file_name)
    }
}

struct RevokeOnDrop<'a> {
    registry: &'a BlobRegistry,
    url: ObjectUrl,
}

impl Drop for RevokeOnDrop<'_> {
    fn drop(&mut self) {
        self.registry.revoke_object_url(&self.url);
    }
}

/// Download an attachment: blob, object URL, save, revoke.
pub fn download(
    file: &FileAttachment,
    registry: &BlobRegistry,
    sink: &mut dyn SaveSink,
) -> Result<()> {
    let blob = Blob::from_attachment(file)?;
    let guard = RevokeOnDrop {
        registry,
        url: registry.create_object_url(blob),
    };
    sink.save(registry, &guard.url, &file.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingSink;

    impl SaveSink for FailingSink {
        fn save(&mut self, registry: &BlobRegistry, url: &ObjectUrl, _: &str) -> Result<()> {
            assert!(registry.resolve(url).is_ok());
            Err(crate::Error::Internal("disk full".to_string()))
        }
    }

    #[test]
    fn test_download_writes_and_revokes() {
        let dir = tempdir().unwrap();
        let registry = BlobRegistry::new();
        let file = FileAttachment::from_bytes("report.bin", &[1, 2, 3], None);

        download(&file, &registry, &mut DirectorySink::new(dir.path())).unwrap();

        assert_eq!(std::fs::read(dir.path().join("report.bin")).unwrap(), vec![1, 2, 3]);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_repeated_downloads_do_not_leak_urls() {
        let dir = tempdir().unwrap();
        let registry = BlobRegistry::new();
        let file = FileAttachment::from_bytes("a.txt", b"abc", Some("text/plain".to_string()));
        let mut sink = FileSink::new(dir.path().join("out.txt"));

        for _ in 0..10 {
            download(&file, &registry, &mut sink).unwrap();
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_failed_save_still_revokes() {
        let registry = BlobRegistry::new();
        let file = FileAttachment::from_bytes("a.txt", b"abc", None);

        assert!(download(&file, &registry, &mut FailingSink).is_err());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_blob_mime_defaults_to_octet_stream() {
        let blob = Blob::from_attachment(&FileAttachment::from_bytes("x", b"1", None)).unwrap();
        assert_eq!(blob.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_directory_sink_strips_path_components() {
        let dir = tempdir().unwrap();
        let registry = BlobRegistry::new();
        let file = FileAttachment::from_bytes("../../evil.txt", b"x", None);

        download(&file, &registry, &mut DirectorySink::new(dir.path())).unwrap();
        assert!(dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_invalid_content_creates_no_url() {
        let registry = BlobRegistry::new();
        let file = FileAttachment::new("x", "@@@", None);
        assert!(download(&file, &registry, &mut FailingSink).is_err());
        assert_eq!(registry.live_count(), 0);
    }
}
