//! Attachment and content category types

use crate::error::{AttachmentError, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base64 engine that accepts missing padding, the way browsers decode.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// MIME type used for downloads when the attachment carries none
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Content category an attachment is classified into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Image,
    Html,
    Mermaid,
    Csv,
    Text,
    /// Download-only, no inline render
    Binary,
}

impl Category {
    /// Categories that render inside a sandboxed frame
    pub fn is_sandboxed(self) -> bool {
        matches!(self, Self::Html | Self::Mermaid)
    }

    /// Categories whose content is decoded as text for display
    pub fn is_text_like(self) -> bool {
        matches!(self, Self::Html | Self::Mermaid | Self::Csv | Self::Text)
    }
}

/// A named, optionally typed blob of base64 content attached to a message.
///
/// Immutable once received. Content is only decoded on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    /// Base64-encoded bytes
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileAttachment {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_type,
        }
    }

    /// Build an attachment from raw bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8], mime_type: Option<String>) -> Self {
        Self::new(name, LENIENT_BASE64.encode(bytes), mime_type)
    }

    /// Read a local file into an attachment, guessing its MIME type from the path
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());
        Ok(Self::from_bytes(name, &bytes, mime_type))
    }

    /// Lower-cased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// MIME type for blobs built from this attachment
    pub fn blob_mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(FALLBACK_MIME_TYPE)
    }

    /// Decode the base64 content into bytes
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        let cleaned: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        LENIENT_BASE64.decode(cleaned).map_err(|e| {
            AttachmentError::InvalidBase64 {
                name: self.name.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Decode the content as UTF-8 text
    pub fn decode_text(&self) -> Result<String> {
        let bytes = self.decode_bytes()?;
        String::from_utf8(bytes).map_err(|_| AttachmentError::NotUtf8(self.name.clone()).into())
    }

    /// Decode as text, replacing invalid sequences. `None` when not base64 at all.
    pub fn decode_text_lossy(&self) -> Option<String> {
        self.decode_bytes()
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// `data:` URL for inline image surfaces
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.blob_mime_type(), self.content)
    }
}

/// Lower-cased extension of a file name
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_base64() {
        let file = FileAttachment::from_bytes("notes.txt", b"hello\nworld", None);
        assert_eq!(file.decode_text().unwrap(), "hello\nworld");
        assert_eq!(file.blob_mime_type(), FALLBACK_MIME_TYPE);
    }

    #[test]
    fn test_decode_tolerates_whitespace_and_missing_padding() {
        // "hi" is "aGk=" with padding
        let file = FileAttachment::new("a.txt", "aG\nk", None);
        assert_eq!(file.decode_bytes().unwrap(), b"hi");
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        let file = FileAttachment::new("a.txt", "***", None);
        assert!(file.decode_bytes().is_err());
        assert!(file.decode_text_lossy().is_none());
    }

    #[test]
    fn test_non_utf8_text() {
        let file = FileAttachment::from_bytes("a.bin", &[0xff, 0xfe, 0x41], None);
        assert!(matches!(
            file.decode_text(),
            Err(crate::Error::Attachment(AttachmentError::NotUtf8(_)))
        ));
        assert!(file.decode_text_lossy().unwrap().ends_with('A'));
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html></html>").unwrap();

        let file = FileAttachment::from_path(&path).unwrap();
        assert_eq!(file.name, "page.html");
        assert_eq!(file.mime_type.as_deref(), Some("text/html"));
        assert_eq!(file.decode_text().unwrap(), "<html></html>");
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(extension_of("Report.CSV").as_deref(), Some("csv"));
        assert_eq!(extension_of("Makefile"), None);
    }

    #[test]
    fn test_serde_wire_format() {
        let json = r#"{"name":"a.png","content":"AA==","mime_type":"image/png"}"#;
        let file: FileAttachment = serde_json::from_str(json).unwrap();
        assert_eq!(file.mime_type.as_deref(), Some("image/png"));
        assert_eq!(file.data_url(), "data:image/png;base64,AA==");
    }
}
