//! Media types and their coarse classification.

use serde::{Deserialize, Serialize};

/// Coarse class of media content.
///
/// Transformers usually decide whether they can handle a source from its
/// kind alone (an image resizer takes every `image/*`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image content (PNG, JPEG, WebP, etc.)
    #[display("image")]
    Image,
    /// Audio content (MP3, WAV, OGG, etc.)
    #[display("audio")]
    Audio,
    /// Video content (MP4, WebM, etc.)
    #[display("video")]
    Video,
    /// Anything else (documents, archives, unknown bytes)
    #[display("other")]
    Other,
}

/// A MIME media type such as `image/png`.
///
/// Stored lowercase without parameters, so `Image/PNG; q=1` and `image/png`
/// are the same type.
///
/// # Examples
///
/// ```
/// use verso_core::{MediaKind, MediaType};
///
/// let mt = MediaType::new("Video/MP4; codecs=avc1");
/// assert_eq!(mt.as_str(), "video/mp4");
/// assert_eq!(mt.kind(), MediaKind::Video);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct MediaType(String);

const EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

impl MediaType {
    /// Fallback for bytes nothing else recognises.
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    /// Parse a MIME type, dropping parameters and normalising case.
    pub fn new(mime: impl AsRef<str>) -> Self {
        let essence = mime.as_ref().split(';').next().unwrap_or_default();
        Self(essence.trim().to_ascii_lowercase())
    }

    /// `application/octet-stream`.
    pub fn octet_stream() -> Self {
        Self(Self::OCTET_STREAM.to_string())
    }

    /// The MIME string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coarse classification from the top-level type.
    pub fn kind(&self) -> MediaKind {
        match self.0.split('/').next() {
            Some("image") => MediaKind::Image,
            Some("audio") => MediaKind::Audio,
            Some("video") => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Guess the type from a filename extension.
    ///
    /// ```
    /// use verso_core::MediaType;
    ///
    /// assert_eq!(MediaType::from_filename("clip.MP4").unwrap().as_str(), "video/mp4");
    /// assert!(MediaType::from_filename("README").is_none());
    /// ```
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, mime)| Self::new(mime))
    }

    /// Detect the type from leading magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        let mime = if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            "image/png"
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "image/jpeg"
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            "image/gif"
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            "image/webp"
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            "audio/wav"
        } else if data.len() >= 12 && &data[4..8] == b"ftyp" {
            iso_brand(&data[8..12])
        } else if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            "video/webm"
        } else if data.starts_with(b"ID3") || data.starts_with(&[0xFF, 0xFB]) {
            "audio/mpeg"
        } else if data.starts_with(b"%PDF-") {
            "application/pdf"
        } else {
            return None;
        };
        Some(Self::new(mime))
    }

    /// Declared type for uploaded bytes: content first, then filename,
    /// then `application/octet-stream`.
    pub fn detect(data: &[u8], filename: Option<&str>) -> Self {
        Self::sniff(data)
            .or_else(|| filename.and_then(Self::from_filename))
            .unwrap_or_else(Self::octet_stream)
    }
}

/// ISO base media files share the `ftyp` box; the major brand decides.
fn iso_brand(brand: &[u8]) -> &'static str {
    match brand {
        b"avif" | b"avis" => "image/avif",
        b"heic" | b"heix" | b"heim" | b"heis" => "image/heic",
        b"mif1" | b"msf1" => "image/heif",
        b"qt  " => "video/quicktime",
        b"M4A " | b"M4B " => "audio/mp4",
        _ => "video/mp4",
    }
}

impl From<&str> for MediaType {
    fn from(mime: &str) -> Self {
        Self::new(mime)
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mt = Self::new(s);
        match mt.0.split_once('/') {
            Some((top, sub)) if !top.is_empty() && !sub.is_empty() => Ok(mt),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}
