//! Uploaded screenshots and content fingerprints.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 hex digest of raw input, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint several byte strings as one input.
    ///
    /// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn of_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    const PNG_MAGIC: &'static [u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: &'static [u8] = &[0xFF, 0xD8, 0xFF];

    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(Self::PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(Self::JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// An accepted screenshot, ready to hand to the review oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotRef {
    pub format: ImageFormat,
    pub base64_data: String,
    pub fingerprint: Fingerprint,
    pub byte_len: usize,
}

impl ScreenshotRef {
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Self {
        Self {
            format,
            base64_data: BASE64.encode(bytes),
            fingerprint: Fingerprint::of_bytes(bytes),
            byte_len: bytes.len(),
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.base64_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = Fingerprint::of_bytes(b"abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fp.short().len(), 12);
    }

    #[test]
    fn test_fingerprint_parts_are_length_prefixed() {
        let a = Fingerprint::of_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = Fingerprint::of_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sniff() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageFormat::sniff(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(&[]), None);
    }

    #[test]
    fn test_data_url() {
        let shot = ScreenshotRef::from_bytes(ImageFormat::Png, b"hi");
        assert_eq!(shot.data_url(), "data:image/png;base64,aGk=");
        assert_eq!(shot.byte_len, 2);
    }
}
