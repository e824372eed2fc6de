//! Screenshot upload acceptance.

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ImageFormat, ScreenshotRef};

/// Gate in front of screenshot reviews: size and format checks.
#[derive(Debug, Clone, Copy)]
pub struct ScreenshotIngest {
    max_bytes: usize,
}

impl ScreenshotIngest {
    pub const fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Accept raw upload bytes as a screenshot reference.
    pub fn accept(&self, bytes: &[u8]) -> DomainResult<ScreenshotRef> {
        if bytes.is_empty() {
            return Err(DomainError::Input("screenshot is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(DomainError::Input(format!(
                "screenshot is {} bytes, the limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        let format = ImageFormat::sniff(bytes).ok_or_else(|| {
            DomainError::Input("screenshot must be a PNG or JPEG image".to_string())
        })?;

        let image = ScreenshotRef::from_bytes(format, bytes);
        debug!(
            format = image.media_type(),
            bytes = image.byte_len,
            fingerprint = image.fingerprint.short(),
            "Accepted screenshot"
        );
        Ok(image)
    }
}
