use crate::session::SessionId;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// An immutable snapshot handed to the dispatcher. `bytes` holds the encoded
/// image (PNG for camera frames, as-provided for uploads); cloning is cheap
/// because `Bytes` shares the buffer.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub sequence_id: u64,
    pub session_id: SessionId,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    pub fn from_image(
        image: &DynamicImage,
        sequence_id: u64,
        session_id: SessionId,
    ) -> Result<Self, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(Self {
            bytes: Bytes::from(buffer.into_inner()),
            width: image.width(),
            height: image.height(),
            sequence_id,
            session_id,
            captured_at: Utc::now(),
        })
    }

    /// Wraps already-encoded image bytes (file upload, sample image),
    /// decoding only to learn the native dimensions.
    pub fn from_encoded(
        bytes: Bytes,
        sequence_id: u64,
        session_id: SessionId,
    ) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            bytes,
            sequence_id,
            session_id,
            captured_at: Utc::now(),
        })
    }
}
