use crate::capture::{CameraDevice, CameraFacing, CameraStream};
use crate::error::{AppError, CaptureError};
use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use std::path::PathBuf;

/// The bundled demo images offered alongside file upload.
pub struct SampleImage {
    pub name: &'static str,
    pub file: &'static str,
}

pub const SAMPLE_IMAGES: [SampleImage; 3] = [
    SampleImage {
        name: "Bacterial Leaf Spot",
        file: "leaf_bacterial.jpg",
    },
    SampleImage {
        name: "Healthy Leaf",
        file: "leaf_healthy.jpg",
    },
    SampleImage {
        name: "Powdery Mildew",
        file: "leaf_mildew.jpg",
    },
];

/// Resolves named sample images to raw bytes. A resolved sample enters the
/// pipeline exactly like a user-selected file.
pub struct SampleLibrary {
    root: PathBuf,
}

impl SampleLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn resolve(&self, file: &str) -> Result<Bytes, AppError> {
        let bytes = tokio::fs::read(self.root.join(file)).await?;
        Ok(Bytes::from(bytes))
    }
}

/// A `CameraDevice` that replays one still image as its live feed. Used by
/// the demo binary and wherever real hardware is absent.
pub struct SampleCamera {
    image: DynamicImage,
}

impl SampleCamera {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self {
            image: image::load_from_memory(bytes)?,
        })
    }
}

#[async_trait]
impl CameraDevice for SampleCamera {
    async fn open(&self, _facing: CameraFacing) -> Result<Box<dyn CameraStream>, CaptureError> {
        Ok(Box::new(SampleStream {
            image: Some(self.image.clone()),
        }))
    }
}

struct SampleStream {
    image: Option<DynamicImage>,
}

impl CameraStream for SampleStream {
    fn snapshot(&mut self) -> Result<DynamicImage, CaptureError> {
        self.image.clone().ok_or(CaptureError::NotReady)
    }

    fn stop(&mut self) {
        self.image = None;
    }
}
