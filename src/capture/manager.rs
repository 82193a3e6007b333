use crate::capture::device::{CameraDevice, CameraFacing, CameraStream};
use crate::error::CaptureError;
use image::DynamicImage;
use std::sync::Arc;
use tracing::info;

/// Exclusive owner of the camera resource. At most one stream is open at any
/// time; `release` stops every track and is safe to call repeatedly, and the
/// stream is also stopped when the manager is dropped.
pub struct MediaCaptureManager {
    device: Arc<dyn CameraDevice>,
    stream: Option<ActiveStream>,
}

struct ActiveStream {
    facing: CameraFacing,
    stream: Box<dyn CameraStream>,
}

impl MediaCaptureManager {
    pub fn new(device: Arc<dyn CameraDevice>) -> Self {
        Self {
            device,
            stream: None,
        }
    }

    /// Opens the camera. Idempotent when already holding a stream with the
    /// same facing; a different facing releases the old stream first so two
    /// streams are never held at once.
    pub async fn acquire(&mut self, facing: CameraFacing) -> Result<(), CaptureError> {
        if let Some(active) = &self.stream {
            if active.facing == facing {
                return Ok(());
            }
            self.release();
        }
        let stream = self.device.open(facing).await?;
        info!("Camera acquired ({facing:?})");
        self.stream = Some(ActiveStream { facing, stream });
        Ok(())
    }

    pub fn is_acquired(&self) -> bool {
        self.stream.is_some()
    }

    /// Synchronous snapshot of the live feed at native resolution.
    pub fn current_frame(&mut self) -> Result<DynamicImage, CaptureError> {
        match &mut self.stream {
            Some(active) => active.stream.snapshot(),
            None => Err(CaptureError::NotReady),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut active) = self.stream.take() {
            active.stream.stop();
            info!("Camera released");
        }
    }
}

impl Drop for MediaCaptureManager {
    fn drop(&mut self) {
        self.release();
    }
}
