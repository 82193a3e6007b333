use crate::error::CaptureError;
use async_trait::async_trait;
use image::DynamicImage;

/// Which way the requested camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    #[default]
    Environment,
    User,
}

/// Platform seam for camera hardware. Opening is asynchronous because the
/// grant/denial decision may come from the user or the OS.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// A live feed. `snapshot` returns the current frame at native resolution or
/// `CaptureError::NotReady` if the feed has not produced one yet. `stop`
/// must halt every underlying track.
pub trait CameraStream: Send {
    fn snapshot(&mut self) -> Result<DynamicImage, CaptureError>;
    fn stop(&mut self);
}
