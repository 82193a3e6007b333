pub mod device;
pub mod frame;
pub mod manager;

pub use device::{CameraDevice, CameraFacing, CameraStream};
pub use frame::CapturedFrame;
pub use manager::MediaCaptureManager;
