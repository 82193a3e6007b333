pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod inference;
pub mod narrative;
pub mod overlay;
pub mod result_store;
pub mod sampler;
pub mod samples;
pub mod session;

pub use capture::{CameraDevice, CameraFacing, CapturedFrame, MediaCaptureManager};
pub use config::Configuration;
pub use controller::{CaptureMode, ControllerEvent, FrameSource, ModeController, ModeRequest};
pub use error::{AppError, CaptureError, InferenceError, NarrativeError};
pub use inference::{HttpInferenceClient, InferenceClient, InferenceDispatcher, InferenceResult};
pub use overlay::{map_detections, OverlayBox, RenderFit, RenderGeometry};
pub use result_store::ResultStore;
pub use sampler::FrameSampler;
pub use session::SessionId;
