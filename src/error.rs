use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Inference Error: {0}")]
    Inference(#[from] InferenceError),
    #[error("Narrative Error: {0}")]
    Narrative(#[from] NarrativeError),
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("Sample image unavailable: {0}")]
    SampleUnavailable(#[from] std::io::Error),
}

/// Camera acquisition and frame extraction failures. `PermissionDenied` and
/// `DeviceUnavailable` trigger the fallback to upload mode; `NotReady` means
/// the feed has no frame yet and the caller should skip this attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera access denied")]
    PermissionDenied,
    #[error("No camera device available")]
    DeviceUnavailable,
    #[error("Camera feed not ready")]
    NotReady,
}

/// Failures of a classification request. None of these are retried
/// automatically; a retry is a fresh user- or timer-triggered submission.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Inference service returned status {0}")]
    HttpStatus(u16),
    #[error("Malformed inference response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("No API key configured for the narrative service")]
    MissingApiKey,
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Malformed completion response: {0}")]
    Malformed(String),
}
