pub mod client;
pub mod dispatcher;
pub mod wire;

pub use client::{HttpInferenceClient, InferenceClient};
pub use dispatcher::{InferenceDispatcher, InferenceEvent, SubmitOutcome};

/// A single whole-image classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

/// One localized detection, bbox in frame-pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// What the classification service answered, in either of its two shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
    Classification(Classification),
    Detections(Vec<Detection>),
}

impl From<wire::PredictResponse> for InferenceResult {
    fn from(payload: wire::PredictResponse) -> Self {
        match payload {
            wire::PredictResponse::Classification {
                predicted_class,
                confidence,
            } => InferenceResult::Classification(Classification {
                label: predicted_class,
                confidence,
            }),
            wire::PredictResponse::Detections { detections } => InferenceResult::Detections(
                detections
                    .into_iter()
                    .map(|d| Detection {
                        label: d.class_name,
                        confidence: d.confidence,
                        bbox: BoundingBox {
                            x1: d.bbox[0],
                            y1: d.bbox[1],
                            x2: d.bbox[2],
                            y2: d.bbox[3],
                        },
                    })
                    .collect(),
            ),
        }
    }
}
