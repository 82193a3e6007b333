use serde::Deserialize;

/// JSON shapes of the classification endpoint. The service answers with
/// either a single predicted class or a detection list; which field is
/// present selects the variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Detections { detections: Vec<DetectionPayload> },
    Classification { predicted_class: String, confidence: f32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionPayload {
    pub class_name: String,
    #[serde(default)]
    pub class_id: i64,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceResult;

    #[test]
    fn decodes_classification_shape() {
        let raw = r#"{"predicted_class": "Tomato___Early_blight", "confidence": 0.93}"#;
        let payload: PredictResponse = serde_json::from_str(raw).unwrap();
        match InferenceResult::from(payload) {
            InferenceResult::Classification(c) => {
                assert_eq!(c.label, "Tomato___Early_blight");
                assert!((c.confidence - 0.93).abs() < 1e-6);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_detection_shape() {
        let raw = r#"{"detections": [
            {"class_name": "leaf_rust", "class_id": 2, "confidence": 0.81,
             "bbox": [100.0, 100.0, 300.0, 300.0]}
        ]}"#;
        let payload: PredictResponse = serde_json::from_str(raw).unwrap();
        match InferenceResult::from(payload) {
            InferenceResult::Detections(detections) => {
                assert_eq!(detections.len(), 1);
                assert_eq!(detections[0].label, "leaf_rust");
                assert_eq!(detections[0].bbox.x2, 300.0);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_health_payload() {
        let raw = r#"{"status": "online", "message": "Object Detection API running", "model_loaded": true}"#;
        let health: HealthResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(health.status, "online");
        assert!(health.model_loaded);
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let raw = r#"{"surprise": true}"#;
        assert!(serde_json::from_str::<PredictResponse>(raw).is_err());
    }
}
