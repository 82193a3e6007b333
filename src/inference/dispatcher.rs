use crate::capture::CapturedFrame;
use crate::controller::ControllerEvent;
use crate::error::InferenceError;
use crate::inference::{InferenceClient, InferenceResult};
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Whether a submitted frame was dispatched or dropped by the single-flight
/// policy. A drop is expected back-pressure, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    DroppedBusy,
}

/// Completion of one classification request, tagged with the identity of
/// the frame that produced it so stale completions can be discarded.
#[derive(Debug)]
pub struct InferenceEvent {
    pub session_id: SessionId,
    pub sequence_id: u64,
    pub outcome: Result<InferenceResult, InferenceError>,
}

struct InFlight {
    session_id: SessionId,
    sequence_id: u64,
    issued_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

/// Owns the lifecycle of at most one outstanding request. New frames that
/// arrive while a request is in flight are dropped, never queued, which
/// bounds server load under the live cadence.
pub struct InferenceDispatcher {
    client: Arc<dyn InferenceClient>,
    events: mpsc::Sender<ControllerEvent>,
    in_flight: Option<InFlight>,
}

impl InferenceDispatcher {
    pub fn new(client: Arc<dyn InferenceClient>, events: mpsc::Sender<ControllerEvent>) -> Self {
        Self {
            client,
            events,
            in_flight: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn submit(&mut self, frame: CapturedFrame) -> SubmitOutcome {
        if let Some(in_flight) = &self.in_flight {
            debug!(
                "Dropping frame {}, request {} in flight since {}",
                frame.sequence_id, in_flight.sequence_id, in_flight.issued_at
            );
            return SubmitOutcome::DroppedBusy;
        }
        let session_id = frame.session_id;
        let sequence_id = frame.sequence_id;
        let client = self.client.clone();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let outcome = client.classify(&frame).await;
            let _ = events
                .send(ControllerEvent::Inference(InferenceEvent {
                    session_id,
                    sequence_id,
                    outcome,
                }))
                .await;
        });
        self.in_flight = Some(InFlight {
            session_id,
            sequence_id,
            issued_at: Utc::now(),
            task,
        });
        SubmitOutcome::Accepted
    }

    /// Clears the in-flight slot if `event` answers the outstanding
    /// request. Completions for other sessions leave the slot alone.
    pub fn complete(&mut self, event: &InferenceEvent) {
        if let Some(in_flight) = &self.in_flight {
            if in_flight.session_id == event.session_id
                && in_flight.sequence_id == event.sequence_id
            {
                self.in_flight = None;
            }
        }
    }

    /// Aborts the outstanding request, if any. Called when its session ends;
    /// the session check on delivery covers completions that raced the
    /// abort.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
            debug!(
                "Cancelled in-flight request {} of session {}",
                in_flight.sequence_id, in_flight.session_id
            );
        }
    }
}

impl Drop for InferenceDispatcher {
    fn drop(&mut self) {
        self.cancel();
    }
}
