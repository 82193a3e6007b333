use crate::capture::{CapturedFrame, MediaCaptureManager};
use crate::controller::ControllerEvent;
use crate::error::{AppError, CaptureError};
use crate::session::SessionId;
use bytes::Bytes;
use image::DynamicImage;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Drives the capture cadence. Single-shot sampling is `sample`; the live
/// mode runs a periodic tick task that is cancelled synchronously when the
/// owning session ends, so no tick outlives its session. The sampler also
/// owns the monotonic sequence counter stamped onto every frame.
pub struct FrameSampler {
    events: mpsc::Sender<ControllerEvent>,
    period: Duration,
    next_sequence: u64,
    cadence: Option<Cadence>,
}

struct Cadence {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl FrameSampler {
    pub fn new(events: mpsc::Sender<ControllerEvent>, period: Duration) -> Self {
        Self {
            events,
            period,
            next_sequence: 0,
            cadence: None,
        }
    }

    /// Starts the periodic cadence for `session_id`, first tick immediate.
    /// Any previous cadence is stopped first.
    pub fn start_periodic(&mut self, session_id: SessionId) {
        self.stop();
        let token = CancellationToken::new();
        let events = self.events.clone();
        let period = self.period;
        let tick_token = token.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = interval.tick() => {
                        if events.send(ControllerEvent::Tick { session_id }).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.cadence = Some(Cadence { token, task });
    }

    /// Cancels the periodic cadence. Safe to call when none is running.
    pub fn stop(&mut self) {
        if let Some(cadence) = self.cadence.take() {
            cadence.token.cancel();
            cadence.task.abort();
            debug!("Frame cadence stopped");
        }
    }

    /// Pulls the current frame and stamps it. A feed that is not ready yet
    /// is a skipped tick, not an error.
    pub fn sample(
        &mut self,
        capture: &mut MediaCaptureManager,
        session_id: SessionId,
    ) -> Result<Option<CapturedFrame>, AppError> {
        let image = match capture.current_frame() {
            Ok(image) => image,
            Err(CaptureError::NotReady) => {
                debug!("Skipping tick, camera feed not ready");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(self.stamp_image(&image, session_id)?))
    }

    pub fn stamp_image(
        &mut self,
        image: &DynamicImage,
        session_id: SessionId,
    ) -> Result<CapturedFrame, AppError> {
        let frame = CapturedFrame::from_image(image, self.next_sequence, session_id)?;
        self.next_sequence += 1;
        Ok(frame)
    }

    /// Stamps already-encoded bytes (file upload, sample image) into the
    /// same frame type the camera path produces.
    pub fn stamp_encoded(
        &mut self,
        bytes: Bytes,
        session_id: SessionId,
    ) -> Result<CapturedFrame, AppError> {
        let frame = CapturedFrame::from_encoded(bytes, self.next_sequence, session_id)?;
        self.next_sequence += 1;
        Ok(frame)
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
