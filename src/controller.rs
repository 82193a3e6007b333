use crate::capture::{CameraDevice, CameraFacing, CapturedFrame, MediaCaptureManager};
use crate::config::Configuration;
use crate::error::{AppError, CaptureError, InferenceError};
use crate::inference::{InferenceClient, InferenceDispatcher, InferenceEvent, SubmitOutcome};
use crate::result_store::ResultStore;
use crate::sampler::FrameSampler;
use crate::session::SessionId;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where the still frame held in `ResultReady` came from. Reset rules are
/// asymmetric: camera-origin states return to the camera preview, upload-
/// origin states return to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Camera,
    Upload,
}

/// The one mode the pipeline is in. Held frames live inside the variant so
/// "has an image" can never drift apart from the mode.
#[derive(Debug)]
pub enum CaptureMode {
    Idle,
    CameraPreview,
    LiveStreaming,
    UploadPreview,
    ResultReady {
        frame: CapturedFrame,
        source: FrameSource,
    },
}

impl CaptureMode {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureMode::Idle => "idle",
            CaptureMode::CameraPreview => "camera",
            CaptureMode::LiveStreaming => "live",
            CaptureMode::UploadPreview => "upload",
            CaptureMode::ResultReady { .. } => "result",
        }
    }
}

/// The three user-selectable modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Camera,
    Live,
    Upload,
}

/// Everything that reaches the controller asynchronously: cadence ticks and
/// inference completions. Both carry the session that issued them and are
/// ignored when that session has ended.
#[derive(Debug)]
pub enum ControllerEvent {
    Tick { session_id: SessionId },
    Inference(InferenceEvent),
}

enum ResetTarget {
    Camera,
    Live,
    Idle,
}

/// Top-level state machine. Owns every mutable component; the sampler and
/// dispatcher tasks only talk back through the event channel, so all
/// mutation happens on the single task driving `handle_event`.
pub struct ModeController {
    mode: CaptureMode,
    session_id: SessionId,
    facing: CameraFacing,
    capture: MediaCaptureManager,
    sampler: FrameSampler,
    dispatcher: InferenceDispatcher,
    store: ResultStore,
    last_error: Option<InferenceError>,
    events: mpsc::Receiver<ControllerEvent>,
}

impl ModeController {
    pub fn new(
        config: &Configuration,
        device: Arc<dyn CameraDevice>,
        client: Arc<dyn InferenceClient>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer_size);
        let session_id = SessionId::mint();
        Self {
            mode: CaptureMode::Idle,
            session_id,
            facing: CameraFacing::Environment,
            capture: MediaCaptureManager::new(device),
            sampler: FrameSampler::new(
                event_tx.clone(),
                Duration::from_millis(config.live_interval_ms),
            ),
            dispatcher: InferenceDispatcher::new(client, event_tx),
            store: ResultStore::new(session_id),
            last_error: None,
            events: event_rx,
        }
    }

    pub fn mode(&self) -> &CaptureMode {
        &self.mode
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn last_error(&self) -> Option<&InferenceError> {
        self.last_error.as_ref()
    }

    pub fn is_camera_held(&self) -> bool {
        self.capture.is_acquired()
    }

    pub fn is_analyzing(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// Ends the current session: cadence stopped, in-flight request
    /// cancelled, store cleared and rebound to a freshly minted id. Every
    /// transition goes through here, so a completion issued before the
    /// transition can never touch the state after it.
    fn begin_session(&mut self) {
        self.sampler.stop();
        self.dispatcher.cancel();
        self.session_id = SessionId::mint();
        self.store.begin_session(self.session_id);
        self.last_error = None;
    }

    pub async fn switch_mode(&mut self, request: ModeRequest) {
        info!("Switching mode: {} -> {request:?}", self.mode.name());
        self.begin_session();
        match request {
            ModeRequest::Camera => self.enter_camera_preview().await,
            ModeRequest::Live => self.enter_live().await,
            ModeRequest::Upload => {
                self.capture.release();
                self.mode = CaptureMode::UploadPreview;
            }
        }
    }

    /// Universal reset: back to the live-preview variant of the current
    /// mode, or to idle for upload-origin states.
    pub async fn reset(&mut self) {
        let target = match &self.mode {
            CaptureMode::LiveStreaming => ResetTarget::Live,
            CaptureMode::CameraPreview
            | CaptureMode::ResultReady {
                source: FrameSource::Camera,
                ..
            } => ResetTarget::Camera,
            CaptureMode::Idle
            | CaptureMode::UploadPreview
            | CaptureMode::ResultReady {
                source: FrameSource::Upload,
                ..
            } => ResetTarget::Idle,
        };
        self.begin_session();
        match target {
            ResetTarget::Live => self.enter_live().await,
            ResetTarget::Camera => self.enter_camera_preview().await,
            ResetTarget::Idle => {
                self.capture.release();
                self.mode = CaptureMode::Idle;
            }
        }
    }

    /// Stops everything and returns to idle. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.begin_session();
        self.capture.release();
        self.mode = CaptureMode::Idle;
    }

    async fn enter_camera_preview(&mut self) {
        match self.capture.acquire(self.facing).await {
            Ok(()) => self.mode = CaptureMode::CameraPreview,
            Err(error) => self.fall_back_to_upload(error),
        }
    }

    async fn enter_live(&mut self) {
        match self.capture.acquire(self.facing).await {
            Ok(()) => {
                self.sampler.start_periodic(self.session_id);
                self.mode = CaptureMode::LiveStreaming;
            }
            Err(error) => self.fall_back_to_upload(error),
        }
    }

    fn fall_back_to_upload(&mut self, error: CaptureError) {
        warn!("Camera unavailable ({error}), falling back to upload mode");
        self.capture.release();
        self.mode = CaptureMode::UploadPreview;
    }

    /// Takes a still in camera preview: the frame is held, the camera
    /// released. Ignored in any other mode.
    pub fn capture_photo(&mut self) -> Result<(), AppError> {
        if !matches!(self.mode, CaptureMode::CameraPreview) {
            debug!("Ignoring capture outside camera preview");
            return Ok(());
        }
        self.begin_session();
        let Some(frame) = self.sampler.sample(&mut self.capture, self.session_id)? else {
            // Feed not ready yet; stay in preview.
            return Ok(());
        };
        self.capture.release();
        self.mode = CaptureMode::ResultReady {
            frame,
            source: FrameSource::Camera,
        };
        Ok(())
    }

    /// Feeds uploaded (or sample) image bytes into the pipeline. Only valid
    /// in the upload-origin states.
    pub fn provide_upload(&mut self, bytes: Bytes) -> Result<(), AppError> {
        match self.mode {
            CaptureMode::UploadPreview
            | CaptureMode::ResultReady {
                source: FrameSource::Upload,
                ..
            } => {}
            _ => {
                debug!("Ignoring upload outside upload mode");
                return Ok(());
            }
        }
        self.begin_session();
        let frame = self.sampler.stamp_encoded(bytes, self.session_id)?;
        self.mode = CaptureMode::ResultReady {
            frame,
            source: FrameSource::Upload,
        };
        Ok(())
    }

    /// Dispatches the held still for classification. `None` when no frame
    /// is held.
    pub fn analyze(&mut self) -> Option<SubmitOutcome> {
        let frame = match &self.mode {
            CaptureMode::ResultReady { frame, .. } => frame.clone(),
            _ => {
                debug!("Ignoring analyze request, no frame held");
                return None;
            }
        };
        Some(self.dispatcher.submit(frame))
    }

    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events.recv().await
    }

    /// Event loop for the binary; no failure here is fatal.
    pub async fn run(&mut self) {
        while let Some(event) = self.next_event().await {
            if let Err(error) = self.handle_event(event) {
                warn!("Event handling failed: {error}");
            }
        }
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> Result<(), AppError> {
        match event {
            ControllerEvent::Tick { session_id } => self.handle_tick(session_id),
            ControllerEvent::Inference(event) => {
                self.handle_inference(event);
                Ok(())
            }
        }
    }

    fn handle_tick(&mut self, session_id: SessionId) -> Result<(), AppError> {
        if session_id != self.session_id || !matches!(self.mode, CaptureMode::LiveStreaming) {
            debug!("Ignoring tick from ended session {session_id}");
            return Ok(());
        }
        if let Some(frame) = self.sampler.sample(&mut self.capture, self.session_id)? {
            if self.dispatcher.submit(frame) == SubmitOutcome::DroppedBusy {
                debug!("Live frame dropped, request already in flight");
            }
        }
        Ok(())
    }

    fn handle_inference(&mut self, event: InferenceEvent) {
        self.dispatcher.complete(&event);
        if event.session_id != self.session_id {
            debug!("Discarding stale result for session {}", event.session_id);
            return;
        }
        match event.outcome {
            Ok(result) => {
                self.last_error = None;
                self.store.accept(event.session_id, event.sequence_id, result);
            }
            Err(error) => {
                warn!("Analysis failed: {error}");
                self.last_error = Some(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::device::testing::FakeDevice;
    use crate::inference::client::testing::FakeClient;
    use crate::inference::InferenceResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png_bytes() -> Bytes {
        let img = image::DynamicImage::ImageRgb8(image::ImageBuffer::from_pixel(
            8,
            8,
            image::Rgb([40, 160, 40]),
        ));
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    fn controller_with(
        device: FakeDevice,
        client: FakeClient,
    ) -> (ModeController, Arc<AtomicUsize>) {
        let opened = device.open_streams.clone();
        let controller =
            ModeController::new(&Configuration::default(), Arc::new(device), Arc::new(client));
        (controller, opened)
    }

    fn accepted_label(controller: &ModeController) -> Option<String> {
        match &controller.store().latest()?.result {
            InferenceResult::Classification(c) => Some(c.label.clone()),
            InferenceResult::Detections(_) => None,
        }
    }

    #[tokio::test]
    async fn permission_denied_falls_back_to_upload() {
        let (mut controller, _) = controller_with(
            FakeDevice::denying(CaptureError::PermissionDenied),
            FakeClient::answering("healthy"),
        );
        controller.switch_mode(ModeRequest::Camera).await;
        assert!(matches!(controller.mode(), CaptureMode::UploadPreview));
        assert!(!controller.is_camera_held());
    }

    #[tokio::test]
    async fn capture_photo_holds_frame_and_releases_camera() {
        let (mut controller, opened) =
            controller_with(FakeDevice::new(), FakeClient::answering("healthy"));
        controller.switch_mode(ModeRequest::Camera).await;
        assert!(controller.is_camera_held());

        controller.capture_photo().unwrap();
        assert!(matches!(
            controller.mode(),
            CaptureMode::ResultReady {
                source: FrameSource::Camera,
                ..
            }
        ));
        assert!(!controller.is_camera_held());
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_returns_to_the_source_preview() {
        let (mut controller, _) =
            controller_with(FakeDevice::new(), FakeClient::answering("healthy"));
        controller.switch_mode(ModeRequest::Camera).await;
        controller.capture_photo().unwrap();
        let held_session = controller.session_id();

        controller.reset().await;
        assert!(matches!(controller.mode(), CaptureMode::CameraPreview));
        assert_ne!(controller.session_id(), held_session);

        controller.switch_mode(ModeRequest::Upload).await;
        controller.provide_upload(png_bytes()).unwrap();
        controller.reset().await;
        assert!(matches!(controller.mode(), CaptureMode::Idle));
        assert!(!controller.is_camera_held());
    }

    #[tokio::test]
    async fn analyze_applies_result_to_the_issuing_session() {
        let (mut controller, _) =
            controller_with(FakeDevice::new(), FakeClient::answering("Tomato___Early_blight"));
        controller.switch_mode(ModeRequest::Upload).await;
        controller.provide_upload(png_bytes()).unwrap();

        assert_eq!(controller.analyze(), Some(SubmitOutcome::Accepted));
        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert_eq!(
            accepted_label(&controller).as_deref(),
            Some("Tomato___Early_blight")
        );
        assert!(!controller.is_analyzing());
    }

    #[tokio::test]
    async fn result_arriving_after_mode_switch_is_discarded() {
        let (mut controller, _) =
            controller_with(FakeDevice::new(), FakeClient::answering("stale"));
        controller.switch_mode(ModeRequest::Upload).await;
        controller.provide_upload(png_bytes()).unwrap();
        controller.analyze();

        // User switches to camera before the response lands.
        controller.switch_mode(ModeRequest::Camera).await;
        // The completion may still be sitting in the channel; it must not
        // touch the store.
        if let Ok(event) =
            tokio::time::timeout(Duration::from_millis(200), controller.next_event()).await
        {
            controller.handle_event(event.unwrap()).unwrap();
        }
        assert!(controller.store().latest().is_none());
        assert!(matches!(controller.mode(), CaptureMode::CameraPreview));
    }

    #[tokio::test]
    async fn transport_failure_surfaces_without_retry() {
        let (mut controller, _) =
            controller_with(FakeDevice::new(), FakeClient::answering("x").failing());
        controller.switch_mode(ModeRequest::Upload).await;
        controller.provide_upload(png_bytes()).unwrap();
        controller.analyze();

        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert!(matches!(
            controller.last_error(),
            Some(InferenceError::Transport(_))
        ));
        assert!(controller.store().latest().is_none());
        assert!(!controller.is_analyzing());
    }

    #[tokio::test(start_paused = true)]
    async fn live_cadence_drops_overlapping_request_then_recovers() {
        // 1000 ms cadence against a service that answers in 1500 ms: the
        // second tick is dropped, the third goes through.
        let client = FakeClient::answering("healthy").with_delay(Duration::from_millis(1500));
        let calls = client.calls.clone();
        let (mut controller, _) = controller_with(FakeDevice::new(), client);
        controller.switch_mode(ModeRequest::Live).await;

        // t=0: first tick dispatches.
        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert!(controller.is_analyzing());

        // t=1000: second tick dropped while the request is in flight.
        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // t=1500: the response lands and is accepted.
        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert_eq!(accepted_label(&controller).as_deref(), Some("healthy"));
        assert!(!controller.is_analyzing());

        // t=2000: the next tick proceeds normally.
        let event = controller.next_event().await.unwrap();
        controller.handle_event(event).unwrap();
        assert!(controller.is_analyzing());
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transition_storm_never_holds_two_streams() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let (mut controller, opened) =
            controller_with(FakeDevice::new(), FakeClient::answering("healthy"));
        // Seeded walk over every user-reachable transition; the one-stream
        // invariant must hold after each step.
        let mut rng = StdRng::seed_from_u64(0x5eed_1eaf);
        for _ in 0..200 {
            match rng.random_range(0..6) {
                0 => controller.switch_mode(ModeRequest::Camera).await,
                1 => controller.switch_mode(ModeRequest::Live).await,
                2 => controller.switch_mode(ModeRequest::Upload).await,
                3 => controller.reset().await,
                4 => controller.capture_photo().unwrap(),
                _ => controller.provide_upload(png_bytes()).unwrap(),
            }
            assert!(opened.load(Ordering::SeqCst) <= 1);
        }
        controller.shutdown();
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert!(matches!(controller.mode(), CaptureMode::Idle));
    }
}
