use plantguard::config::Configuration;
use plantguard::controller::{ModeController, ModeRequest};
use plantguard::inference::HttpInferenceClient;
use plantguard::samples::{SampleCamera, SampleLibrary, SAMPLE_IMAGES};
use std::sync::Arc;
use tracing::{info, warn, Level};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

/// Demo wiring: a sample image stands in for camera hardware and streams
/// against the configured classification endpoint until ctrl-c.
#[tokio::main]
async fn main() {
    init_logging();
    let configuration = Configuration::default();

    let library = SampleLibrary::new(&configuration.samples_dir);
    let camera = match library.resolve(SAMPLE_IMAGES[1].file).await {
        Ok(bytes) => match SampleCamera::from_bytes(&bytes) {
            Ok(camera) => camera,
            Err(error) => {
                warn!("Sample image unreadable ({error}), using a synthetic frame");
                synthetic_camera()
            }
        },
        Err(error) => {
            warn!("No sample images ({error}), using a synthetic frame");
            synthetic_camera()
        }
    };

    let client = Arc::new(HttpInferenceClient::new(&configuration));
    match client.health().await {
        Ok(health) => info!(
            "Inference service {} (model loaded: {})",
            health.status, health.model_loaded
        ),
        Err(error) => warn!("Inference service health probe failed: {error}"),
    }

    let mut controller = ModeController::new(&configuration, Arc::new(camera), client);
    controller.switch_mode(ModeRequest::Live).await;

    tokio::select! {
        _ = controller.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    controller.shutdown();
}

fn synthetic_camera() -> SampleCamera {
    SampleCamera::new(image::DynamicImage::ImageRgb8(
        image::ImageBuffer::from_pixel(640, 480, image::Rgb([34, 139, 34])),
    ))
}
