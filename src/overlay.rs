use crate::inference::Detection;

/// Where and how the frame is drawn on screen. The renderer reports whether
/// it stretched the image to fill the element or aspect-fit it; letterboxing
/// derives a single uniform scale plus centering offsets.
#[derive(Debug, Clone, Copy)]
pub struct RenderGeometry {
    pub width: f32,
    pub height: f32,
    pub fit: RenderFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFit {
    /// Independent per-axis scaling; the image fills the element.
    Stretch,
    /// Uniform scale, image centered inside the element.
    Letterbox,
}

/// A detection rectangle in the coordinate space of the rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub confidence: f32,
}

/// Maps frame-pixel detections onto the rendered element. Coordinates
/// outside the native bounds are clamped, not dropped; confidence and label
/// pass through untouched.
pub fn map_detections(
    detections: &[Detection],
    native_width: u32,
    native_height: u32,
    render: &RenderGeometry,
) -> Vec<OverlayBox> {
    if native_width == 0 || native_height == 0 {
        return Vec::new();
    }
    let nw = native_width as f32;
    let nh = native_height as f32;
    let (scale_x, scale_y, offset_x, offset_y) = match render.fit {
        RenderFit::Stretch => (render.width / nw, render.height / nh, 0.0, 0.0),
        RenderFit::Letterbox => {
            let scale = (render.width / nw).min(render.height / nh);
            (
                scale,
                scale,
                (render.width - nw * scale) / 2.0,
                (render.height - nh * scale) / 2.0,
            )
        }
    };

    detections
        .iter()
        .map(|detection| {
            let x1 = detection.bbox.x1.clamp(0.0, nw);
            let y1 = detection.bbox.y1.clamp(0.0, nh);
            let x2 = detection.bbox.x2.clamp(0.0, nw);
            let y2 = detection.bbox.y2.clamp(0.0, nh);
            OverlayBox {
                x: x1 * scale_x + offset_x,
                y: y1 * scale_y + offset_y,
                width: (x2 - x1) * scale_x,
                height: (y2 - y1) * scale_y,
                label: detection.label.clone(),
                confidence: detection.confidence,
            }
        })
        .collect()
}
