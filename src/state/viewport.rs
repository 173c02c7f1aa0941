//! Zoom and pan of the rendered table. Purely presentational; shares no
//! state with the edit snapshot.

pub const MAX_SCALE: f64 = 3.0;
pub const FALLBACK_MIN_SCALE: f64 = 0.5;
const ZOOM_IN_FACTOR: f64 = 1.02;
const ZOOM_OUT_FACTOR: f64 = 0.98;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset: (f64, f64),
    drag_origin: Option<(f64, f64)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: (0.0, 0.0),
            drag_origin: None,
        }
    }
}

/// Smallest scale that still makes sense for a table of `content_width`
/// shown in `container_width`.
pub fn min_scale(container_width: Option<f64>, content_width: Option<f64>) -> f64 {
    match (container_width, content_width) {
        (Some(container), Some(content)) if content > 0.0 => (container / content).min(0.9),
        _ => FALLBACK_MIN_SCALE,
    }
}

impl Viewport {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Ctrl+wheel zoom. Returns false when the event is not a zoom gesture.
    pub fn wheel(&mut self, delta_y: f64, ctrl: bool, min_scale: f64) -> bool {
        if !ctrl {
            return false;
        }
        let factor = if delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            ZOOM_IN_FACTOR
        };
        self.scale = (self.scale * factor).max(min_scale).min(MAX_SCALE);
        true
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_IN_FACTOR).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self, min_scale: f64) {
        self.scale = (self.scale * ZOOM_OUT_FACTOR).max(min_scale);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_origin = Some((x - self.offset.0, y - self.offset.1));
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some((ox, oy)) = self.drag_origin {
            self.offset = (x - ox, y - oy);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn transform_style(&self) -> String {
        format!(
            "transform: translate({}px, {}px) scale({}); transform-origin: 0 0;",
            self.offset.0, self.offset.1, self.scale
        )
    }
}
