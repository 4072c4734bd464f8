//! Drawing surface abstraction and the frame renderer.
//!
//! The renderer only talks to [`Canvas`]. In the browser that is a 2d context
//! ([`web::WebCanvas`]); headless builds and tests use [`RecordingCanvas`].

mod cache;
mod palette;
mod recording;
mod renderer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use cache::{CloudShape, FontMetrics, RenderCache, CLOUD_PAD, CLOUD_SHAPES};
pub use palette::{Palette, Rgba};
pub use recording::{DrawOp, RecordedBitmap, RecordingCanvas};
pub use renderer::{draw_ground, draw_sky, FrameView, Renderer};

use crate::error::EngineError;

/// Linear gradient description, resolved into a backend handle once per cache build.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub stops: Vec<(f64, Rgba)>,
}

impl GradientSpec {
    pub fn vertical(top: f64, bottom: f64, stops: Vec<(f64, Rgba)>) -> Self {
        Self {
            x0: 0.0,
            y0: top,
            x1: 0.0,
            y1: bottom,
            stops,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// The subset of a 2d context the renderer needs.
///
/// Drawing calls never fail; a backend that loses its context reports it through
/// [`Canvas::is_context_lost`], which the engine checks before every frame.
pub trait Canvas: Sized {
    type Gradient;
    type Bitmap;

    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn is_context_lost(&self) -> bool;

    fn create_gradient(&mut self, spec: &GradientSpec) -> Result<Self::Gradient, EngineError>;

    /// Rasterizes `paint` into an offscreen bitmap of the given pixel size.
    fn create_bitmap(
        &mut self,
        width: u32,
        height: u32,
        paint: &mut dyn FnMut(&mut Self),
    ) -> Result<Self::Bitmap, EngineError>;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);

    fn global_alpha(&self) -> f64;
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_fill_color(&mut self, color: Rgba);
    fn set_fill_gradient(&mut self, gradient: &Self::Gradient);
    fn set_stroke(&mut self, color: Rgba, line_width: f64);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn draw_bitmap(&mut self, bitmap: &Self::Bitmap, x: f64, y: f64, w: f64, h: f64);

    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn measure_text(&mut self, text: &str) -> f64;
}
