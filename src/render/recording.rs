use super::{Canvas, GradientSpec, Rgba, TextAlign};
use crate::error::EngineError;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    SetGlobalAlpha(f64),
    SetFillColor(Rgba),
    SetFillGradient,
    SetStroke(Rgba, f64),
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadraticTo(f64, f64, f64, f64),
    Arc { cx: f64, cy: f64, r: f64 },
    ClosePath,
    Fill,
    Stroke,
    DrawBitmap { x: f64, y: f64, w: f64, h: f64 },
    FillText(String),
}

/// Offscreen result of [`RecordingCanvas::create_bitmap`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBitmap {
    pub width: u32,
    pub height: u32,
    pub ops: usize,
}

/// Headless canvas that logs every call instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
    alpha: f64,
    alpha_stack: Vec<f64>,
    font_px: f64,
    context_lost: bool,
    pub fail_gradients: bool,
    pub fail_bitmaps: bool,
    pub bitmaps_created: usize,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            alpha: 1.0,
            alpha_stack: Vec::new(),
            font_px: 16.0,
            context_lost: false,
            fail_gradients: false,
            fail_bitmaps: false,
            bitmaps_created: 0,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}

/// Pulls the pixel size out of a CSS font shorthand such as `bold 28px sans-serif`.
fn font_size(font: &str) -> Option<f64> {
    font.split_whitespace()
        .find_map(|part| part.strip_suffix("px")?.parse().ok())
}

impl Canvas for RecordingCanvas {
    type Gradient = GradientSpec;
    type Bitmap = RecordedBitmap;

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn create_gradient(&mut self, spec: &GradientSpec) -> Result<GradientSpec, EngineError> {
        if self.fail_gradients {
            return Err(EngineError::asset("gradient", "backend refused gradient"));
        }
        Ok(spec.clone())
    }

    fn create_bitmap(
        &mut self,
        width: u32,
        height: u32,
        paint: &mut dyn FnMut(&mut Self),
    ) -> Result<RecordedBitmap, EngineError> {
        if self.fail_bitmaps || width == 0 || height == 0 {
            return Err(EngineError::asset("bitmap", format!("cannot allocate {width}x{height}")));
        }
        let mut offscreen = RecordingCanvas::new(width as f64, height as f64);
        paint(&mut offscreen);
        self.bitmaps_created += 1;
        Ok(RecordedBitmap {
            width,
            height,
            ops: offscreen.ops.len(),
        })
    }

    fn save(&mut self) {
        self.alpha_stack.push(self.alpha);
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if let Some(alpha) = self.alpha_stack.pop() {
            self.alpha = alpha;
        }
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate(x, y));
    }

    fn rotate(&mut self, radians: f64) {
        self.ops.push(DrawOp::Rotate(radians));
    }

    fn global_alpha(&self) -> f64 {
        self.alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
        self.ops.push(DrawOp::SetGlobalAlpha(self.alpha));
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.ops.push(DrawOp::SetFillColor(color));
    }

    fn set_fill_gradient(&mut self, _gradient: &GradientSpec) {
        self.ops.push(DrawOp::SetFillGradient);
    }

    fn set_stroke(&mut self, color: Rgba, line_width: f64) {
        self.ops.push(DrawOp::SetStroke(color, line_width));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::FillRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(x, y));
    }

    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ops.push(DrawOp::QuadraticTo(cx, cy, x, y));
    }

    fn arc(&mut self, cx: f64, cy: f64, r: f64, _start: f64, _end: f64) {
        self.ops.push(DrawOp::Arc { cx, cy, r });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn draw_bitmap(&mut self, _bitmap: &RecordedBitmap, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::DrawBitmap { x, y, w, h });
    }

    fn set_font(&mut self, font: &str) {
        if let Some(px) = font_size(font) {
            self.font_px = px;
        }
    }

    fn set_text_align(&mut self, _align: TextAlign) {}

    fn fill_text(&mut self, text: &str, _x: f64, _y: f64) {
        self.ops.push(DrawOp::FillText(text.to_string()));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_px * 0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_brings_back_alpha() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.save();
        canvas.set_global_alpha(0.3);
        canvas.restore();
        assert_eq!(canvas.global_alpha(), 1.0);
    }

    #[test]
    fn font_size_parsing() {
        assert_eq!(font_size("bold 28px sans-serif"), Some(28.0));
        assert_eq!(font_size("serif"), None);
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.set_font("10px monospace");
        assert_eq!(canvas.measure_text("abcd"), 24.0);
    }

    #[test]
    fn bitmaps_count_offscreen_ops() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        let bitmap = canvas
            .create_bitmap(8, 8, &mut |c| {
                c.fill_rect(0.0, 0.0, 8.0, 8.0);
                c.fill_rect(1.0, 1.0, 2.0, 2.0);
            })
            .unwrap();
        assert_eq!(bitmap.ops, 2);
        assert!(canvas.ops().is_empty());
    }
}
