//! `CanvasRenderingContext2d` backend.

use std::cell::Cell;
use std::rc::Rc;

use log::{error, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Canvas, GradientSpec, Rgba, TextAlign};
use crate::error::EngineError;

pub struct WebCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    lost: Rc<Cell<bool>>,
    on_lost: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, EngineError> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or(EngineError::ContextUnavailable)
}

fn log_js(what: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!("{what} failed: {err:?}");
    }
}

impl WebCanvas {
    /// Wraps an on-page canvas. The backing store is sized to `width * dpr` by
    /// `height * dpr` and drawing happens in logical px.
    pub fn from_canvas(
        canvas: HtmlCanvasElement,
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    ) -> Result<Self, EngineError> {
        let ctx = context_2d(&canvas)?;
        let lost = Rc::new(Cell::new(false));

        let flag = lost.clone();
        let on_lost = Closure::wrap(Box::new(move |_: web_sys::Event| {
            error!("canvas context lost");
            flag.set(true);
        }) as Box<dyn FnMut(_)>);
        if canvas
            .add_event_listener_with_callback("contextlost", on_lost.as_ref().unchecked_ref())
            .is_err()
        {
            warn!("could not watch for context loss");
        }

        let mut web = Self {
            canvas,
            ctx,
            width,
            height,
            lost,
            on_lost: Some(on_lost),
        };
        web.resize(width, height, device_pixel_ratio);
        Ok(web)
    }

    fn offscreen(width: u32, height: u32) -> Result<Self, EngineError> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.create_element("canvas").ok())
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| EngineError::asset("bitmap", "cannot create offscreen canvas"))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = context_2d(&canvas)
            .map_err(|_| EngineError::asset("bitmap", "offscreen canvas has no 2d context"))?;
        Ok(Self {
            canvas,
            ctx,
            width: width as f64,
            height: height as f64,
            lost: Rc::new(Cell::new(false)),
            on_lost: None,
        })
    }

    /// Copies a decoded image into an offscreen bitmap at its natural size.
    pub fn bitmap_from_image(&self, image: &HtmlImageElement) -> Result<HtmlCanvasElement, EngineError> {
        let (w, h) = (image.natural_width(), image.natural_height());
        let src = image.src();
        if w == 0 || h == 0 {
            return Err(EngineError::asset(src, "image has no pixels"));
        }
        let offscreen = Self::offscreen(w, h)?;
        offscreen
            .ctx
            .draw_image_with_html_image_element(image, 0.0, 0.0)
            .map_err(|err| EngineError::asset(src, format!("{err:?}")))?;
        Ok(offscreen.canvas.clone())
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Resizes the backing store and resets the transform; previous content is gone.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        self.width = width;
        self.height = height;
        self.canvas.set_width((width * dpr).round().max(1.0) as u32);
        self.canvas.set_height((height * dpr).round().max(1.0) as u32);
        log_js("set_transform", self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0));
    }
}

impl Drop for WebCanvas {
    fn drop(&mut self) {
        if let Some(on_lost) = self.on_lost.take() {
            let _ = self
                .canvas
                .remove_event_listener_with_callback("contextlost", on_lost.as_ref().unchecked_ref());
        }
    }
}

impl Canvas for WebCanvas {
    type Gradient = CanvasGradient;
    type Bitmap = HtmlCanvasElement;

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn is_context_lost(&self) -> bool {
        self.lost.get()
    }

    fn create_gradient(&mut self, spec: &GradientSpec) -> Result<CanvasGradient, EngineError> {
        let gradient = self.ctx.create_linear_gradient(spec.x0, spec.y0, spec.x1, spec.y1);
        for (offset, color) in &spec.stops {
            gradient
                .add_color_stop(*offset as f32, &color.css())
                .map_err(|err| EngineError::asset("gradient", format!("{err:?}")))?;
        }
        Ok(gradient)
    }

    fn create_bitmap(
        &mut self,
        width: u32,
        height: u32,
        paint: &mut dyn FnMut(&mut Self),
    ) -> Result<HtmlCanvasElement, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::asset("bitmap", format!("cannot allocate {width}x{height}")));
        }
        let mut offscreen = Self::offscreen(width, height)?;
        paint(&mut offscreen);
        Ok(offscreen.canvas.clone())
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        log_js("translate", self.ctx.translate(x, y));
    }

    fn rotate(&mut self, radians: f64) {
        log_js("rotate", self.ctx.rotate(radians));
    }

    fn global_alpha(&self) -> f64 {
        self.ctx.global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
    }

    #[allow(deprecated)]
    fn set_fill_color(&mut self, color: Rgba) {
        self.ctx.set_fill_style(&JsValue::from_str(&color.css()));
    }

    #[allow(deprecated)]
    fn set_fill_gradient(&mut self, gradient: &CanvasGradient) {
        self.ctx.set_fill_style(gradient.as_ref());
    }

    #[allow(deprecated)]
    fn set_stroke(&mut self, color: Rgba, line_width: f64) {
        self.ctx.set_stroke_style(&JsValue::from_str(&color.css()));
        self.ctx.set_line_width(line_width);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ctx.quadratic_curve_to(cx, cy, x, y);
    }

    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        log_js("arc", self.ctx.arc(cx, cy, r.max(0.0), start, end));
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn draw_bitmap(&mut self, bitmap: &HtmlCanvasElement, x: f64, y: f64, w: f64, h: f64) {
        log_js(
            "draw_image",
            self.ctx
                .draw_image_with_html_canvas_element_and_dw_and_dh(bitmap, x, y, w, h),
        );
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        log_js("fill_text", self.ctx.fill_text(text, x, y));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(err) => {
                warn!("measure_text failed: {err:?}");
                0.0
            }
        }
    }
}
