//! Frame composition, back to front.
//!
//! Everything here borrows engine state immutably. Per-frame work is limited to
//! placing cached resources and a handful of vector shapes.

use super::cache::{BANNER_FONT, SCORE_FONT};
use super::{Canvas, Palette, RenderCache, TextAlign};
use crate::assets::Icons;
use crate::config::GameConfig;
use crate::entities::{
    BgLayers, Bird, Building, BuildingKind, Cloud, DecoKind, GroundDeco, Pipe, Plane,
    SkylineSegment, Tree, TreeKind,
};
use crate::game::{EngineState, GameState};
use crate::math::{lerp, trace_rounded_rect, TAU};

const ACCENT_HEIGHT: f64 = 12.0;
const PIPE_CAP_HEIGHT: f64 = 22.0;
const PIPE_CAP_OVERHANG: f64 = 4.0;
const ICON_SIZE: f64 = 28.0;
const ICON_GAP: f64 = 8.0;
const SCORE_TOP: f64 = 56.0;
const BANNER_PAD_X: f64 = 22.0;
const BANNER_HEIGHT: f64 = 52.0;

/// Everything one frame reads.
pub struct FrameView<'a, B> {
    pub config: &'a GameConfig,
    pub state: &'a EngineState,
    pub prev_bird: &'a Bird,
    /// Interpolation fraction from the loop, `[0, 1)`.
    pub alpha: f64,
    pub layers: &'a BgLayers,
    pub icons: &'a Icons<B>,
}

impl<B> FrameView<'_, B> {
    /// The bird blended between the last two fixed steps.
    pub fn bird(&self) -> Bird {
        let cur = &self.state.bird;
        let t = self.alpha.clamp(0.0, 1.0);
        Bird {
            y: lerp(self.prev_bird.y, cur.y, t),
            vy: cur.vy,
            rotation: lerp(self.prev_bird.rotation, cur.rotation, t),
        }
    }
}

pub struct Renderer<'a, C: Canvas> {
    cache: &'a RenderCache<C>,
}

impl<'a, C: Canvas> Renderer<'a, C> {
    pub fn new(cache: &'a RenderCache<C>) -> Self {
        Self { cache }
    }

    pub fn draw_frame(&self, canvas: &mut C, view: &FrameView<'_, C::Bitmap>) {
        let palette = &self.cache.palette;
        let config = view.config;
        let layers = view.layers;

        let (width, height) = (canvas.width(), canvas.height());
        draw_sky(canvas, self.cache.sky.as_ref(), width, height);

        self.draw_clouds(canvas, &layers.far_clouds);
        for plane in &layers.planes {
            draw_plane(canvas, palette, plane);
        }
        for segment in &layers.skyline {
            draw_skyline(canvas, palette, config.ground_y(), segment);
        }
        self.draw_clouds(canvas, &layers.mid_clouds);
        for building in &layers.buildings {
            draw_building(canvas, palette, config.ground_y(), building);
        }
        for tree in &layers.trees {
            draw_tree(canvas, palette, config.ground_y(), tree);
        }

        for pipe in &view.state.pipes {
            self.draw_pipe(canvas, config, pipe);
        }

        draw_ground(
            canvas,
            palette,
            config,
            Some(layers.ground_deco.as_slice()),
            self.cache.ground_accent.as_ref(),
        );

        draw_bird(canvas, palette, config, &view.bird());
        self.draw_hud(canvas, view);
    }

    /// Clouds only ever come from prerendered bitmaps.
    fn draw_clouds(&self, canvas: &mut C, clouds: &[Cloud]) {
        let base = canvas.global_alpha();
        for cloud in clouds {
            let Some(sprite) = cloud.sprite else { continue };
            let Some(bitmap) = self.cache.cloud_bitmap(&sprite) else {
                continue;
            };
            let pad = sprite.pad * cloud.scale;
            canvas.set_global_alpha(base * cloud.alpha);
            canvas.draw_bitmap(
                bitmap,
                cloud.x - pad,
                cloud.y - pad,
                (sprite.logical_w + sprite.pad * 2.0) * cloud.scale,
                (sprite.logical_h + sprite.pad * 2.0) * cloud.scale,
            );
        }
        canvas.set_global_alpha(base);
    }

    fn draw_pipe(&self, canvas: &mut C, config: &GameConfig, pipe: &Pipe) {
        let palette = &self.cache.palette;
        let w = config.pipe_width;
        let top = pipe.gap_top();
        let bottom = pipe.gap_bottom();
        let ground_y = config.ground_y();

        // gradient runs 0..pipe_width, so draw in pipe-local space
        canvas.save();
        canvas.translate(pipe.x, 0.0);
        match &self.cache.pipe_body {
            Some(gradient) => canvas.set_fill_gradient(gradient),
            None => canvas.set_fill_color(palette.pipe),
        }
        canvas.fill_rect(0.0, 0.0, w, top);
        canvas.fill_rect(0.0, bottom, w, (ground_y - bottom).max(0.0));

        canvas.set_fill_color(palette.pipe_cap);
        let cap_w = w + PIPE_CAP_OVERHANG * 2.0;
        canvas.fill_rect(-PIPE_CAP_OVERHANG, top - PIPE_CAP_HEIGHT, cap_w, PIPE_CAP_HEIGHT);
        canvas.fill_rect(-PIPE_CAP_OVERHANG, bottom, cap_w, PIPE_CAP_HEIGHT);
        canvas.restore();
    }

    fn draw_hud(&self, canvas: &mut C, view: &FrameView<'_, C::Bitmap>) {
        let palette = &self.cache.palette;
        let fonts = &self.cache.fonts;
        let width = view.config.width;
        let state = view.state.state;

        if state != GameState::Idle {
            let text = view.state.score.to_string();
            let text_w = fonts.digit_width * text.len() as f64;
            canvas.set_font(SCORE_FONT);
            canvas.set_text_align(TextAlign::Center);
            shadowed_text(canvas, palette, &text, width / 2.0, SCORE_TOP);

            let icon_x = width / 2.0 - text_w / 2.0 - ICON_GAP - ICON_SIZE;
            let icon_y = SCORE_TOP - ICON_SIZE + 2.0;
            match view.icons.cheese.bitmap() {
                Some(icon) => canvas.draw_bitmap(icon, icon_x, icon_y, ICON_SIZE, ICON_SIZE),
                None => draw_cheese_fallback(canvas, palette, icon_x, icon_y, ICON_SIZE),
            }
        }

        let (text, text_w) = match state {
            GameState::Idle => (&view.config.banner.idle, fonts.idle_banner_width),
            GameState::Paused => (&view.config.banner.paused, fonts.paused_banner_width),
            GameState::Dead => (&view.config.banner.dead, fonts.dead_banner_width),
            GameState::Play => return,
        };
        let with_icon = state == GameState::Dead;
        let content_w = if with_icon {
            text_w + ICON_GAP + ICON_SIZE
        } else {
            text_w
        };
        let panel_w = content_w + BANNER_PAD_X * 2.0;
        let panel_x = (width - panel_w) / 2.0;
        let panel_y = view.config.ground_y() * 0.38;

        canvas.set_fill_color(palette.text_shadow);
        trace_rounded_rect(canvas, panel_x, panel_y, panel_w, BANNER_HEIGHT, 12.0);
        canvas.fill();

        let text_left = panel_x + BANNER_PAD_X;
        let baseline = panel_y + BANNER_HEIGHT / 2.0 + 9.0;
        canvas.set_font(BANNER_FONT);
        canvas.set_text_align(TextAlign::Left);
        shadowed_text(canvas, palette, text, text_left, baseline);

        if with_icon {
            let icon_x = text_left + text_w + ICON_GAP;
            let icon_y = panel_y + (BANNER_HEIGHT - ICON_SIZE) / 2.0;
            match view.icons.heart.bitmap() {
                Some(icon) => canvas.draw_bitmap(icon, icon_x, icon_y, ICON_SIZE, ICON_SIZE),
                None => draw_heart_fallback(canvas, palette, icon_x, icon_y, ICON_SIZE),
            }
        }
    }
}

/// Fills the whole surface with the sky gradient. Without one, nothing is drawn.
pub fn draw_sky<C: Canvas>(canvas: &mut C, sky: Option<&C::Gradient>, width: f64, height: f64) {
    if let Some(gradient) = sky {
        canvas.set_fill_gradient(gradient);
        canvas.fill_rect(0.0, 0.0, width, height);
    }
}

/// Ground strip, its decoration and the accent band along the top edge.
///
/// Leaves global alpha at 1 whatever was drawn.
pub fn draw_ground<C: Canvas>(
    canvas: &mut C,
    palette: &Palette,
    config: &GameConfig,
    deco: Option<&[GroundDeco]>,
    accent: Option<&C::Gradient>,
) {
    let ground_y = config.ground_y();
    canvas.set_fill_color(palette.ground);
    canvas.fill_rect(0.0, ground_y, config.width, config.ground_height);

    if let Some(deco) = deco.filter(|d| !d.is_empty()) {
        canvas.set_fill_color(palette.ground_deco);
        for d in deco {
            canvas.set_global_alpha(d.alpha);
            match d.kind {
                DecoKind::Dash => trace_rounded_rect(canvas, d.x, d.y, d.w, d.h, d.h / 2.0),
                DecoKind::Dot => {
                    canvas.begin_path();
                    canvas.arc(d.x + d.w / 2.0, d.y + d.h / 2.0, d.w / 2.0, 0.0, TAU);
                }
            }
            canvas.fill();
        }
    }
    canvas.set_global_alpha(1.0);

    if let Some(gradient) = accent {
        canvas.set_fill_gradient(gradient);
        canvas.fill_rect(0.0, ground_y, config.width, ACCENT_HEIGHT);
    }
}

fn draw_plane<C: Canvas>(canvas: &mut C, palette: &Palette, plane: &Plane) {
    let h = plane.w * 0.18;
    canvas.set_fill_color(palette.plane);
    trace_rounded_rect(canvas, plane.x, plane.y, plane.w, h, h / 2.0);
    canvas.fill();

    canvas.begin_path();
    canvas.move_to(plane.x + plane.w * 0.35, plane.y + h / 2.0);
    canvas.line_to(plane.x + plane.w * 0.6, plane.y + h * 2.2);
    canvas.line_to(plane.x + plane.w * 0.7, plane.y + h / 2.0);
    canvas.close_path();
    canvas.fill();

    // tail fin
    canvas.begin_path();
    canvas.move_to(plane.x + plane.w * 0.82, plane.y);
    canvas.line_to(plane.x + plane.w, plane.y - h * 1.4);
    canvas.line_to(plane.x + plane.w, plane.y + h / 2.0);
    canvas.close_path();
    canvas.fill();
}

fn draw_skyline<C: Canvas>(canvas: &mut C, palette: &Palette, ground_y: f64, segment: &SkylineSegment) {
    for b in &segment.buildings {
        let x = segment.x + b.offset_x;
        let top = ground_y - b.h;
        canvas.set_fill_color(palette.skyline);
        canvas.fill_rect(x, top, b.w, b.h);

        if b.spire {
            canvas.begin_path();
            canvas.move_to(x + b.w * 0.35, top);
            canvas.line_to(x + b.w / 2.0, top - b.h * 0.3);
            canvas.line_to(x + b.w * 0.65, top);
            canvas.close_path();
            canvas.fill();
        }
        if b.dome {
            canvas.begin_path();
            canvas.arc(x + b.w / 2.0, top, b.w / 2.0, -std::f64::consts::PI, 0.0);
            canvas.fill();
        }
        if b.cactus {
            let cx = x + b.w + 3.0;
            canvas.set_fill_color(palette.cactus);
            canvas.fill_rect(cx, ground_y - 16.0, 3.0, 16.0);
            canvas.fill_rect(cx - 3.0, ground_y - 11.0, 3.0, 2.0);
            canvas.fill_rect(cx - 3.0, ground_y - 14.0, 2.0, 5.0);
        }
        if b.lit_windows {
            canvas.set_fill_color(palette.skyline_window);
            let mut wy = top + 5.0;
            while wy + 3.0 < ground_y - 4.0 {
                let mut wx = x + 3.0;
                while wx + 2.0 < x + b.w - 2.0 {
                    canvas.fill_rect(wx, wy, 2.0, 3.0);
                    wx += 6.0;
                }
                wy += 9.0;
            }
        }
    }
}

fn draw_building<C: Canvas>(canvas: &mut C, palette: &Palette, ground_y: f64, b: &Building) {
    let top = ground_y - b.h;
    canvas.set_fill_color(palette.buildings[b.tint % palette.buildings.len()]);
    canvas.fill_rect(b.x, top, b.w, b.h);

    match b.kind {
        BuildingKind::House => {
            canvas.set_fill_color(palette.roof);
            canvas.begin_path();
            canvas.move_to(b.x - 3.0, top);
            canvas.line_to(b.x + b.w / 2.0, top - b.w * 0.45);
            canvas.line_to(b.x + b.w + 3.0, top);
            canvas.close_path();
            canvas.fill();
            canvas.set_fill_color(palette.window);
            canvas.fill_rect(b.x + b.w * 0.2, top + b.h * 0.3, b.w * 0.22, b.h * 0.25);
            canvas.set_fill_color(palette.trunk);
            canvas.fill_rect(b.x + b.w * 0.58, ground_y - b.h * 0.5, b.w * 0.2, b.h * 0.5);
        }
        BuildingKind::Apartment => {
            canvas.set_fill_color(palette.window);
            window_grid(canvas, b.x, top, b.w, b.h);
        }
        BuildingKind::Office => {
            canvas.set_fill_color(palette.roof);
            canvas.fill_rect(b.x + b.w * 0.3, top - 8.0, b.w * 0.4, 8.0);
            canvas.set_fill_color(palette.window);
            let mut y = top + 6.0;
            while y + 4.0 < ground_y - 6.0 {
                canvas.fill_rect(b.x + 4.0, y, b.w - 8.0, 4.0);
                y += 10.0;
            }
        }
    }
}

fn window_grid<C: Canvas>(canvas: &mut C, x: f64, top: f64, w: f64, h: f64) {
    const SIZE: f64 = 7.0;
    let mut wy = top + 6.0;
    while wy + SIZE < top + h - 6.0 {
        let mut wx = x + 5.0;
        while wx + SIZE < x + w - 4.0 {
            canvas.fill_rect(wx, wy, SIZE, SIZE);
            wx += SIZE + 6.0;
        }
        wy += 12.0;
    }
}

fn draw_tree<C: Canvas>(canvas: &mut C, palette: &Palette, ground_y: f64, tree: &Tree) {
    let trunk_w = (tree.w * 0.18).max(3.0);
    let trunk_h = tree.h * 0.3;
    let cx = tree.x + tree.w / 2.0;
    canvas.set_fill_color(palette.trunk);
    canvas.fill_rect(cx - trunk_w / 2.0, ground_y - trunk_h, trunk_w, trunk_h);

    match tree.kind {
        TreeKind::Pine => {
            canvas.set_fill_color(palette.pine);
            canvas.begin_path();
            canvas.move_to(tree.x, ground_y - trunk_h);
            canvas.line_to(cx, ground_y - tree.h);
            canvas.line_to(tree.x + tree.w, ground_y - trunk_h);
            canvas.close_path();
            canvas.fill();
        }
        TreeKind::Round => {
            let r = tree.w / 2.0;
            canvas.set_fill_color(palette.leaves);
            canvas.begin_path();
            canvas.arc(cx, ground_y - tree.h + r, r, 0.0, TAU);
            canvas.fill();
        }
    }
}

fn draw_bird<C: Canvas>(canvas: &mut C, palette: &Palette, config: &GameConfig, bird: &Bird) {
    let r = config.bird_size / 2.0;
    canvas.save();
    canvas.translate(config.bird_x, bird.y);
    canvas.rotate(bird.rotation);

    canvas.set_fill_color(palette.bird_body);
    canvas.begin_path();
    canvas.arc(0.0, 0.0, r, 0.0, TAU);
    canvas.fill();
    canvas.set_stroke(palette.bird_wing, 1.5);
    canvas.stroke();

    canvas.set_fill_color(palette.bird_wing);
    canvas.begin_path();
    canvas.arc(-r * 0.3, r * 0.15, r * 0.5, 0.0, TAU);
    canvas.fill();

    canvas.set_fill_color(palette.bird_beak);
    canvas.begin_path();
    canvas.move_to(r * 0.7, -r * 0.15);
    canvas.line_to(r * 1.45, r * 0.1);
    canvas.line_to(r * 0.7, r * 0.35);
    canvas.close_path();
    canvas.fill();

    canvas.set_fill_color(palette.bird_eye);
    canvas.begin_path();
    canvas.arc(r * 0.35, -r * 0.3, r * 0.16, 0.0, TAU);
    canvas.fill();

    canvas.restore();
}

fn shadowed_text<C: Canvas>(canvas: &mut C, palette: &Palette, text: &str, x: f64, y: f64) {
    canvas.set_fill_color(palette.text_shadow);
    canvas.fill_text(text, x + 2.0, y + 2.0);
    canvas.set_fill_color(palette.text);
    canvas.fill_text(text, x, y);
}

/// Wedge of cheese with a couple of holes.
fn draw_cheese_fallback<C: Canvas>(canvas: &mut C, palette: &Palette, x: f64, y: f64, size: f64) {
    canvas.set_fill_color(palette.cheese);
    canvas.begin_path();
    canvas.move_to(x, y + size * 0.85);
    canvas.line_to(x + size, y + size * 0.85);
    canvas.line_to(x + size, y + size * 0.2);
    canvas.close_path();
    canvas.fill();

    canvas.set_fill_color(palette.bird_wing);
    for &(hx, hy, hr) in &[(0.7, 0.6, 0.08), (0.85, 0.45, 0.06)] {
        canvas.begin_path();
        canvas.arc(x + size * hx, y + size * hy, size * hr, 0.0, TAU);
        canvas.fill();
    }
}

fn draw_heart_fallback<C: Canvas>(canvas: &mut C, palette: &Palette, x: f64, y: f64, size: f64) {
    let r = size / 4.0;
    canvas.set_fill_color(palette.heart);
    canvas.begin_path();
    canvas.arc(x + r, y + r * 1.3, r, -std::f64::consts::PI, 0.0);
    canvas.arc(x + r * 3.0, y + r * 1.3, r, -std::f64::consts::PI, 0.0);
    canvas.line_to(x + size / 2.0, y + size * 0.9);
    canvas.close_path();
    canvas.fill();
}
