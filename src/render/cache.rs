//! Per-engine render resources: gradients, prerendered cloud bitmaps, font metrics.
//!
//! A cache is always built whole and swapped in with a single assignment, so a frame
//! sees either the old resources or the new ones, never a mix.

use log::{debug, warn};

use super::{Canvas, GradientSpec, Palette};
use crate::config::GameConfig;
use crate::entities::SpriteRef;
use crate::math::TAU;

/// Margin around each cloud bitmap so anti-aliased edges are not clipped.
pub const CLOUD_PAD: f64 = 4.0;

pub const SCORE_FONT: &str = "bold 36px sans-serif";
pub const BANNER_FONT: &str = "bold 26px sans-serif";

/// A cloud outline as overlapping puffs, in logical px.
#[derive(Debug, Clone, Copy)]
pub struct CloudShape {
    pub w: f64,
    pub h: f64,
    /// `(cx, cy, r)` per puff.
    pub puffs: &'static [(f64, f64, f64)],
}

pub const CLOUD_SHAPES: [CloudShape; 3] = [
    CloudShape {
        w: 90.0,
        h: 36.0,
        puffs: &[(20.0, 24.0, 12.0), (42.0, 16.0, 16.0), (66.0, 22.0, 13.0)],
    },
    CloudShape {
        w: 120.0,
        h: 44.0,
        puffs: &[
            (20.0, 30.0, 13.0),
            (44.0, 20.0, 18.0),
            (72.0, 18.0, 17.0),
            (98.0, 29.0, 14.0),
        ],
    },
    CloudShape {
        w: 64.0,
        h: 30.0,
        puffs: &[(18.0, 19.0, 11.0), (40.0, 15.0, 13.0)],
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontMetrics {
    pub digit_width: f64,
    pub idle_banner_width: f64,
    pub paused_banner_width: f64,
    pub dead_banner_width: f64,
}

pub struct RenderCache<C: Canvas> {
    pub palette: Palette,
    pub sky: Option<C::Gradient>,
    pub ground_accent: Option<C::Gradient>,
    pub pipe_body: Option<C::Gradient>,
    pub clouds: Vec<Option<C::Bitmap>>,
    pub cloud_sprites: Vec<Option<SpriteRef>>,
    pub fonts: FontMetrics,
}

/// Logs a failed resource and turns it into "draw without it".
fn soften<T>(what: &str, result: Result<T, crate::error::EngineError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("render cache: {what} unavailable: {err}");
            None
        }
    }
}

impl<C: Canvas> RenderCache<C> {
    pub fn build(canvas: &mut C, palette: &Palette, config: &GameConfig) -> Self {
        let ground_y = config.ground_y();

        let sky = soften(
            "sky gradient",
            canvas.create_gradient(&GradientSpec::vertical(
                0.0,
                ground_y,
                vec![(0.0, palette.sky_top), (1.0, palette.sky_bottom)],
            )),
        );
        let ground_accent = soften(
            "ground accent",
            canvas.create_gradient(&GradientSpec::vertical(
                ground_y,
                ground_y + 12.0,
                vec![(0.0, palette.ground_accent_top), (1.0, palette.ground_accent_bottom)],
            )),
        );
        let pipe_body = soften(
            "pipe gradient",
            canvas.create_gradient(&GradientSpec {
                x0: 0.0,
                y0: 0.0,
                x1: config.pipe_width,
                y1: 0.0,
                stops: vec![
                    (0.0, palette.pipe_shade),
                    (0.35, palette.pipe),
                    (1.0, palette.pipe_shade),
                ],
            }),
        );

        let mut clouds = Vec::with_capacity(CLOUD_SHAPES.len());
        let mut cloud_sprites = Vec::with_capacity(CLOUD_SHAPES.len());
        for (id, shape) in CLOUD_SHAPES.iter().enumerate() {
            let bitmap = soften("cloud bitmap", prerender_cloud(canvas, shape, palette));
            cloud_sprites.push(bitmap.as_ref().map(|_| SpriteRef {
                id,
                pad: CLOUD_PAD,
                logical_w: shape.w,
                logical_h: shape.h,
            }));
            clouds.push(bitmap);
        }

        let fonts = measure_fonts(canvas, config);
        debug!(
            "render cache built for {}x{} ({} of {} cloud bitmaps)",
            config.width,
            config.height,
            clouds.iter().flatten().count(),
            CLOUD_SHAPES.len()
        );

        Self {
            palette: palette.clone(),
            sky,
            ground_accent,
            pipe_body,
            clouds,
            cloud_sprites,
            fonts,
        }
    }

    pub fn cloud_bitmap(&self, sprite: &SpriteRef) -> Option<&C::Bitmap> {
        self.clouds.get(sprite.id)?.as_ref()
    }
}

fn prerender_cloud<C: Canvas>(
    canvas: &mut C,
    shape: &CloudShape,
    palette: &Palette,
) -> Result<C::Bitmap, crate::error::EngineError> {
    let w = (shape.w + CLOUD_PAD * 2.0).ceil() as u32;
    let h = (shape.h + CLOUD_PAD * 2.0).ceil() as u32;
    canvas.create_bitmap(w, h, &mut |c| {
        // underside shade first, body offset up by 2px on top
        c.set_fill_color(palette.cloud_shade);
        for &(cx, cy, r) in shape.puffs {
            c.begin_path();
            c.arc(cx + CLOUD_PAD, cy + CLOUD_PAD + 2.0, r, 0.0, TAU);
            c.fill();
        }
        c.set_fill_color(palette.cloud);
        for &(cx, cy, r) in shape.puffs {
            c.begin_path();
            c.arc(cx + CLOUD_PAD, cy + CLOUD_PAD, r, 0.0, TAU);
            c.fill();
        }
        c.fill_rect(
            CLOUD_PAD + shape.puffs[0].0,
            CLOUD_PAD + shape.h * 0.55,
            shape.w - shape.puffs[0].0 * 2.0,
            shape.h * 0.3,
        );
    })
}

fn measure_fonts<C: Canvas>(canvas: &mut C, config: &GameConfig) -> FontMetrics {
    canvas.set_font(SCORE_FONT);
    let digit_width = canvas.measure_text("0");
    canvas.set_font(BANNER_FONT);
    FontMetrics {
        digit_width,
        idle_banner_width: canvas.measure_text(&config.banner.idle),
        paused_banner_width: canvas.measure_text(&config.banner.paused),
        dead_banner_width: canvas.measure_text(&config.banner.dead),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingCanvas;

    #[test]
    fn builds_every_resource() {
        let mut canvas = RecordingCanvas::new(400.0, 600.0);
        let cache = RenderCache::build(&mut canvas, &Palette::default(), &GameConfig::default());
        assert!(cache.sky.is_some());
        assert!(cache.ground_accent.is_some());
        assert_eq!(cache.clouds.iter().flatten().count(), CLOUD_SHAPES.len());
        assert_eq!(canvas.bitmaps_created, CLOUD_SHAPES.len());
        assert!(cache.fonts.digit_width > 0.0);
        // building the cache draws nothing on screen
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn failed_bitmaps_leave_sprites_empty() {
        let mut canvas = RecordingCanvas::new(400.0, 600.0);
        canvas.fail_bitmaps = true;
        let cache = RenderCache::build(&mut canvas, &Palette::default(), &GameConfig::default());
        assert!(cache.cloud_sprites.iter().all(Option::is_none));
        assert!(cache.sky.is_some());
    }

    #[test]
    fn failed_gradients_are_absent_not_fatal() {
        let mut canvas = RecordingCanvas::new(400.0, 600.0);
        canvas.fail_gradients = true;
        let cache = RenderCache::build(&mut canvas, &Palette::default(), &GameConfig::default());
        assert!(cache.sky.is_none());
        assert!(cache.pipe_body.is_none());
        assert_eq!(cache.cloud_sprites.iter().flatten().count(), CLOUD_SHAPES.len());
    }

    #[test]
    fn sprite_geometry_matches_shape() {
        let mut canvas = RecordingCanvas::new(400.0, 600.0);
        let cache = RenderCache::build(&mut canvas, &Palette::default(), &GameConfig::default());
        let sprite = cache.cloud_sprites[1].unwrap();
        assert_eq!(sprite.id, 1);
        assert_eq!(sprite.logical_w, CLOUD_SHAPES[1].w);
        assert_eq!(sprite.pad, CLOUD_PAD);
        assert!(cache.cloud_bitmap(&sprite).is_some());
    }
}
