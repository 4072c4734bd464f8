//! Procedural parallax background.
//!
//! Every layer is filled left to right from an anchor just off the left edge until it
//! reaches past the right edge. Each step the elements drift left at their own speed;
//! anything fully past the left margin is dropped, and a layer whose right end has come
//! inside `view width + margin` gets new elements appended with the same distribution.

use rand::Rng;

use crate::config::{CityPreset, GameConfig};
use crate::entities::{
    BgLayers, Building, BuildingKind, Cloud, DecoKind, GroundDeco, Plane, Scrolling,
    SkylineBuilding, SkylineSegment, SpriteRef, Tree, TreeKind,
};
use crate::math::max_of;

/// How far past the right edge layers are kept filled.
pub const SPAWN_MARGIN: f64 = 120.0;
/// How far past the left edge elements survive before being dropped.
pub const PRUNE_MARGIN: f64 = 60.0;

// Layer speeds, px/s. Farther layers are slower.
pub const FAR_CLOUD_SPEED: f64 = 8.0;
pub const SKYLINE_SPEED: f64 = 18.0;
pub const PLANE_SPEED: f64 = 40.0;
pub const MID_CLOUD_SPEED: f64 = 30.0;
pub const BUILDING_SPEED: f64 = 55.0;
pub const TREE_SPEED: f64 = 85.0;

/// Chance per second of a plane appearing while none is on screen.
const PLANE_CHANCE_PER_SEC: f64 = 0.08;

/// Uniform draw in `[lo, hi)`; collapses to `lo` for an empty range.
fn between<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.gen::<f64>() * (hi - lo).max(0.0)
}

fn chance<R: Rng>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Everything generation needs besides the RNG.
pub struct BgContext<'a> {
    pub config: &'a GameConfig,
    /// One entry per cloud shape; `None` where prerendering failed.
    pub cloud_sprites: &'a [Option<SpriteRef>],
}

impl BgContext<'_> {
    fn limit(&self) -> f64 {
        self.config.width + SPAWN_MARGIN
    }

    fn pick_sprite<R: Rng>(&self, rng: &mut R) -> Option<SpriteRef> {
        if self.cloud_sprites.is_empty() {
            return None;
        }
        self.cloud_sprites[rng.gen_range(0..self.cloud_sprites.len())]
    }

    fn cloud_gap<R: Rng>(&self, rng: &mut R) -> f64 {
        let mean = self.config.width / self.config.cloud_count.max(1) as f64;
        between(rng, mean * 0.5, mean * 1.5).max(8.0)
    }

    pub fn far_cloud<R: Rng>(&self, x: f64, rng: &mut R) -> Cloud {
        Cloud {
            x,
            y: between(rng, 10.0, self.config.ground_y() * 0.35),
            scale: between(rng, 0.5, 0.8),
            speed: FAR_CLOUD_SPEED * between(rng, 0.8, 1.2),
            alpha: between(rng, 0.45, 0.7),
            sprite: self.pick_sprite(rng),
        }
    }

    pub fn mid_cloud<R: Rng>(&self, x: f64, rng: &mut R) -> Cloud {
        Cloud {
            x,
            y: between(rng, 20.0, self.config.ground_y() * 0.5),
            scale: between(rng, 0.8, 1.2),
            speed: MID_CLOUD_SPEED * between(rng, 0.9, 1.1),
            alpha: between(rng, 0.8, 1.0),
            sprite: self.pick_sprite(rng),
        }
    }

    /// Foreground building: 40% house, 30% apartment, 30% office.
    pub fn building<R: Rng>(&self, x: f64, rng: &mut R) -> Building {
        let roll = rng.gen::<f64>();
        let (kind, w, h) = if roll < 0.4 {
            (BuildingKind::House, between(rng, 34.0, 50.0), between(rng, 30.0, 50.0))
        } else if roll < 0.7 {
            (BuildingKind::Apartment, between(rng, 36.0, 52.0), between(rng, 60.0, 100.0))
        } else {
            (BuildingKind::Office, between(rng, 40.0, 60.0), between(rng, 90.0, 140.0))
        };
        Building {
            x,
            w,
            h,
            speed: BUILDING_SPEED,
            kind,
            tint: rng.gen_range(0..4),
        }
    }

    pub fn tree<R: Rng>(&self, x: f64, rng: &mut R) -> Tree {
        let kind = if chance(rng, 0.5) {
            TreeKind::Pine
        } else {
            TreeKind::Round
        };
        let h = between(rng, 30.0, 60.0);
        let w = match kind {
            TreeKind::Pine => h * 0.45,
            TreeKind::Round => h * 0.7,
        };
        Tree {
            x,
            w,
            h,
            speed: TREE_SPEED,
            kind,
        }
    }

    /// Ground decoration moves with the pipes so the ground reads as solid.
    pub fn ground_deco<R: Rng>(&self, x: f64, rng: &mut R) -> GroundDeco {
        let ground_y = self.config.ground_y();
        let bottom = self.config.height - 6.0;
        let (kind, w, h) = if chance(rng, 0.6) {
            (DecoKind::Dash, between(rng, 8.0, 18.0), 3.0)
        } else {
            let d = between(rng, 3.0, 6.0);
            (DecoKind::Dot, d, d)
        };
        GroundDeco {
            x,
            y: between(rng, ground_y + 14.0, bottom.max(ground_y + 14.0)),
            w,
            h,
            speed: self.config.pipe_speed,
            alpha: between(rng, 0.25, 0.6),
            kind,
        }
    }

    pub fn skyline_segment<R: Rng>(&self, x: f64, rng: &mut R) -> SkylineSegment {
        let city = rng.gen_range(0..self.config.cities.len());
        skyline_segment(x, city, &self.config.cities[city], rng)
    }

    pub fn plane<R: Rng>(&self, rng: &mut R) -> Plane {
        Plane {
            x: self.config.width + 20.0,
            y: between(rng, 30.0, (self.config.ground_y() * 0.3).max(31.0)),
            w: 34.0,
            speed: PLANE_SPEED * between(rng, 0.9, 1.3),
        }
    }
}

/// Builds one skyline cluster for `city`: 3 to 6 towers with the city's height
/// distribution, each decoration rolled independently.
pub fn skyline_segment<R: Rng>(x: f64, city_index: usize, city: &CityPreset, rng: &mut R) -> SkylineSegment {
    let count = rng.gen_range(3..=6);
    let mut buildings = Vec::with_capacity(count);
    let mut offset = 0.0;
    for i in 0..count {
        if i > 0 {
            offset += between(rng, 2.0, 8.0);
        }
        let w = between(rng, city.min_width, city.max_width);
        let h = city.height.base + rng.gen::<f64>() * city.height.spread;
        buildings.push(SkylineBuilding {
            offset_x: offset,
            w,
            h,
            spire: chance(rng, city.spire_chance),
            dome: chance(rng, city.dome_chance),
            cactus: chance(rng, city.cactus_chance),
            lit_windows: chance(rng, city.window_chance),
        });
        offset += w;
    }
    SkylineSegment {
        x,
        total_w: offset,
        speed: SKYLINE_SPEED,
        city: city_index,
        buildings,
    }
}

/// Rightmost extent of a layer, or the left-of-view anchor when it is empty.
fn rightmost<T: Scrolling>(items: &[T]) -> f64 {
    max_of(items.iter().map(Scrolling::right)).unwrap_or(-SPAWN_MARGIN)
}

/// Appends elements until the layer's right end passes `limit`.
fn extend_layer<T, F>(items: &mut Vec<T>, right: &mut f64, limit: f64, mut spawn: F)
where
    T: Scrolling,
    F: FnMut(f64) -> (T, f64),
{
    *right = rightmost(items);
    while *right < limit {
        let (item, gap) = spawn(*right);
        *right = right.max(item.right()).max(item.left());
        items.push(item);
        if gap <= 0.0 {
            break;
        }
    }
}

fn advance_layer<T: Scrolling>(items: &mut Vec<T>, dt: f64) {
    for item in items.iter_mut() {
        item.advance(dt);
    }
    items.retain(|item| item.right() >= -PRUNE_MARGIN);
}

/// Fills every layer from scratch.
pub fn populate<R: Rng>(layers: &mut BgLayers, ctx: &BgContext<'_>, rng: &mut R) {
    layers.clear();
    extend(layers, ctx, rng);
}

/// Tops up every layer so none ends inside `view width + margin`.
pub fn extend<R: Rng>(layers: &mut BgLayers, ctx: &BgContext<'_>, rng: &mut R) {
    let limit = ctx.limit();

    extend_layer(&mut layers.far_clouds, &mut layers.far_cloud_right, limit, |right| {
        let gap = ctx.cloud_gap(rng);
        let cloud = ctx.far_cloud(right + gap, rng);
        (cloud, gap)
    });
    extend_layer(&mut layers.skyline, &mut layers.skyline_right, limit, |right| {
        let gap = between(rng, 10.0, 40.0);
        (ctx.skyline_segment(right + gap, rng), gap)
    });
    extend_layer(&mut layers.mid_clouds, &mut layers.mid_cloud_right, limit, |right| {
        let gap = ctx.cloud_gap(rng) * 1.4;
        let cloud = ctx.mid_cloud(right + gap, rng);
        (cloud, gap)
    });
    extend_layer(&mut layers.buildings, &mut layers.building_right, limit, |right| {
        let gap = between(rng, 6.0, 30.0);
        (ctx.building(right + gap, rng), gap)
    });
    extend_layer(&mut layers.trees, &mut layers.tree_right, limit, |right| {
        let gap = between(rng, 20.0, 90.0);
        (ctx.tree(right + gap, rng), gap)
    });
    extend_layer(&mut layers.ground_deco, &mut layers.deco_right, limit, |right| {
        let gap = between(rng, 12.0, 40.0);
        (ctx.ground_deco(right + gap, rng), gap)
    });
}

/// One fixed step of background motion: advance, prune, refill.
pub fn scroll<R: Rng>(layers: &mut BgLayers, ctx: &BgContext<'_>, dt: f64, rng: &mut R) {
    advance_layer(&mut layers.far_clouds, dt);
    advance_layer(&mut layers.planes, dt);
    advance_layer(&mut layers.skyline, dt);
    advance_layer(&mut layers.mid_clouds, dt);
    advance_layer(&mut layers.buildings, dt);
    advance_layer(&mut layers.trees, dt);
    advance_layer(&mut layers.ground_deco, dt);

    if layers.planes.is_empty() && chance(rng, PLANE_CHANCE_PER_SEC * dt) {
        layers.planes.push(ctx.plane(rng));
    }

    extend(layers, ctx, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeightProfile;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sprites() -> Vec<Option<SpriteRef>> {
        vec![
            Some(SpriteRef {
                id: 0,
                pad: 4.0,
                logical_w: 90.0,
                logical_h: 36.0,
            }),
            None,
        ]
    }

    fn assert_covered(layers: &BgLayers, width: f64) {
        for (name, right) in [
            ("far_clouds", rightmost(&layers.far_clouds)),
            ("skyline", rightmost(&layers.skyline)),
            ("mid_clouds", rightmost(&layers.mid_clouds)),
            ("buildings", rightmost(&layers.buildings)),
            ("trees", rightmost(&layers.trees)),
            ("ground_deco", rightmost(&layers.ground_deco)),
        ] {
            assert!(right >= width, "{name} ends at {right}, view is {width}");
        }
    }

    #[test]
    fn populate_covers_view() {
        let config = GameConfig::default();
        let sprites = sprites();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &sprites,
        };
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut layers = BgLayers::default();
            populate(&mut layers, &ctx, &mut rng);
            assert_covered(&layers, config.width);
            assert!(layers.building_right >= config.width + SPAWN_MARGIN);
        }
    }

    #[test]
    fn long_scroll_keeps_view_covered_and_bounded() {
        let config = GameConfig::default();
        let sprites = sprites();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &sprites,
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let mut layers = BgLayers::default();
        populate(&mut layers, &ctx, &mut rng);

        let dt = config.fixed_step_secs();
        let mut peak = 0;
        // ten minutes of play
        for _ in 0..36_000 {
            scroll(&mut layers, &ctx, dt, &mut rng);
            assert_covered(&layers, config.width);
            peak = peak.max(layers.trees.len() + layers.ground_deco.len());
        }
        assert!(peak < 200, "layers grew to {peak} elements");
        assert!(layers.trees.iter().all(|t| t.right() >= -PRUNE_MARGIN));
    }

    #[test]
    fn scroll_moves_elements_at_their_speed() {
        let config = GameConfig::default();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &[],
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let mut layers = BgLayers::default();
        populate(&mut layers, &ctx, &mut rng);
        let before = layers.buildings.iter().find(|b| b.x > 0.0).unwrap().clone();
        scroll(&mut layers, &ctx, 0.5, &mut rng);
        let after = layers
            .buildings
            .iter()
            .find(|b| b.w == before.w && b.h == before.h)
            .unwrap();
        assert!((after.x - (before.x - BUILDING_SPEED * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn clouds_without_sprites_still_terminate() {
        let config = GameConfig::default();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &[],
        };
        let mut rng = SmallRng::seed_from_u64(11);
        let mut layers = BgLayers::default();
        populate(&mut layers, &ctx, &mut rng);
        assert!(!layers.far_clouds.is_empty());
        assert!(layers.far_clouds.iter().all(|c| c.sprite.is_none()));
    }

    #[test]
    fn skyline_heights_follow_city_profile() {
        let city = CityPreset {
            height: HeightProfile {
                base: 20.0,
                spread: 30.0,
            },
            ..CityPreset::default_cities()[0].clone()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let seg = skyline_segment(0.0, 0, &city, &mut rng);
            assert!((3..=6).contains(&seg.buildings.len()));
            for b in &seg.buildings {
                assert!(b.h >= 20.0 && b.h < 50.0, "height {}", b.h);
            }
        }
    }

    #[test]
    fn skyline_total_width_includes_gaps() {
        let city = CityPreset::default_cities()[1].clone();
        let mut rng = SmallRng::seed_from_u64(5);
        let seg = skyline_segment(100.0, 1, &city, &mut rng);
        let widths: f64 = seg.buildings.iter().map(|b| b.w).sum();
        assert!(seg.total_w > widths);
        let last = seg.buildings.last().unwrap();
        assert!((seg.total_w - (last.offset_x + last.w)).abs() < 1e-9);
    }

    #[test]
    fn decorations_respect_city_odds() {
        let cities = CityPreset::default_cities();
        let mut rng = SmallRng::seed_from_u64(9);
        for (i, city) in cities.iter().enumerate() {
            for _ in 0..200 {
                let seg = skyline_segment(0.0, i, city, &mut rng);
                for b in &seg.buildings {
                    if city.dome_chance == 0.0 {
                        assert!(!b.dome);
                    }
                    if city.cactus_chance == 0.0 {
                        assert!(!b.cactus);
                    }
                }
            }
        }
    }

    #[test]
    fn building_mix_roughly_matches_weights() {
        let config = GameConfig::default();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &[],
        };
        let mut rng = SmallRng::seed_from_u64(1234);
        let n = 10_000;
        let houses = (0..n)
            .filter(|_| ctx.building(0.0, &mut rng).kind == BuildingKind::House)
            .count();
        let share = houses as f64 / n as f64;
        assert!((0.36..0.44).contains(&share), "house share {share}");
    }

    #[test]
    fn same_seed_same_background() {
        let config = GameConfig::default();
        let sprites = sprites();
        let ctx = BgContext {
            config: &config,
            cloud_sprites: &sprites,
        };
        let mut a = BgLayers::default();
        let mut b = BgLayers::default();
        populate(&mut a, &ctx, &mut SmallRng::seed_from_u64(77));
        populate(&mut b, &ctx, &mut SmallRng::seed_from_u64(77));
        assert_eq!(a, b);
    }
}
