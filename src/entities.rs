//! Plain data for everything that moves on screen.

use serde::{Deserialize, Serialize};

/// The player. Horizontal position is fixed by the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Centre y, world px.
    pub y: f64,
    /// Vertical velocity, px/s, positive is downward.
    pub vy: f64,
    /// Pitch, radians.
    pub rotation: f64,
}

impl Bird {
    pub fn at(y: f64) -> Self {
        Self {
            y,
            vy: 0.0,
            rotation: 0.0,
        }
    }
}

/// A top/bottom pipe pair around one gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub x: f64,
    pub gap_center: f64,
    /// Gap height at spawn time; a difficulty change does not resize pipes already on screen.
    pub gap: f64,
    pub scored: bool,
}

impl Pipe {
    pub fn gap_top(&self) -> f64 {
        self.gap_center - self.gap / 2.0
    }

    pub fn gap_bottom(&self) -> f64 {
        self.gap_center + self.gap / 2.0
    }
}

/// Handle into the prerendered cloud bitmaps plus the geometry needed to place one.
///
/// Bitmaps are rasterized with `pad` px of margin on every side so soft edges are not
/// clipped; `logical_w`/`logical_h` is the cloud's size without that margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteRef {
    pub id: usize,
    pub pad: f64,
    pub logical_w: f64,
    pub logical_h: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub speed: f64,
    pub alpha: f64,
    pub sprite: Option<SpriteRef>,
}

impl Cloud {
    pub fn width(&self) -> f64 {
        self.sprite.map(|s| s.logical_w * self.scale).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    House,
    Apartment,
    Office,
}

/// Foreground building.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub x: f64,
    pub w: f64,
    pub h: f64,
    pub speed: f64,
    pub kind: BuildingKind,
    /// Index into the palette's building colours.
    pub tint: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeKind {
    Pine,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub x: f64,
    pub w: f64,
    pub h: f64,
    pub speed: f64,
    pub kind: TreeKind,
}

/// One tower inside a skyline segment, positioned relative to the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineBuilding {
    pub offset_x: f64,
    pub w: f64,
    pub h: f64,
    pub spire: bool,
    pub dome: bool,
    pub cactus: bool,
    pub lit_windows: bool,
}

/// A cluster of distant buildings generated together and scrolled as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineSegment {
    pub x: f64,
    /// Building widths plus the gaps between them.
    pub total_w: f64,
    pub speed: f64,
    /// Index into the config's city presets.
    pub city: usize,
    pub buildings: Vec<SkylineBuilding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoKind {
    Dash,
    Dot,
}

/// Grass tufts and pebbles scrolling along the ground strip.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundDeco {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub speed: f64,
    pub alpha: f64,
    pub kind: DecoKind,
}

/// Anything that scrolls left at its own speed.
pub trait Scrolling {
    fn left(&self) -> f64;
    fn right(&self) -> f64;
    fn advance(&mut self, dt: f64);
}

macro_rules! scrolling_impl {
    ($ty:ty, $width:expr) => {
        impl Scrolling for $ty {
            fn left(&self) -> f64 {
                self.x
            }

            fn right(&self) -> f64 {
                let width: fn(&$ty) -> f64 = $width;
                self.x + width(self)
            }

            fn advance(&mut self, dt: f64) {
                self.x -= self.speed * dt;
            }
        }
    };
}

scrolling_impl!(Cloud, |c| c.width());
scrolling_impl!(Building, |b| b.w);
scrolling_impl!(Tree, |t| t.w);
scrolling_impl!(SkylineSegment, |s| s.total_w);
scrolling_impl!(Plane, |p| p.w);
scrolling_impl!(GroundDeco, |d| d.w);

/// Every parallax layer, back to front, plus where each one currently ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgLayers {
    pub far_clouds: Vec<Cloud>,
    pub planes: Vec<Plane>,
    pub skyline: Vec<SkylineSegment>,
    pub mid_clouds: Vec<Cloud>,
    pub buildings: Vec<Building>,
    pub trees: Vec<Tree>,
    pub ground_deco: Vec<GroundDeco>,

    pub far_cloud_right: f64,
    pub skyline_right: f64,
    pub mid_cloud_right: f64,
    pub building_right: f64,
    pub tree_right: f64,
    pub deco_right: f64,
}

/// Live entity totals, reported in debug exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub pipes: usize,
    pub far_clouds: usize,
    pub mid_clouds: usize,
    pub skyline_segments: usize,
    pub buildings: usize,
    pub trees: usize,
    pub planes: usize,
    pub ground_deco: usize,
}

impl BgLayers {
    pub fn counts(&self, pipes: usize) -> EntityCounts {
        EntityCounts {
            pipes,
            far_clouds: self.far_clouds.len(),
            mid_clouds: self.mid_clouds.len(),
            skyline_segments: self.skyline.len(),
            buildings: self.buildings.len(),
            trees: self.trees.len(),
            planes: self.planes.len(),
            ground_deco: self.ground_deco.len(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
