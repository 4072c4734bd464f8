//! Tuning parameters.
//!
//! A [`GameConfig`] is a complete, immutable snapshot. Changing difficulty or
//! viewport size never edits one in place; a fresh config is built, validated
//! and substituted.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::render::Rgba;

/// Fixed simulation step, milliseconds (60 Hz).
pub const FIXED_STEP_MS: f64 = 1000.0 / 60.0;

/// Difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, EngineError> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| EngineError::invalid("difficulty", format!("unknown key `{key}`")))
    }

    /// Downward acceleration, px/s².
    pub fn gravity(&self) -> f64 {
        match self {
            Self::Easy => 1500.0,
            Self::Normal => 1700.0,
            Self::Hard => 1900.0,
        }
    }

    /// Velocity set by a flap, px/s. Replaces the current velocity rather than adding to it.
    pub fn flap_impulse(&self) -> f64 {
        match self {
            Self::Easy => -400.0,
            Self::Normal => -430.0,
            Self::Hard => -460.0,
        }
    }

    /// Vertical opening between the top and bottom pipe, px.
    pub fn pipe_gap(&self) -> f64 {
        match self {
            Self::Easy => 175.0,
            Self::Normal => 150.0,
            Self::Hard => 128.0,
        }
    }

    /// Pipe scroll speed, px/s.
    pub fn pipe_speed(&self) -> f64 {
        match self {
            Self::Easy => 130.0,
            Self::Normal => 150.0,
            Self::Hard => 175.0,
        }
    }
}

/// Skyline building height distribution: `base + random * spread`, so heights
/// fall in `[base, base + spread)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightProfile {
    pub base: f64,
    pub spread: f64,
}

/// A skyline city: height distribution plus decoration odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPreset {
    pub name: String,
    pub height: HeightProfile,
    pub min_width: f64,
    pub max_width: f64,
    pub spire_chance: f64,
    pub dome_chance: f64,
    pub cactus_chance: f64,
    pub window_chance: f64,
}

impl CityPreset {
    fn new(name: &str, base: f64, spread: f64, widths: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            height: HeightProfile { base, spread },
            min_width: widths.0,
            max_width: widths.1,
            spire_chance: 0.0,
            dome_chance: 0.0,
            cactus_chance: 0.0,
            window_chance: 0.3,
        }
    }

    pub fn default_cities() -> Vec<CityPreset> {
        vec![
            CityPreset {
                spire_chance: 0.1,
                ..CityPreset::new("harbor", 20.0, 30.0, (14.0, 26.0))
            },
            CityPreset {
                spire_chance: 0.35,
                window_chance: 0.5,
                ..CityPreset::new("metro", 60.0, 90.0, (16.0, 30.0))
            },
            CityPreset {
                dome_chance: 0.3,
                ..CityPreset::new("old_town", 30.0, 40.0, (18.0, 32.0))
            },
            CityPreset {
                cactus_chance: 0.4,
                window_chance: 0.15,
                ..CityPreset::new("desert", 25.0, 35.0, (16.0, 28.0))
            },
        ]
    }
}

/// Overlay text shown outside of active play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerText {
    pub idle: String,
    pub paused: String,
    pub dead: String,
}

impl Default for BannerText {
    fn default() -> Self {
        Self {
            idle: "Tap to fly".to_string(),
            paused: "Paused".to_string(),
            dead: "Game over".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub ground_height: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    pub pipe_spacing: f64,
    pub bird_size: f64,
    pub bird_x: f64,
    pub cloud_count: usize,
    pub fixed_step_ms: f64,
    pub gravity: f64,
    pub flap_impulse: f64,
    pub max_fall_speed: f64,
    pub difficulty: Difficulty,
    pub banner: BannerText,
    pub cities: Vec<CityPreset>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Normal)
    }
}

impl GameConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            width: 400.0,
            height: 600.0,
            ground_height: 80.0,
            pipe_width: 60.0,
            pipe_gap: difficulty.pipe_gap(),
            pipe_speed: difficulty.pipe_speed(),
            pipe_spacing: 220.0,
            bird_size: 20.0,
            bird_x: 90.0,
            cloud_count: 6,
            fixed_step_ms: FIXED_STEP_MS,
            gravity: difficulty.gravity(),
            flap_impulse: difficulty.flap_impulse(),
            max_fall_speed: 600.0,
            difficulty,
            banner: BannerText::default(),
            cities: CityPreset::default_cities(),
        }
    }

    /// Same dimensions and cosmetics, other difficulty's physics.
    pub fn with_difficulty(&self, difficulty: Difficulty) -> Self {
        Self {
            pipe_gap: difficulty.pipe_gap(),
            pipe_speed: difficulty.pipe_speed(),
            gravity: difficulty.gravity(),
            flap_impulse: difficulty.flap_impulse(),
            difficulty,
            ..self.clone()
        }
    }

    pub fn with_size(&self, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..self.clone()
        }
    }

    /// Top edge of the ground strip, world y.
    pub fn ground_y(&self) -> f64 {
        self.height - self.ground_height
    }

    pub fn fixed_step_secs(&self) -> f64 {
        self.fixed_step_ms / 1000.0
    }

    /// Bird spawn height.
    pub fn bird_start_y(&self) -> f64 {
        self.ground_y() * 0.45
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("ground_height", self.ground_height)?;
        positive("pipe_width", self.pipe_width)?;
        positive("pipe_gap", self.pipe_gap)?;
        positive("pipe_speed", self.pipe_speed)?;
        positive("pipe_spacing", self.pipe_spacing)?;
        positive("bird_size", self.bird_size)?;
        positive("fixed_step_ms", self.fixed_step_ms)?;
        positive("gravity", self.gravity)?;
        positive("max_fall_speed", self.max_fall_speed)?;

        if !self.flap_impulse.is_finite() || self.flap_impulse >= 0.0 {
            return Err(EngineError::invalid("flap_impulse", "must point upward (negative)"));
        }
        if self.ground_height >= self.height {
            return Err(EngineError::invalid("ground_height", "must be below world height"));
        }
        if self.pipe_gap >= self.ground_y() {
            return Err(EngineError::invalid("pipe_gap", "must fit above the ground"));
        }
        if !(0.0..self.width).contains(&self.bird_x) {
            return Err(EngineError::invalid("bird_x", "must lie inside the world"));
        }
        if self.cities.is_empty() {
            return Err(EngineError::invalid("cities", "at least one city preset is required"));
        }
        for city in &self.cities {
            if city.height.base < 0.0 || city.height.spread < 0.0 {
                return Err(EngineError::invalid("cities", format!("`{}` has a negative height", city.name)));
            }
            if city.min_width <= 0.0 || city.max_width < city.min_width {
                return Err(EngineError::invalid("cities", format!("`{}` has a bad width range", city.name)));
            }
        }
        Ok(())
    }
}

/// Startup switches read from the page URL, e.g. `?difficulty=hard&seed=42&debug=1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostOptions {
    pub difficulty: Option<Difficulty>,
    pub seed: Option<u64>,
    pub debug: bool,
    pub theme: Option<String>,
    /// `sky=rrggbb` overrides the top sky colour.
    pub sky: Option<Rgba>,
}

impl HostOptions {
    /// Parses a `location.search` string. Unknown keys are ignored and malformed
    /// values fall back to defaults.
    pub fn from_query(query: &str) -> Self {
        let mut options = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "difficulty" => options.difficulty = Difficulty::from_key(value).ok(),
                "seed" => options.seed = value.parse().ok(),
                "debug" => options.debug = matches!(value, "1" | "true"),
                "theme" if !value.is_empty() => options.theme = Some(value.to_string()),
                "sky" => options.sky = Rgba::from_hex(value),
                _ => {}
            }
        }
        options
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(field, format!("must be positive, got {value}")))
    }
}
