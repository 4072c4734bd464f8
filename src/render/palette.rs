use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Parses `#rrggbb`, the format the host passes in from query strings.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    pub fn css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a.max(0.0))
        }
    }
}

/// Every colour the renderer uses. Swapping palettes rebuilds the render cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub sky_top: Rgba,
    pub sky_bottom: Rgba,
    pub cloud: Rgba,
    pub cloud_shade: Rgba,
    pub skyline: Rgba,
    pub skyline_window: Rgba,
    pub cactus: Rgba,
    pub plane: Rgba,
    pub buildings: [Rgba; 4],
    pub roof: Rgba,
    pub window: Rgba,
    pub trunk: Rgba,
    pub pine: Rgba,
    pub leaves: Rgba,
    pub ground: Rgba,
    pub ground_accent_top: Rgba,
    pub ground_accent_bottom: Rgba,
    pub ground_deco: Rgba,
    pub pipe: Rgba,
    pub pipe_shade: Rgba,
    pub pipe_cap: Rgba,
    pub bird_body: Rgba,
    pub bird_wing: Rgba,
    pub bird_beak: Rgba,
    pub bird_eye: Rgba,
    pub text: Rgba,
    pub text_shadow: Rgba,
    pub cheese: Rgba,
    pub heart: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            sky_top: Rgba::rgb(0x5b, 0xb8, 0xeb),
            sky_bottom: Rgba::rgb(0xc8, 0xec, 0xfa),
            cloud: Rgba::rgb(0xff, 0xff, 0xff),
            cloud_shade: Rgba::rgb(0xdc, 0xe9, 0xf2),
            skyline: Rgba::rgb(0x9d, 0xbf, 0xd4),
            skyline_window: Rgba::rgb(0xf6, 0xe7, 0xa1),
            cactus: Rgba::rgb(0x7f, 0xa8, 0x6a),
            plane: Rgba::rgb(0xf2, 0xf2, 0xf2),
            buildings: [
                Rgba::rgb(0xd9, 0x8c, 0x6a),
                Rgba::rgb(0xc7, 0xb1, 0x98),
                Rgba::rgb(0x8e, 0xa6, 0xb4),
                Rgba::rgb(0xb5, 0x9f, 0xc9),
            ],
            roof: Rgba::rgb(0x8c, 0x3b, 0x2e),
            window: Rgba::rgb(0xfd, 0xf3, 0xc4),
            trunk: Rgba::rgb(0x6b, 0x47, 0x2a),
            pine: Rgba::rgb(0x2f, 0x7d, 0x3b),
            leaves: Rgba::rgb(0x4c, 0xa6, 0x3f),
            ground: Rgba::rgb(0xde, 0xd8, 0x95),
            ground_accent_top: Rgba::rgb(0x7c, 0xc5, 0x4b),
            ground_accent_bottom: Rgba::rgb(0x55, 0x9a, 0x30),
            ground_deco: Rgba::rgb(0xa8, 0x9d, 0x5a),
            pipe: Rgba::rgb(0x5e, 0xd1, 0x63),
            pipe_shade: Rgba::rgb(0x3c, 0x9a, 0x42),
            pipe_cap: Rgba::rgb(0x4a, 0xb8, 0x50),
            bird_body: Rgba::rgb(0xf7, 0xc8, 0x3e),
            bird_wing: Rgba::rgb(0xe0, 0x9a, 0x22),
            bird_beak: Rgba::rgb(0xf0, 0x6d, 0x2c),
            bird_eye: Rgba::rgb(0x1b, 0x1b, 0x1b),
            text: Rgba::rgb(0xff, 0xff, 0xff),
            text_shadow: Rgba::rgb(0x1e, 0x1e, 0x1e).with_alpha(0.45),
            cheese: Rgba::rgb(0xf9, 0xd7, 0x4c),
            heart: Rgba::rgb(0xe8, 0x3f, 0x5b),
        }
    }
}

impl Palette {
    /// Dusk variant, used by the host's `theme=dusk` query flag.
    pub fn dusk() -> Self {
        Self {
            sky_top: Rgba::rgb(0x2c, 0x2a, 0x5a),
            sky_bottom: Rgba::rgb(0xf0, 0x9a, 0x6c),
            cloud: Rgba::rgb(0xf6, 0xd5, 0xd0),
            cloud_shade: Rgba::rgb(0xc9, 0xa1, 0xb0),
            skyline: Rgba::rgb(0x4b, 0x3f, 0x6b),
            ground: Rgba::rgb(0xb8, 0x9f, 0x74),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgba::from_hex("#5bb8eb"), Some(Rgba::rgb(0x5b, 0xb8, 0xeb)));
        assert_eq!(Rgba::from_hex("ff0000"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(Rgba::from_hex("ff8800zz"), None);
        assert_eq!(Rgba::from_hex("a\u{e9}bbb"), None);
        assert_eq!(Rgba::from_hex("\u{e9}\u{e9}\u{e9}"), None);
        assert_eq!(Rgba::from_hex("+f0000"), None);
        assert_eq!(Rgba::from_hex("zz0000"), None);
        assert_eq!(Rgba::from_hex("#abc"), None);
    }

    #[test]
    fn css_output() {
        assert_eq!(Rgba::rgb(0, 128, 255).css(), "#0080ff");
        assert_eq!(Rgba::rgb(0, 0, 0).with_alpha(0.5).css(), "rgba(0,0,0,0.5)");
    }
}
