use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A packed 24-bit color, `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const MAX: u32 = 0xFFFFFF;

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// `None` when `hex` does not fit in 24 bits.
    pub const fn from_hex(hex: u32) -> Option<Self> {
        if hex > Self::MAX {
            None
        } else {
            Some(Self(hex))
        }
    }

    pub const fn hex(self) -> u32 {
        self.0
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    /// Accepts `#RRGGBB`, `0xRRGGBB`, `RRGGBB` and the short `#RGB` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let digits = t
            .strip_prefix('#')
            .or_else(|| t.strip_prefix("0x"))
            .or_else(|| t.strip_prefix("0X"))
            .unwrap_or(t);

        let expanded: String = match digits.len() {
            6 => digits.to_string(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => anyhow::bail!("invalid color '{s}': expected #RRGGBB or #RGB"),
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("invalid color '{s}': not a hex number");
        }

        let hex = u32::from_str_radix(&expanded, 16)
            .with_context(|| format!("invalid color '{s}': not a hex number"))?;

        Ok(Color(hex))
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Rounds halves towards positive infinity, so `127.5` becomes `128`.
pub(crate) fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Returns the color `t` of the way from `start` to `end`, blending each
/// channel linearly in RGB space.
///
/// `t <= 0` returns `start` and `t >= 1` returns `end`, both exactly.
pub fn partial_color_transition(start: Color, end: Color, t: f32) -> Color {
    if t <= 0.0 {
        return start;
    } else if t >= 1.0 {
        return end;
    }

    let lerp = |a: u8, b: u8| -> u8 {
        let a = a as f32;
        let b = b as f32;
        clamp_channel(round_half_up(a + (b - a) * t))
    };

    Color::rgb(
        lerp(start.red(), end.red()),
        lerp(start.green(), end.green()),
        lerp(start.blue(), end.blue()),
    )
}

/// Structured view of a [`Color`]. Setters clamp into `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    pub fn new(red: i32, green: i32, blue: i32) -> Self {
        let mut rgb = Self::default();
        rgb.set_red(red);
        rgb.set_green(green);
        rgb.set_blue(blue);
        rgb
    }

    pub fn red(&self) -> u8 {
        self.r
    }

    pub fn green(&self) -> u8 {
        self.g
    }

    pub fn blue(&self) -> u8 {
        self.b
    }

    pub fn set_red(&mut self, v: i32) {
        self.r = clamp_channel(v);
    }

    pub fn set_green(&mut self, v: i32) {
        self.g = clamp_channel(v);
    }

    pub fn set_blue(&mut self, v: i32) {
        self.b = clamp_channel(v);
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<Color> for Rgb {
    fn from(c: Color) -> Self {
        Self {
            r: c.red(),
            g: c.green(),
            b: c.blue(),
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::rgb(rgb.r, rgb.g, rgb.b)
    }
}

/// Hue in degrees wrapped into `[0, 360)`, saturation and luminosity
/// clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
    h: f32,
    s: f32,
    l: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, luminosity: f32) -> Self {
        let mut hsl = Self::default();
        hsl.set_hue(hue);
        hsl.set_saturation(saturation);
        hsl.set_luminosity(luminosity);
        hsl
    }

    pub fn hue(&self) -> f32 {
        self.h
    }

    pub fn saturation(&self) -> f32 {
        self.s
    }

    pub fn luminosity(&self) -> f32 {
        self.l
    }

    pub fn set_hue(&mut self, v: f32) {
        let h = v % 360.0;
        // tiny negative hues round up to 360.0 in f32
        self.h = if h < 0.0 { 360.0 + h } else { h };
        if self.h >= 360.0 {
            self.h = 0.0;
        }
    }

    pub fn set_saturation(&mut self, v: f32) {
        self.s = v.clamp(0.0, 1.0);
    }

    pub fn set_luminosity(&mut self, v: f32) {
        self.l = v.clamp(0.0, 1.0);
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HSL({}, {}, {})", self.h, self.s, self.l)
    }
}

impl From<Color> for Hsl {
    fn from(c: Color) -> Self {
        let r = c.red() as f32 / 255.0;
        let g = c.green() as f32 / 255.0;
        let b = c.blue() as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let diff = max - min;

        let h = if diff == 0.0 {
            0.0
        } else if max == r {
            ((g - b) / diff) % 6.0
        } else if max == g {
            (b - r) / diff + 2.0
        } else {
            (r - g) / diff + 4.0
        };

        let l = (min + max) / 2.0;
        let s = if diff == 0.0 {
            0.0
        } else {
            diff / (1.0 - (2.0 * l - 1.0).abs())
        };

        Hsl::new(h * 60.0, s, l)
    }
}

impl From<Hsl> for Color {
    fn from(hsl: Hsl) -> Self {
        let chroma = (1.0 - (2.0 * hsl.l - 1.0).abs()) * hsl.s;
        let hp = hsl.h / 60.0;
        // second largest component
        let x = chroma * (1.0 - ((hp % 2.0) - 1.0).abs());

        let (r1, g1, b1) = if hp <= 1.0 {
            (chroma, x, 0.0)
        } else if hp <= 2.0 {
            (x, chroma, 0.0)
        } else if hp <= 3.0 {
            (0.0, chroma, x)
        } else if hp <= 4.0 {
            (0.0, x, chroma)
        } else if hp <= 5.0 {
            (x, 0.0, chroma)
        } else {
            (chroma, 0.0, x)
        };

        let m = hsl.l - chroma * 0.5;
        let channel = |v: f32| clamp_channel(round_half_up(255.0 * (v + m)));

        Color::rgb(channel(r1), channel(g1), channel(b1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_round_trips() {
        for hex in 0..=0xFFFFFF {
            let c = Color::from_hex(hex).unwrap();
            assert_eq!(Color::rgb(c.red(), c.green(), c.blue()), c);
            assert_eq!(Color::from(Rgb::from(c)), c);
        }
        assert_eq!(Color::from_hex(0x1000000), None);
    }

    #[test]
    fn rgb_setters_clamp() {
        let mut rgb = Rgb::new(300, -5, 128);
        assert_eq!((rgb.red(), rgb.green(), rgb.blue()), (255, 0, 128));

        rgb.set_red(300);
        rgb.set_green(-5);
        assert_eq!((rgb.red(), rgb.green(), rgb.blue()), (255, 0, 128));
        assert_eq!(rgb.to_string(), "RGB(255, 0, 128)");
    }

    #[test]
    fn hsl_wraps_hue_and_clamps() {
        let hsl = Hsl::new(-90.0, 1.5, -0.25);
        assert_eq!(hsl.hue(), 270.0);
        assert_eq!(hsl.saturation(), 1.0);
        assert_eq!(hsl.luminosity(), 0.0);

        assert_eq!(Hsl::new(720.0, 0.5, 0.5).hue(), 0.0);
    }

    #[test]
    fn hsl_conversion_matches_primaries() {
        assert_eq!(Color::from(Hsl::new(0.0, 1.0, 0.5)), Color::rgb(255, 0, 0));
        assert_eq!(Color::from(Hsl::new(120.0, 1.0, 0.5)), Color::rgb(0, 255, 0));
        assert_eq!(Color::from(Hsl::new(240.0, 1.0, 0.5)), Color::rgb(0, 0, 255));
        assert_eq!(Color::from(Hsl::new(0.0, 0.0, 1.0)), Color::WHITE);

        let magenta = Hsl::from(Color::rgb(255, 0, 255));
        assert!((magenta.hue() - 300.0).abs() < 0.01);
        assert!((magenta.saturation() - 1.0).abs() < 0.01);
        assert!((magenta.luminosity() - 0.5).abs() < 0.01);
    }

    #[test]
    fn hsl_round_trip_is_close() {
        for hex in [0x249CA3, 0xFF93C4, 0x5C406C, 0x91463D, 0x808080] {
            let c = Color::from_hex(hex).unwrap();
            let back = Color::from(Hsl::from(c));
            assert!((c.red() as i32 - back.red() as i32).abs() <= 1, "{c} -> {back}");
            assert!((c.green() as i32 - back.green() as i32).abs() <= 1, "{c} -> {back}");
            assert!((c.blue() as i32 - back.blue() as i32).abs() <= 1, "{c} -> {back}");
        }
    }

    #[test]
    fn transition_boundaries_are_exact() {
        let a = Color::rgb(12, 200, 7);
        let b = Color::rgb(250, 3, 99);
        assert_eq!(partial_color_transition(a, b, 0.0), a);
        assert_eq!(partial_color_transition(a, b, -1.0), a);
        assert_eq!(partial_color_transition(a, b, 1.0), b);
        assert_eq!(partial_color_transition(a, b, 2.0), b);
    }

    #[test]
    fn transition_blends_each_channel() {
        let mid = partial_color_transition(Color::WHITE, Color::BLACK, 0.5);
        assert_eq!(mid, Color::rgb(128, 128, 128));

        let quarter = partial_color_transition(Color::rgb(0, 100, 200), Color::rgb(100, 0, 200), 0.25);
        assert_eq!(quarter, Color::rgb(25, 75, 200));
    }

    #[test]
    fn parses_and_prints_hex() -> anyhow::Result<()> {
        assert_eq!("#112233".parse::<Color>()?, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!("0xFFaa00".parse::<Color>()?, Color::rgb(0xFF, 0xAA, 0x00));
        assert_eq!("abc".parse::<Color>()?, Color::rgb(0xAA, 0xBB, 0xCC));
        assert!("#12345".parse::<Color>().is_err());
        assert!("zzzzzz".parse::<Color>().is_err());
        assert!("+12345".parse::<Color>().is_err());
        assert!("#+12".parse::<Color>().is_err());

        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102FF");
        Ok(())
    }

    #[test]
    fn serializes_as_hex_string() -> anyhow::Result<()> {
        let json = serde_json::to_string(&Color::rgb(0xDF, 0x29, 0x29))?;
        assert_eq!(json, "\"#DF2929\"");
        let back: Color = serde_json::from_str(&json)?;
        assert_eq!(back, Color::rgb(0xDF, 0x29, 0x29));
        Ok(())
    }
}
