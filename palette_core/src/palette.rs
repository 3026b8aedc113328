use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::color::{Color, Hsl, Rgb, partial_color_transition};

/// Bytes per palette slot (r, g, b).
pub const BYTES_PER_COLOR: usize = 3;

/// Slot count of a 4-bit indexed palette.
pub const DEFAULT_LEN: usize = 16;

/// A fixed-length indexed color table stored as packed `r, g, b` bytes.
///
/// Reads and writes outside the table never panic: writes are ignored and
/// reads return `None`, so animation math that briefly produces a bad index
/// keeps playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    buf: Vec<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_LEN)
    }
}

impl Palette {
    /// A palette of `len` black slots.
    pub fn new(len: usize) -> Self {
        Self {
            buf: vec![0; len * BYTES_PER_COLOR],
        }
    }

    /// Copies `buf`. Trailing bytes that do not make up a whole slot are dropped.
    pub fn from_buffer(buf: &[u8]) -> Self {
        let whole = buf.len() - buf.len() % BYTES_PER_COLOR;
        Self {
            buf: buf[..whole].to_vec(),
        }
    }

    pub fn from_colors(colors: &[Color]) -> Self {
        let mut buf = Vec::with_capacity(colors.len() * BYTES_PER_COLOR);
        for c in colors {
            buf.extend_from_slice(&[c.red(), c.green(), c.blue()]);
        }
        Self { buf }
    }

    pub fn from_rgb(colors: &[Rgb]) -> Self {
        let colors: Vec<Color> = colors.iter().copied().map(Color::from).collect();
        Self::from_colors(&colors)
    }

    pub fn from_hsl(colors: &[Hsl]) -> Self {
        let colors: Vec<Color> = colors.iter().copied().map(Color::from).collect();
        Self::from_colors(&colors)
    }

    /// `steps` colors evenly spaced from `start` to `end` inclusive.
    /// Fewer than two steps cannot hold both ends, so this returns `None`.
    pub fn gradient(start: Color, end: Color, steps: usize) -> Option<Self> {
        if steps < 2 {
            return None;
        }

        let last = (steps - 1) as f32;
        let colors: Vec<Color> = (0..steps)
            .map(|i| partial_color_transition(start, end, i as f32 / last))
            .collect();

        Some(Self::from_colors(&colors))
    }

    /// Number of color slots.
    pub fn len(&self) -> usize {
        self.buf.len() / BYTES_PER_COLOR
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn color(&self, index: usize) -> Option<Color> {
        if index >= self.len() {
            return None;
        }
        let at = index * BYTES_PER_COLOR;
        Some(Color::rgb(self.buf[at], self.buf[at + 1], self.buf[at + 2]))
    }

    pub fn set_color(&mut self, index: usize, color: Color) {
        if index >= self.len() {
            return;
        }
        let at = index * BYTES_PER_COLOR;
        self.buf[at] = color.red();
        self.buf[at + 1] = color.green();
        self.buf[at + 2] = color.blue();
    }

    /// Like [`Palette::set_color`] for a raw hex value; values above
    /// `0xFFFFFF` are ignored.
    pub fn set_hex(&mut self, index: usize, hex: u32) {
        if let Some(c) = Color::from_hex(hex) {
            self.set_color(index, c);
        }
    }

    /// An independent copy of the backing bytes.
    pub fn buffer(&self) -> Vec<u8> {
        self.buf.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Replaces the contents with a private copy of `buf`.
    pub fn load_buffer(&mut self, buf: &[u8]) {
        *self = Self::from_buffer(buf);
    }

    pub fn colors(&self) -> Vec<Color> {
        self.buf
            .chunks_exact(BYTES_PER_COLOR)
            .map(|rgb| Color::rgb(rgb[0], rgb[1], rgb[2]))
            .collect()
    }

    fn clamp_range(&self, range: RangeInclusive<usize>) -> RangeInclusive<usize> {
        let last = self.len().saturating_sub(1);
        let (first, end) = range.into_inner();
        first..=end.min(last)
    }

    /// New palette with every slot in `range` replaced by `f` applied to its
    /// RGB view. `f` also gets the slot index and the unmodified palette.
    pub fn map_rgb<F>(&self, range: RangeInclusive<usize>, mut f: F) -> Palette
    where
        F: FnMut(Rgb, usize, &Palette) -> Rgb,
    {
        let mut out = self.clone();
        if self.is_empty() {
            return out;
        }
        for i in self.clamp_range(range) {
            if let Some(c) = self.color(i) {
                out.set_color(i, f(Rgb::from(c), i, self).into());
            }
        }
        out
    }

    /// HSL counterpart of [`Palette::map_rgb`].
    pub fn map_hsl<F>(&self, range: RangeInclusive<usize>, mut f: F) -> Palette
    where
        F: FnMut(Hsl, usize, &Palette) -> Hsl,
    {
        let mut out = self.clone();
        if self.is_empty() {
            return out;
        }
        for i in self.clamp_range(range) {
            if let Some(c) = self.color(i) {
                out.set_color(i, f(Hsl::from(c), i, self).into());
            }
        }
        out
    }

    /// Shifts slots `first..` one place up, wrapping the last slot to `first`.
    pub fn rotated(&self, first: usize) -> Palette {
        let mut out = self.clone();
        let n = self.len();
        if first + 1 >= n {
            return out;
        }
        for i in first..n {
            let src = if i == first { n - 1 } else { i - 1 };
            if let Some(c) = self.color(src) {
                out.set_color(i, c);
            }
        }
        out
    }
}

impl From<Vec<Color>> for Palette {
    fn from(colors: Vec<Color>) -> Self {
        Self::from_colors(&colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(p: Palette) -> Self {
        p.colors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(v: u32) -> Color {
        Color::from_hex(v).unwrap()
    }

    #[test]
    fn new_palette_is_zeroed() {
        let p = Palette::default();
        assert_eq!(p.len(), 16);
        assert_eq!(p.as_bytes().len(), 48);
        assert!(p.colors().iter().all(|c| *c == Color::BLACK));
    }

    #[test]
    fn out_of_range_access_is_absorbed() {
        let mut p = Palette::new(16);
        p.set_color(3, hex(0x123456));
        let before = p.clone();

        p.set_color(16, Color::WHITE);
        p.set_color(usize::MAX, Color::WHITE);
        p.set_hex(2, 0x1000000);

        assert_eq!(p, before);
        assert_eq!(p.color(16), None);
        assert_eq!(p.color(usize::MAX), None);
        assert_eq!(p.color(3), Some(hex(0x123456)));
    }

    #[test]
    fn copies_never_alias() {
        let mut src = vec![1u8, 2, 3, 4, 5, 6];
        let mut p = Palette::from_buffer(&src);
        src[0] = 99;
        assert_eq!(p.color(0), Some(Color::rgb(1, 2, 3)));

        let mut copy = p.buffer();
        copy[1] = 77;
        assert_eq!(p.color(0), Some(Color::rgb(1, 2, 3)));

        let cloned = p.clone();
        p.set_color(1, Color::WHITE);
        assert_eq!(cloned.color(1), Some(Color::rgb(4, 5, 6)));

        p.load_buffer(&src);
        src[3] = 0;
        assert_eq!(p.color(0), Some(Color::rgb(99, 2, 3)));
        assert_eq!(p.color(1), Some(Color::rgb(4, 5, 6)));
    }

    #[test]
    fn partial_trailing_bytes_are_dropped() {
        let p = Palette::from_buffer(&[1, 2, 3, 4, 5]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.as_bytes().len() % BYTES_PER_COLOR, 0);
    }

    #[test]
    fn gradient_needs_two_steps() {
        assert!(Palette::gradient(Color::BLACK, Color::WHITE, 1).is_none());
        assert!(Palette::gradient(Color::BLACK, Color::WHITE, 0).is_none());

        let g = Palette::gradient(Color::BLACK, Color::WHITE, 3).unwrap();
        assert_eq!(g.colors(), vec![Color::BLACK, hex(0x808080), Color::WHITE]);
    }

    #[test]
    fn map_hsl_only_touches_range() {
        let p = Palette::from_colors(&[hex(0xFF0000), hex(0x00FF00), hex(0x0000FF)]);
        let darker = p.map_hsl(1..=10, |mut hsl, _, _| {
            hsl.set_luminosity(hsl.luminosity() / 2.0);
            hsl
        });

        assert_eq!(darker.color(0), Some(hex(0xFF0000)));
        assert_eq!(darker.color(1), Some(hex(0x008000)));
        assert_eq!(darker.color(2), Some(hex(0x000080)));
        // source untouched
        assert_eq!(p.color(1), Some(hex(0x00FF00)));
    }

    #[test]
    fn map_rgb_sees_index_and_source() {
        let p = Palette::from_colors(&[hex(0x101010), hex(0x202020)]);
        let swapped = p.map_rgb(0..=1, |_, i, src| {
            Rgb::from(src.color(1 - i).unwrap_or_default())
        });
        assert_eq!(swapped.colors(), vec![hex(0x202020), hex(0x101010)]);
    }

    #[test]
    fn rotated_keeps_leading_slots() {
        let p = Palette::from_colors(&[hex(0), hex(1), hex(2), hex(3)]);
        assert_eq!(p.rotated(1).colors(), vec![hex(0), hex(3), hex(1), hex(2)]);
        assert_eq!(p.rotated(0).colors(), vec![hex(3), hex(0), hex(1), hex(2)]);
        assert_eq!(p.rotated(3), p);
    }

    #[test]
    fn serializes_as_color_list() -> anyhow::Result<()> {
        let p = Palette::from_colors(&[hex(0x112233), hex(0x445566)]);
        let json = serde_json::to_string(&p)?;
        assert_eq!(json, r##"["#112233","#445566"]"##);
        let back: Palette = serde_json::from_str(&json)?;
        assert_eq!(back, p);
        Ok(())
    }
}
