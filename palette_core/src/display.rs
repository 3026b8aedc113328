use crate::Palette;
use crate::color::Color;
use crate::palette::BYTES_PER_COLOR;

/// The color buffer currently shown on screen.
///
/// Starts out as a copy of the original palette the first time anything is
/// applied; every apply hands back the whole buffer for the host to push.
#[derive(Debug, Clone)]
pub struct DisplayState {
    original: Palette,
    current: Option<Vec<u8>>,
}

impl DisplayState {
    pub fn new(original: Palette) -> Self {
        Self {
            original,
            current: None,
        }
    }

    pub fn original(&self) -> &Palette {
        &self.original
    }

    /// Slot count of the display.
    pub fn available_colors(&self) -> usize {
        self.original.len()
    }

    /// Overwrites `length` slots of the live buffer starting at slot `start`
    /// with the slots of `palette` starting at `source_offset`, then returns
    /// the entire live buffer.
    ///
    /// `length == 0` (or one longer than `palette`) means all of `palette`.
    /// The copy stops at whichever buffer ends first.
    pub fn apply(
        &mut self,
        palette: &Palette,
        start: usize,
        length: usize,
        source_offset: usize,
    ) -> &[u8] {
        let length = if length == 0 || length > palette.len() {
            palette.len()
        } else {
            length
        };

        let available = self.available_colors();
        let original = &self.original;
        let current = self.current.get_or_insert_with(|| original.buffer());

        let src = palette.as_bytes();
        let from = source_offset.saturating_mul(BYTES_PER_COLOR);
        let to = start.saturating_mul(BYTES_PER_COLOR);

        let count = (BYTES_PER_COLOR * length.min(available))
            .min(src.len().saturating_sub(from))
            .min(current.len().saturating_sub(to));

        if count > 0 {
            current[to..to + count].copy_from_slice(&src[from..from + count]);
        }

        current.as_slice()
    }

    /// Snapshot of what is on screen.
    pub fn snapshot(&self) -> Palette {
        match &self.current {
            Some(buf) => Palette::from_buffer(buf),
            None => self.original.clone(),
        }
    }

    /// A palette holding at most [`DisplayState::available_colors`] of `colors`.
    pub fn palette_from_colors(&self, colors: &[Color]) -> Palette {
        let n = colors.len().min(self.available_colors());
        Palette::from_colors(&colors[..n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    fn hex(v: u32) -> Color {
        Color::from_hex(v).unwrap()
    }

    #[test]
    fn first_apply_starts_from_original() {
        let mut d = DisplayState::new(presets::ARCADE.clone());
        let patch = Palette::from_colors(&[hex(0x010203)]);

        let live = d.apply(&patch, 2, 1, 0).to_vec();

        assert_eq!(live.len(), 48);
        let snap = Palette::from_buffer(&live);
        assert_eq!(snap.color(2), Some(hex(0x010203)));
        assert_eq!(snap.color(1), presets::ARCADE.color(1));
        assert_eq!(d.snapshot(), snap);
    }

    #[test]
    fn zero_length_copies_whole_palette() {
        let mut d = DisplayState::new(presets::ARCADE.clone());
        d.apply(&presets::BLACK, 0, 0, 0);
        assert_eq!(d.snapshot(), *presets::BLACK);

        d.apply(&presets::WHITE, 0, 99, 0);
        assert_eq!(d.snapshot(), *presets::WHITE);
    }

    #[test]
    fn source_offset_and_overflow_are_bounded() {
        let mut d = DisplayState::new(Palette::new(4));
        let src = Palette::from_colors(&[hex(0x111111), hex(0x222222), hex(0x333333)]);

        d.apply(&src, 2, 3, 1);
        let snap = d.snapshot();
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.color(1), Some(Color::BLACK));
        assert_eq!(snap.color(2), Some(hex(0x222222)));
        assert_eq!(snap.color(3), Some(hex(0x333333)));

        // past the end on both sides: nothing to copy, nothing panics
        d.apply(&src, 10, 1, 0);
        d.apply(&src, 0, 1, 10);
        assert_eq!(d.snapshot(), snap);
    }

    #[test]
    fn color_list_is_capped_to_display() {
        let d = DisplayState::new(presets::DEFAULT.clone());
        let p = d.palette_from_colors(&[hex(0x112233), hex(0x445566)]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.color(0), Some(hex(0x112233)));
        assert_eq!(p.color(1), Some(hex(0x445566)));

        let many = vec![Color::WHITE; 40];
        assert_eq!(d.palette_from_colors(&many).len(), 16);
    }

    #[test]
    fn snapshot_before_any_apply_is_original() {
        let d = DisplayState::new(presets::MATTE.clone());
        assert_eq!(d.snapshot(), *presets::MATTE);
    }
}
