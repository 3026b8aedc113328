use crate::fade::Fade;
use crate::{Palette, presets};

const DARKEN_LUMINOSITY: f32 = 0.75;
const DARKEN_SATURATION: f32 = 0.9;

/// A named, ready-made fade. The end palette is derived when the effect is
/// built, from whatever is on screen at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FadeToBlack,
    FadeToWhite,
    Darken,
    Brighten,
    /// Shifts every slot except the background (slot 0) up by one.
    RotatePalette,
    FadeToPreset(&'static str),
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::FadeToBlack,
        Effect::FadeToWhite,
        Effect::Darken,
        Effect::Brighten,
        Effect::RotatePalette,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::FadeToBlack => "black",
            Effect::FadeToWhite => "white",
            Effect::Darken => "darken",
            Effect::Brighten => "brighten",
            Effect::RotatePalette => "rotate",
            Effect::FadeToPreset(name) => *name,
        }
    }

    /// Accepts the effect names above, plus any preset name.
    pub fn from_name(name: &str) -> Option<Effect> {
        let low = name.to_ascii_lowercase();
        if let Some(e) = Self::ALL.into_iter().find(|e| e.name() == low) {
            return Some(e);
        }
        presets::NAMES
            .into_iter()
            .find(|p| *p == low)
            .map(Effect::FadeToPreset)
    }

    pub fn build(&self, current: &Palette) -> Fade {
        let last = current.len().saturating_sub(1);
        match self {
            Effect::FadeToBlack => Fade::new().with_end_palette(&presets::BLACK),
            Effect::FadeToWhite => Fade::new().with_end_palette(&presets::WHITE),
            Effect::Darken => Fade::new().map_end_hsl(current, 0..=last, |mut hsl, _, _| {
                hsl.set_luminosity(hsl.luminosity() * DARKEN_LUMINOSITY);
                hsl.set_saturation(hsl.saturation() * DARKEN_SATURATION);
                hsl
            }),
            Effect::Brighten => Fade::new().map_end_hsl(current, 0..=last, |mut hsl, _, _| {
                hsl.set_luminosity(hsl.luminosity() / DARKEN_LUMINOSITY);
                hsl.set_saturation(hsl.saturation() / DARKEN_SATURATION);
                hsl
            }),
            Effect::RotatePalette => Fade::new().with_end_palette(&current.rotated(1)),
            Effect::FadeToPreset(name) => match presets::preset(name) {
                Some(p) => Fade::new().with_end_palette(p),
                None => Fade::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, Hsl};

    #[test]
    fn names_round_trip() {
        for e in Effect::ALL {
            assert_eq!(Effect::from_name(e.name()), Some(e));
        }
        assert_eq!(Effect::from_name("Matte"), Some(Effect::FadeToPreset("matte")));
        assert_eq!(Effect::from_name("sparkle"), None);
    }

    #[test]
    fn fade_to_black_leaves_start_unset() {
        let f = Effect::FadeToBlack.build(&presets::ARCADE);
        assert_eq!(f.start_palette(), None);
        assert_eq!(f.end_palette(), Some(&*presets::BLACK));
    }

    #[test]
    fn darken_lowers_luminosity() {
        let current = presets::MATTE.clone();
        let f = Effect::Darken.build(&current);
        let end = f.end_palette().unwrap();

        for i in 0..current.len() {
            let before = Hsl::from(current.color(i).unwrap());
            let after = Hsl::from(end.color(i).unwrap());
            assert!(after.luminosity() <= before.luminosity() + 0.01, "slot {i}");
        }
        assert_eq!(end.color(0), Some(Color::BLACK));
    }

    #[test]
    fn brighten_raises_luminosity() {
        let current = presets::GRAY_SCALE.clone();
        let end = Effect::Brighten.build(&current).end_palette().unwrap().clone();
        assert_eq!(end.color(8), Some(Color::rgb(171, 171, 171)));
        assert_eq!(end.color(1), Some(Color::WHITE));
    }

    #[test]
    fn rotate_keeps_background() {
        let f = Effect::RotatePalette.build(&presets::ARCADE);
        let end = f.end_palette().unwrap();
        assert_eq!(end.color(0), presets::ARCADE.color(0));
        assert_eq!(end.color(1), presets::ARCADE.color(15));
        assert_eq!(end.color(2), presets::ARCADE.color(1));
    }
}
