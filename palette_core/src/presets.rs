//! Built-in palettes. These are shared and never mutated; clone one to edit it.

use std::sync::LazyLock;

use crate::Palette;
use crate::color::Color;
use crate::palette::DEFAULT_LEN;

const ARCADE_HEX: [u32; 16] = [
    0x000000, 0xFFFFFF, 0xFF2121, 0xFF93C4, 0xFF8135, 0xFFF609, 0x249CA3, 0x78DC52, 0x003FAD,
    0x87F2FF, 0x8E2EC4, 0xA4839F, 0x5C406C, 0xE5CDC4, 0x91463D, 0x000000,
];

const ADAFRUIT_HEX: [u32; 16] = [
    0x000000, 0x17ABFF, 0xDF2929, 0xC600FF, 0xFF007D, 0x00FF72, 0xE5FF00, 0x0034FF, 0xFFFFFF,
    0x00EFFF, 0xFF0000, 0x7400DB, 0x636363, 0xFF7A00, 0x2D9F00, 0x000000,
];

const MATTE_HEX: [u32; 16] = [
    0x000000, 0x1D2B53, 0x7E2553, 0x008751, 0xAB5236, 0x5F574F, 0xC2C3C7, 0xFFF1E8, 0xFF004D,
    0xFFA300, 0xFFEC27, 0x00E436, 0x29ADFF, 0x83769C, 0xFF77A8, 0xFFCCAA,
];

const GRAY_SCALE_HEX: [u32; 16] = [
    0x000000, 0xFFFFFF, 0xEDEDED, 0xDBDBDB, 0xC8C8C8, 0xB6B6B6, 0xA4A4A4, 0x929292, 0x808080,
    0x6D6D6D, 0x5B5B5B, 0x494949, 0x373737, 0x242424, 0x121212, 0x000000,
];

fn from_table(table: &[u32]) -> Palette {
    let mut p = Palette::new(table.len());
    for (i, &hex) in table.iter().enumerate() {
        p.set_hex(i, hex);
    }
    p
}

fn solid(c: Color) -> Palette {
    Palette::gradient(c, c, DEFAULT_LEN).unwrap_or_default()
}

/// The display's original palette, restored by `reset_to_default`.
pub static DEFAULT: LazyLock<Palette> = LazyLock::new(|| from_table(&ARCADE_HEX));
pub static ADAFRUIT: LazyLock<Palette> = LazyLock::new(|| from_table(&ADAFRUIT_HEX));
pub static ARCADE: LazyLock<Palette> = LazyLock::new(|| from_table(&ARCADE_HEX));
pub static MATTE: LazyLock<Palette> = LazyLock::new(|| from_table(&MATTE_HEX));
pub static GRAY_SCALE: LazyLock<Palette> = LazyLock::new(|| from_table(&GRAY_SCALE_HEX));
pub static BLACK: LazyLock<Palette> = LazyLock::new(|| solid(Color::BLACK));
pub static WHITE: LazyLock<Palette> = LazyLock::new(|| solid(Color::WHITE));

pub const NAMES: [&str; 7] = [
    "default",
    "adafruit",
    "arcade",
    "matte",
    "grayscale",
    "black",
    "white",
];

/// Case-insensitive lookup by name.
pub fn preset(name: &str) -> Option<&'static Palette> {
    let p: &'static LazyLock<Palette> = match name.to_ascii_lowercase().as_str() {
        "default" => &DEFAULT,
        "adafruit" => &ADAFRUIT,
        "arcade" => &ARCADE,
        "matte" => &MATTE,
        "grayscale" | "gray_scale" => &GRAY_SCALE,
        "black" => &BLACK,
        "white" => &WHITE,
        _ => return None,
    };
    Some(LazyLock::force(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves_to_sixteen_slots() {
        for name in NAMES {
            let p = preset(name).unwrap();
            assert_eq!(p.len(), 16, "{name}");
        }
        assert!(preset("MATTE").is_some());
        assert!(preset("sepia").is_none());
    }

    #[test]
    fn solid_presets() {
        assert!(BLACK.colors().iter().all(|c| *c == Color::BLACK));
        assert!(WHITE.colors().iter().all(|c| *c == Color::WHITE));
    }

    #[test]
    fn tables_load_in_order() {
        assert_eq!(ARCADE.color(2), Color::from_hex(0xFF2121));
        assert_eq!(MATTE.color(15), Color::from_hex(0xFFCCAA));
        assert_eq!(*DEFAULT, *ARCADE);
    }
}
