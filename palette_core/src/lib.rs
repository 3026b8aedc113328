use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub mod color;
pub mod display;
pub mod effects;
pub mod fade;
pub mod palette;
pub mod presets;
pub mod runtime;
pub mod slotcmd;

pub use color::{Color, Hsl, Rgb, partial_color_transition};
pub use display::DisplayState;
pub use effects::Effect;
pub use fade::{Fade, Step};
pub use palette::Palette;
pub use runtime::{Host, ManualHost, PaletteRuntime, SceneId};

pub fn version() -> &'static str {
    "0.1.0"
}

fn default_fade_ms() -> u64 {
    1000
}

fn default_base() -> Palette {
    presets::DEFAULT.clone()
}

/// A project is the document we save/load: the display's base palette,
/// the user's own palettes and a default fade length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteProject {
    pub name: String,

    #[serde(default = "default_base")]
    pub base: Palette,

    #[serde(default)]
    pub palettes: BTreeMap<String, Palette>,

    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

impl PaletteProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: default_base(),
            palettes: BTreeMap::new(),
            fade_ms: default_fade_ms(),
        }
    }

    /// Save the project to JSON.
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize project to json")?;
        fs::write(path.as_ref(), json).context("write project json file")?;
        Ok(())
    }

    /// Load the project from JSON.
    pub fn load_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref()).context("read project json file")?;
        let project =
            serde_json::from_str::<PaletteProject>(&text).context("parse project json")?;
        Ok(project)
    }

    /// Looks up a palette by name: the project's own palettes win over presets.
    pub fn palette(&self, name: &str) -> Option<Palette> {
        self.palettes
            .get(name)
            .cloned()
            .or_else(|| presets::preset(name).cloned())
    }

    pub fn insert_palette(&mut self, name: impl Into<String>, palette: Palette) {
        self.palettes.insert(name.into(), palette);
    }

    /// A runtime whose display starts from this project's base palette.
    pub fn runtime<H: Host>(&self, host: H) -> PaletteRuntime<H> {
        PaletteRuntime::new(host, self.base.clone())
    }
}
