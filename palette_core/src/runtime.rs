use log::{debug, trace};

use crate::color::Color;
use crate::display::DisplayState;
use crate::effects::Effect;
use crate::fade::{Fade, Step};
use crate::{Palette, presets};

/// Identity of a scene on the host's scene stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u32);

/// What the runtime needs from the engine it is embedded in.
pub trait Host {
    /// Monotonic milliseconds since start.
    fn now_ms(&self) -> u64;

    fn current_scene(&self) -> SceneId;

    /// Push a full indexed-color buffer (3 bytes per slot) to the screen.
    fn apply_raw_palette(&mut self, buf: &[u8]);

    /// Called once, when the first fade starts. From then on the host must
    /// call [`PaletteRuntime::on_frame`] once per rendered frame.
    fn register_frame_callback(&mut self) {}
}

/// Deterministic host: the clock only moves when told to, scenes are a
/// plain stack, and every pushed buffer is recorded.
#[derive(Debug, Clone)]
pub struct ManualHost {
    pub now_ms: u64,
    scenes: Vec<SceneId>,
    next_scene: u32,
    pub frame_callbacks: u32,
    pub pushed: Vec<Vec<u8>>,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self {
            now_ms: 0,
            scenes: vec![SceneId(0)],
            next_scene: 1,
            frame_callbacks: 0,
            pushed: Vec::new(),
        }
    }
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }

    /// Enters a fresh scene and returns its id.
    pub fn push_scene(&mut self) -> SceneId {
        let id = SceneId(self.next_scene);
        self.next_scene += 1;
        self.scenes.push(id);
        id
    }

    /// Leaves the current scene. The root scene is never popped.
    pub fn pop_scene(&mut self) -> Option<SceneId> {
        if self.scenes.len() > 1 {
            self.scenes.pop()
        } else {
            None
        }
    }

    pub fn scene_depth(&self) -> usize {
        self.scenes.len()
    }

    pub fn last_pushed(&self) -> Option<Palette> {
        self.pushed.last().map(|b| Palette::from_buffer(b))
    }
}

impl Host for ManualHost {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn current_scene(&self) -> SceneId {
        self.scenes.last().copied().unwrap_or(SceneId(0))
    }

    fn apply_raw_palette(&mut self, buf: &[u8]) {
        self.pushed.push(buf.to_vec());
    }

    fn register_frame_callback(&mut self) {
        self.frame_callbacks += 1;
    }
}

/// A fade parked while another scene is on top.
#[derive(Debug, Clone)]
struct FadeState {
    fade: Option<Fade>,
    fade_id: u64,
    scene: SceneId,
}

/// Owns everything palette-related that a running game shares: the live
/// display buffer, the single active fade, and the fades parked for scenes
/// further down the scene stack.
#[derive(Debug)]
pub struct PaletteRuntime<H: Host> {
    host: H,
    display: DisplayState,
    active_fade: Option<Fade>,
    // bumped by every started fade
    active_fade_id: u64,
    current_scene: Option<SceneId>,
    fade_stack: Vec<FadeState>,
    frame_hook: bool,
    last_effect: Option<Effect>,
    effect_fade_id: Option<u64>,
    palette_before_effect: Option<Palette>,
}

impl<H: Host> PaletteRuntime<H> {
    pub fn new(host: H, original: Palette) -> Self {
        Self {
            host,
            display: DisplayState::new(original),
            active_fade: None,
            active_fade_id: 0,
            current_scene: None,
            fade_stack: Vec::new(),
            frame_hook: false,
            last_effect: None,
            effect_fade_id: None,
            palette_before_effect: None,
        }
    }

    /// A runtime over the built-in default palette.
    pub fn with_default_palette(host: H) -> Self {
        Self::new(host, presets::DEFAULT.clone())
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn available_colors(&self) -> usize {
        self.display.available_colors()
    }

    pub fn current_palette(&self) -> Palette {
        self.display.snapshot()
    }

    pub fn palette_from_colors(&self, colors: &[Color]) -> Palette {
        self.display.palette_from_colors(colors)
    }

    /// Copies (part of) `palette` into the live buffer and pushes the whole
    /// buffer to the host. See [`DisplayState::apply`].
    pub fn apply_palette(
        &mut self,
        palette: &Palette,
        start: usize,
        length: usize,
        source_offset: usize,
    ) {
        let buf = self.display.apply(palette, start, length, source_offset);
        self.host.apply_raw_palette(buf);
    }

    pub fn set_palette(&mut self, palette: &Palette) {
        self.apply_palette(palette, 0, 0, 0);
    }

    /// Sets a single slot. Slot 0 is the transparent/background slot and is
    /// left alone, as are slots past the end of the display.
    pub fn set_color(&mut self, index: usize, color: Color) {
        if index == 0 || index >= self.available_colors() {
            return;
        }
        self.apply_palette(&Palette::from_colors(&[color]), index, 1, 0);
    }

    pub fn reset_to_default(&mut self) {
        let original = self.display.original().clone();
        self.set_palette(&original);
    }

    fn ensure_frame_hook(&mut self) {
        if !self.frame_hook {
            self.frame_hook = true;
            self.host.register_frame_callback();
            debug!("frame callback registered");
        }
        if self.current_scene.is_none() {
            self.current_scene = Some(self.host.current_scene());
        }
    }

    /// Starts `fade` over `duration_ms` and makes it the active fade,
    /// stopping whatever was running.
    ///
    /// Unset palettes become snapshots of the screen. If the start and end
    /// palettes differ in length nothing happens and `false` is returned.
    pub fn start_fade(&mut self, mut fade: Fade, duration_ms: u64) -> bool {
        let current = self.current_palette();
        fade.resolve(&current);
        if !fade.is_well_formed() {
            debug!("fade ignored: start and end palettes differ in length");
            return false;
        }

        self.ensure_frame_hook();

        if let Some(start) = fade.start_palette().cloned() {
            self.set_palette(&start);
        }
        fade.begin(self.host.now_ms(), duration_ms);

        self.active_fade_id += 1;
        if let Some(mut previous) = self.active_fade.replace(fade) {
            previous.stop();
            debug!("previous fade evicted");
        }
        debug!(
            "fade started at {}ms for {}ms",
            self.host.now_ms(),
            duration_ms
        );
        true
    }

    pub fn start_fade_between(
        &mut self,
        start: &Palette,
        end: &Palette,
        duration_ms: u64,
    ) -> bool {
        if start.len() != end.len() {
            return false;
        }
        let fade = Fade::new().with_start_palette(start).with_end_palette(end);
        self.start_fade(fade, duration_ms)
    }

    /// Stops the active fade where it is and hands it back.
    pub fn stop_fade(&mut self) -> Option<Fade> {
        let mut fade = self.active_fade.take()?;
        fade.stop();
        debug!("fade stopped");
        Some(fade)
    }

    /// Swaps the active fade's start and end palettes.
    pub fn reverse_fade(&mut self) {
        if let Some(fade) = &mut self.active_fade {
            fade.reverse();
        }
    }

    pub fn active_fade(&self) -> Option<&Fade> {
        self.active_fade.as_ref()
    }

    pub fn is_fade_active(&self) -> bool {
        let now = self.host.now_ms();
        self.active_fade.as_ref().is_some_and(|f| f.is_active(now))
    }

    /// Per-frame work: step the active fade and show the result.
    pub fn on_frame(&mut self) {
        let now = self.host.now_ms();
        let Some(fade) = &mut self.active_fade else {
            return;
        };

        let step = fade.step(now);
        trace!("frame at {now}ms, finished: {}", step.is_finished());

        if let Some(p) = step.palette() {
            let p = p.clone();
            self.set_palette(&p);
        }
        if step.is_finished() {
            if matches!(step, Step::Completed(_)) {
                debug!("fade completed at {now}ms");
            }
            self.active_fade = None;
        }
    }

    /// The host pushed a new scene on top of the current one.
    ///
    /// The current scene's fade (if any) is parked; the new scene starts with
    /// no fade.
    pub fn on_scene_push(&mut self) {
        if let Some(scene) = self.current_scene.take() {
            let fade = self.active_fade.take();
            debug!(
                "scene {:?} pushed down, parking {}",
                scene,
                if fade.is_some() { "its fade" } else { "no fade" }
            );
            self.fade_stack.push(FadeState {
                fade,
                fade_id: self.active_fade_id,
                scene,
            });
        }
    }

    /// The host popped back to [`Host::current_scene`].
    ///
    /// If the top parked entry belongs to that scene, its fade becomes the
    /// active fade again, with its original start time.
    pub fn on_scene_pop(&mut self) {
        let scene = self.host.current_scene();
        self.current_scene = None;
        self.active_fade = None;

        let Some(top) = self.fade_stack.pop() else {
            return;
        };

        if top.scene == scene {
            debug!("scene {:?} resumed", scene);
            self.active_fade = top.fade;
            self.active_fade_id = top.fade_id;
            self.current_scene = Some(top.scene);
        } else {
            self.fade_stack.push(top);
        }
    }

    /// Number of scenes with parked fade state.
    pub fn parked_scenes(&self) -> usize {
        self.fade_stack.len()
    }

    /// Cooperative wait for the active fade to finish.
    ///
    /// While a fade is active, control goes to `next_frame` (which should let
    /// time pass on the host) and then a frame is run.
    pub fn pause_until_fade_done<F>(&mut self, mut next_frame: F)
    where
        F: FnMut(&mut H),
    {
        while self.is_fade_active() {
            next_frame(&mut self.host);
            self.on_frame();
        }
        // the frame that notices the deadline shows the end palette
        if self.active_fade.is_some() {
            self.on_frame();
        }
    }

    /// Starts `effect`, remembering the palette it started from so
    /// [`PaletteRuntime::clear_fade_effect`] can put it back.
    ///
    /// Nothing is recorded when the effect's fade cannot start.
    pub fn start_effect(&mut self, effect: Effect, duration_ms: u64) -> bool {
        self.stop_effect();
        let current = self.current_palette();
        let fade = effect.build(&current);
        if !self.start_fade(fade, duration_ms) {
            return false;
        }
        self.palette_before_effect = Some(current);
        self.last_effect = Some(effect);
        self.effect_fade_id = Some(self.active_fade_id);
        debug!("effect '{}' for {}ms", effect.name(), duration_ms);
        true
    }

    /// Stops the running effect's fade, leaving the screen as it is.
    ///
    /// Fades started after the effect, by the user or in another scene, are
    /// not touched.
    pub fn stop_effect(&mut self) {
        self.last_effect = None;
        let Some(id) = self.effect_fade_id.take() else {
            return;
        };
        if self.active_fade.is_some() && id == self.active_fade_id {
            self.stop_fade();
        }
    }

    /// Stops the last effect and restores the palette shown before it.
    pub fn clear_fade_effect(&mut self) {
        self.stop_effect();
        if let Some(p) = self.palette_before_effect.take() {
            self.set_palette(&p);
        }
    }

    pub fn last_effect(&self) -> Option<Effect> {
        self.last_effect
    }
}
