use std::ops::RangeInclusive;

use crate::Palette;
use crate::color::{Color, Hsl, Rgb, partial_color_transition};

/// What a single [`Fade::step`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do: the fade is idle or has no end palette.
    Done,
    /// An in-between palette to show this frame.
    Frame(Palette),
    /// The exact end palette; the fade is idle again.
    Completed(Palette),
}

impl Step {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Step::Frame(_))
    }

    pub fn palette(&self) -> Option<&Palette> {
        match self {
            Step::Done => None,
            Step::Frame(p) | Step::Completed(p) => Some(p),
        }
    }
}

/// A timed blend from a start palette to an end palette.
///
/// Unset palettes are filled in from whatever is on screen when the fade is
/// started, so a fade with only an end palette fades from the current look.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fade {
    start: Option<Palette>,
    end: Option<Palette>,
    start_time: Option<u64>,
    duration_ms: u64,
}

impl Fade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_palette(mut self, palette: &Palette) -> Self {
        self.set_start_palette(palette);
        self
    }

    pub fn with_end_palette(mut self, palette: &Palette) -> Self {
        self.set_end_palette(palette);
        self
    }

    pub fn set_start_palette(&mut self, palette: &Palette) {
        self.start = Some(palette.clone());
    }

    pub fn set_end_palette(&mut self, palette: &Palette) {
        self.end = Some(palette.clone());
    }

    pub fn start_palette(&self) -> Option<&Palette> {
        self.start.as_ref()
    }

    pub fn end_palette(&self) -> Option<&Palette> {
        self.end.as_ref()
    }

    /// Sets one start slot, snapshotting `current` first if no start palette is set.
    pub fn set_start_color(&mut self, current: &Palette, index: usize, color: Color) {
        self.start
            .get_or_insert_with(|| current.clone())
            .set_color(index, color);
    }

    /// Sets one end slot, snapshotting `current` first if no end palette is set.
    pub fn set_end_color(&mut self, current: &Palette, index: usize, color: Color) {
        self.end
            .get_or_insert_with(|| current.clone())
            .set_color(index, color);
    }

    /// Fills unset palettes with copies of `current`.
    pub fn resolve(&mut self, current: &Palette) {
        self.start.get_or_insert_with(|| current.clone());
        self.end.get_or_insert_with(|| current.clone());
    }

    /// Both palettes are set and hold the same number of slots.
    pub fn is_well_formed(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(s), Some(e)) => s.len() == e.len(),
            _ => false,
        }
    }

    /// Starts the clock. Palettes should already be resolved.
    pub fn begin(&mut self, now: u64, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.start_time = Some(now);
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.start_time
            .is_some_and(|t| t.saturating_add(self.duration_ms) > now)
    }

    /// Fraction of the duration elapsed, while active.
    pub fn progress(&self, now: u64) -> Option<f32> {
        if !self.is_active(now) {
            return None;
        }
        let t = self.start_time?;
        Some(now.saturating_sub(t) as f32 / self.duration_ms as f32)
    }

    pub fn step(&mut self, now: u64) -> Step {
        let (Some(end), Some(t0)) = (&self.end, self.start_time) else {
            return Step::Done;
        };

        if !self.is_active(now) {
            let end = end.clone();
            self.start_time = None;
            return Step::Completed(end);
        }

        let Some(start) = &self.start else {
            return Step::Done;
        };

        let t = now.saturating_sub(t0) as f32 / self.duration_ms as f32;
        let mut frame = Palette::new(start.len());
        for i in 0..frame.len() {
            if let (Some(a), Some(b)) = (start.color(i), end.color(i)) {
                frame.set_color(i, partial_color_transition(a, b, t));
            }
        }

        Step::Frame(frame)
    }

    /// Stops without showing the end palette.
    pub fn stop(&mut self) {
        self.start_time = None;
    }

    /// Swaps start and end palettes; timing is left alone.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }

    /// Copy of the palettes without any timing state.
    pub fn idle_copy(&self) -> Fade {
        Fade {
            start: self.start.clone(),
            end: self.end.clone(),
            start_time: None,
            duration_ms: 0,
        }
    }

    /// A new idle fade whose end palette is this fade's end palette (or
    /// `current`, if unset) with `f` applied to the slots in `range`.
    pub fn map_end_rgb<F>(&self, current: &Palette, range: RangeInclusive<usize>, f: F) -> Fade
    where
        F: FnMut(Rgb, usize, &Palette) -> Rgb,
    {
        let end = self.end.as_ref().unwrap_or(current);
        let mut out = self.idle_copy();
        out.end = Some(end.map_rgb(range, f));
        out
    }

    /// HSL counterpart of [`Fade::map_end_rgb`].
    pub fn map_end_hsl<F>(&self, current: &Palette, range: RangeInclusive<usize>, f: F) -> Fade
    where
        F: FnMut(Hsl, usize, &Palette) -> Hsl,
    {
        let end = self.end.as_ref().unwrap_or(current);
        let mut out = self.idle_copy();
        out.end = Some(end.map_hsl(range, f));
        out
    }
}
