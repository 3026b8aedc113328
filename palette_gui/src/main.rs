use anyhow::Context;
use eframe::egui;
use palette_core::{Effect, Host, ManualHost, Palette, PaletteProject, PaletteRuntime, presets};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let project_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "project.json".to_string());

    let app = PaletteApp::new(project_path)?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Palette Preview",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

struct PaletteApp {
    project_path: String,
    project: PaletteProject,
    rt: PaletteRuntime<ManualHost>,

    // UI state
    effect: Effect,
    target: String,
    duration_ms: u64,
    run: bool,
    last_frame: Instant,
    last_error: Option<String>,
}

impl PaletteApp {
    fn new(project_path: String) -> anyhow::Result<Self> {
        let project = PaletteProject::load_json_file(&project_path)
            .with_context(|| format!("load project file: {project_path}"))?;
        let rt = project.runtime(ManualHost::new());
        let duration_ms = project.fade_ms;

        Ok(Self {
            project_path,
            project,
            rt,
            effect: Effect::FadeToBlack,
            target: "default".to_string(),
            duration_ms,
            run: true,
            last_frame: Instant::now(),
            last_error: None,
        })
    }

    fn palette_names(&self) -> Vec<String> {
        self.project
            .palettes
            .keys()
            .cloned()
            .chain(presets::NAMES.iter().map(|n| n.to_string()))
            .collect()
    }

    fn safe_tick(&mut self, ms: u64) {
        self.rt.host_mut().advance(ms);
        self.rt.on_frame();
    }

    fn fade_to_target(&mut self) {
        match self.project.palette(&self.target) {
            Some(end) => {
                let fade = palette_core::Fade::new().with_end_palette(&end);
                if !self.rt.start_fade(fade, self.duration_ms) {
                    self.last_error = Some(format!(
                        "'{}' has {} slots, the screen has {}",
                        self.target,
                        end.len(),
                        self.rt.available_colors()
                    ));
                }
            }
            None => self.last_error = Some(format!("unknown palette '{}'", self.target)),
        }
    }

    fn fade_label(&self) -> String {
        let now = self.rt.host().now_ms();
        match self.rt.active_fade().and_then(|f| f.progress(now)) {
            Some(p) => format!("Fade: {:.0}%", p * 100.0),
            None => "Fade: (none)".to_string(),
        }
    }
}

fn swatches(ui: &mut egui::Ui, palette: &Palette) {
    ui.horizontal_wrapped(|ui| {
        for (i, c) in palette.colors().into_iter().enumerate() {
            let (rect, resp) = ui.allocate_exact_size(egui::vec2(44.0, 44.0), egui::Sense::hover());
            ui.painter().rect_filled(
                rect,
                4.0,
                egui::Color32::from_rgb(c.red(), c.green(), c.blue()),
            );
            resp.on_hover_text(format!("{i}: {c}"));
        }
    });
}

impl eframe::App for PaletteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Real-time ticking when Run is enabled
        if self.run {
            let now = Instant::now();
            let dt = now.duration_since(self.last_frame);
            self.last_frame = now;

            let ms = dt.as_millis() as u64;
            if ms > 0 {
                self.safe_tick(ms.min(100)); // clamp so it stays stable
            }
            ctx.request_repaint(); // keep animating
        } else {
            self.last_frame = Instant::now();
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Palette Preview");
                ui.separator();
                ui.label(format!("File: {}", self.project_path));
            });

            ui.horizontal(|ui| {
                ui.label("Effect:");
                egui::ComboBox::from_id_source("effect")
                    .selected_text(self.effect.name())
                    .show_ui(ui, |ui| {
                        for e in Effect::ALL {
                            ui.selectable_value(&mut self.effect, e, e.name());
                        }
                    });
                if ui.button("Start").clicked() {
                    if !self.rt.start_effect(self.effect, self.duration_ms) {
                        self.last_error =
                            Some(format!("effect '{}' does not fit the screen", self.effect.name()));
                    }
                }
                if ui.button("Clear").clicked() {
                    self.rt.clear_fade_effect();
                }

                ui.separator();

                ui.label("Fade to:");
                let names = self.palette_names();
                egui::ComboBox::from_id_source("target")
                    .selected_text(self.target.clone())
                    .show_ui(ui, |ui| {
                        for n in names {
                            ui.selectable_value(&mut self.target, n.clone(), n);
                        }
                    });
                if ui.button("Fade").clicked() {
                    self.fade_to_target();
                }
                if ui.button("Stop").clicked() {
                    self.rt.stop_fade();
                }
                if ui.button("Reverse").clicked() {
                    self.rt.reverse_fade();
                }
            });

            ui.horizontal(|ui| {
                ui.add(egui::Slider::new(&mut self.duration_ms, 0..=5000).text("ms"));

                ui.separator();

                if ui.button("Push scene").clicked() {
                    self.rt.host_mut().push_scene();
                    self.rt.on_scene_push();
                }
                if ui.button("Pop scene").clicked() && self.rt.host_mut().pop_scene().is_some() {
                    self.rt.on_scene_pop();
                }
                if ui.button("Reset").clicked() {
                    self.rt.reset_to_default();
                }

                ui.separator();

                if ui.button("Tick 100ms").clicked() {
                    self.safe_tick(100);
                }
                if ui
                    .selectable_label(self.run, if self.run { "Running" } else { "Run" })
                    .clicked()
                {
                    self.run = !self.run;
                }
            });

            ui.label(format!(
                "Scene: {:?} (depth {}, parked {}) | {}",
                self.rt.host().current_scene(),
                self.rt.host().scene_depth(),
                self.rt.parked_scenes(),
                self.fade_label()
            ));

            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("Error: {err}"));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Screen");
            ui.separator();
            swatches(ui, &self.rt.current_palette());

            ui.add_space(12.0);
            ui.heading("Base");
            ui.separator();
            swatches(ui, &self.project.base);
        });
    }
}
