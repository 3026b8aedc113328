use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::time::Instant;

use palette_core::slotcmd::{ApplyStatus, try_apply_slot_line};
use palette_core::{Color, Effect, Fade, Host, ManualHost, Palette, PaletteProject, PaletteRuntime};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Palette swap CLI: palettes, fades and effects")]
struct Args {
    /// Debug logging.
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default project file.
    New {
        path: String,
        #[clap(long, default_value = "My Project")]
        name: String,
    },
    /// List the built-in palettes.
    Presets,
    /// List the palettes stored in a project.
    List { path: String },
    /// Store a palette in a project.
    AddPalette {
        path: String,
        name: String,
        #[clap(required = true)]
        colors: Vec<String>,
    },
    /// Store a gradient palette in a project.
    Gradient {
        path: String,
        name: String,
        from: String,
        to: String,
        #[clap(long, default_value_t = 16)]
        steps: usize,
    },
    /// Run an effect headless and print every frame.
    Simulate {
        path: String,
        effect: String,
        #[clap(long)]
        duration: Option<u64>,
        #[clap(long, default_value_t = 100)]
        frame: u64,
    },
    /// Interactive session on a project.
    Repl { path: String },
}

fn format_palette(p: &Palette) -> String {
    p.colors()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_palette(label: &str, p: &Palette) {
    println!("  {label:<12} | {}", format_palette(p));
}

fn parse_colors(raw: &[String]) -> anyhow::Result<Vec<Color>> {
    raw.iter()
        .map(|s| s.parse::<Color>())
        .collect::<anyhow::Result<Vec<_>>>()
}

fn simulate(path: &str, effect: &str, duration: Option<u64>, frame_ms: u64) -> anyhow::Result<()> {
    let project = PaletteProject::load_json_file(path)
        .with_context(|| format!("failed to load project '{path}'"))?;
    let effect = Effect::from_name(effect).with_context(|| format!("unknown effect '{effect}'"))?;
    let duration = duration.unwrap_or(project.fade_ms);
    let frame_ms = frame_ms.max(1);

    let mut rt = project.runtime(ManualHost::new());
    anyhow::ensure!(
        rt.start_effect(effect, duration),
        "effect '{}' did not start: its palette does not fit the {} slots of the project base",
        effect.name(),
        rt.available_colors()
    );
    print_palette("0ms", &rt.current_palette());

    while rt.active_fade().is_some() {
        rt.host_mut().advance(frame_ms);
        rt.on_frame();
        print_palette(&format!("{}ms", rt.host().now_ms()), &rt.current_palette());
    }

    println!("Effect '{}' done.", effect.name());
    Ok(())
}

const REPL_HELP: &str = r#"Commands:
    palettes                 (project + built-in palettes)
    apply <name>             (show a palette now)
    set <slot> <color>       (slot 1..15, e.g. set 3 #FF0000)
    reset                    (back to the project base palette)
    edit [name]              (copy a palette, or the screen, into the working palette)
    <a> [thru <b>] [@ <color>]  (edit working palette slots)
    commit <name>            (store working palette in the project)
    fade <name> [ms]         (fade from the screen to a palette)
    effect <name> [ms]       (black|white|darken|brighten|rotate|<preset>)
    stop                     (stop the fade where it is)
    clear                    (stop the effect and restore the palette before it)
    reverse                  (swap the running fade's start and end)
    tick <ms>                (advance the clock and run one frame)
    wait                     (run 16ms frames until the fade is done)
    run | pause              (real-time clock on/off)
    push | pop               (enter a new scene / return to the previous one)
    scene
    out
    save
    quit
"#;

struct Session {
    path: String,
    project: PaletteProject,
    rt: PaletteRuntime<ManualHost>,
    edit: Palette,
    selection: Vec<usize>,
    running: bool,
    last_tick: Instant,
}

impl Session {
    fn load(path: &str) -> anyhow::Result<Self> {
        let project = PaletteProject::load_json_file(path)
            .with_context(|| format!("failed to load project '{path}'"))?;
        let rt = project.runtime(ManualHost::new());
        let edit = rt.current_palette();

        Ok(Self {
            path: path.to_string(),
            project,
            rt,
            edit,
            selection: Vec::new(),
            running: false,
            last_tick: Instant::now(),
        })
    }

    fn palette(&self, name: &str) -> anyhow::Result<Palette> {
        self.project
            .palette(name)
            .with_context(|| format!("unknown palette '{name}'. Type: palettes"))
    }

    fn duration(&self, arg: Option<&&str>) -> anyhow::Result<u64> {
        match arg {
            Some(ms) => ms.parse().context("duration must be a number of ms"),
            None => Ok(self.project.fade_ms),
        }
    }

    /// Real-time mode: move the clock by the wall time since the last command.
    fn catch_up(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;

        if self.running {
            let ms = elapsed.as_millis() as u64;
            if ms > 0 {
                self.rt.host_mut().advance(ms);
                self.rt.on_frame();
            }
        }
    }

    fn print_state(&self) {
        let now = self.rt.host().now_ms();
        println!("Clock: {now}ms | scene: {:?}", self.rt.host().current_scene());
        match self.rt.active_fade() {
            Some(f) => match f.progress(now) {
                Some(p) => println!("Fade: {:.0}% of {}ms", p * 100.0, f.duration_ms()),
                None => println!("Fade: finishing on next frame"),
            },
            None => println!("Fade: (none)"),
        }
        print_palette("screen", &self.rt.current_palette());
    }

    /// Returns `false` when the session should end.
    fn command(&mut self, line: &str) -> anyhow::Result<bool> {
        match try_apply_slot_line(line, &mut self.edit, &mut self.selection) {
            ApplyStatus::Applied => {
                println!("(edit) slots {:?}", self.selection);
                print_palette("working", &self.edit);
                return Ok(true);
            }
            ApplyStatus::Incomplete => {
                println!("(edit) incomplete input…");
                return Ok(true);
            }
            ApplyStatus::NotSlotCommand => {
                // fall through to the named commands
            }
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "help" => println!("{REPL_HELP}"),
            "quit" | "exit" => return Ok(false),

            "palettes" => {
                println!("Project palettes:");
                if self.project.palettes.is_empty() {
                    println!("  (none)");
                }
                for (name, p) in &self.project.palettes {
                    print_palette(name, p);
                }
                println!("Built-in: {}", palette_core::presets::NAMES.join(", "));
            }

            "apply" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: apply <name>");
                    return Ok(true);
                };
                let p = self.palette(name)?;
                self.rt.set_palette(&p);
                print_palette("screen", &self.rt.current_palette());
            }

            "set" => {
                if parts.len() != 3 {
                    println!("Usage: set <slot> <color>");
                    return Ok(true);
                }
                let slot: usize = parts[1].parse().context("slot must be a number")?;
                let color: Color = parts[2].parse()?;
                self.rt.set_color(slot, color);
                print_palette("screen", &self.rt.current_palette());
            }

            "reset" => {
                self.rt.reset_to_default();
                print_palette("screen", &self.rt.current_palette());
            }

            "edit" => {
                self.edit = match parts.get(1) {
                    Some(name) => self.palette(name)?,
                    None => self.rt.current_palette(),
                };
                self.selection.clear();
                print_palette("working", &self.edit);
            }

            "commit" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: commit <name>");
                    return Ok(true);
                };
                self.project.insert_palette(*name, self.edit.clone());
                self.project.save_json_file(&self.path)?;
                println!("Stored palette '{name}' and saved.");
            }

            "fade" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: fade <name> [ms]");
                    return Ok(true);
                };
                let end = self.palette(name)?;
                let ms = self.duration(parts.get(2))?;
                if !self.rt.start_fade(Fade::new().with_end_palette(&end), ms) {
                    println!(
                        "'{name}' has {} slots; the screen has {}.",
                        end.len(),
                        self.rt.available_colors()
                    );
                }
            }

            "effect" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: effect <name> [ms]");
                    return Ok(true);
                };
                let effect =
                    Effect::from_name(name).with_context(|| format!("unknown effect '{name}'"))?;
                let ms = self.duration(parts.get(2))?;
                anyhow::ensure!(
                    self.rt.start_effect(effect, ms),
                    "effect '{}' does not fit the {}-slot screen",
                    effect.name(),
                    self.rt.available_colors()
                );
            }

            "stop" => match self.rt.stop_fade() {
                Some(_) => println!("Fade stopped."),
                None => println!("No fade running."),
            },
            "clear" => {
                self.rt.clear_fade_effect();
                print_palette("screen", &self.rt.current_palette());
            }
            "reverse" => self.rt.reverse_fade(),

            "tick" => {
                if parts.len() != 2 {
                    println!("Usage: tick <ms>");
                    return Ok(true);
                }
                let ms: u64 = parts[1].parse().context("tick needs a number of ms")?;
                self.rt.host_mut().advance(ms);
                self.rt.on_frame();
                self.print_state();
            }

            "wait" => {
                self.rt.pause_until_fade_done(|host| host.advance(16));
                self.print_state();
            }

            "run" => {
                self.running = true;
                println!("Real-time clock: ON");
            }
            "pause" => {
                self.running = false;
                println!("Real-time clock: OFF");
            }

            "push" => {
                self.rt.host_mut().push_scene();
                self.rt.on_scene_push();
                println!("Entered scene {:?}", self.rt.host().current_scene());
            }
            "pop" => match self.rt.host_mut().pop_scene() {
                Some(left) => {
                    self.rt.on_scene_pop();
                    println!(
                        "Left scene {:?}, back in {:?}",
                        left,
                        self.rt.host().current_scene()
                    );
                }
                None => println!("Already at the root scene."),
            },

            "scene" => println!(
                "Scene {:?} | depth {} | parked fades {}",
                self.rt.host().current_scene(),
                self.rt.host().scene_depth(),
                self.rt.parked_scenes()
            ),

            "out" | "state" => self.print_state(),

            "save" => {
                self.project.save_json_file(&self.path)?;
                println!("Saved project: {}", self.path);
            }

            _ => println!("Unknown command. Type 'help'."),
        }

        Ok(true)
    }
}

fn repl(path: &str) -> anyhow::Result<()> {
    let mut session = Session::load(path)?;

    println!("Loaded project: {}", session.project.name);
    println!("Type 'help' for commands. 'quit' to exit.");

    loop {
        print!("pal> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF (Ctrl+D)
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        session.catch_up();

        match session.command(line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {e:#}"),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match args.command {
        Command::New { path, name } => {
            let project = PaletteProject::new(name);
            project.save_json_file(&path)?;
            println!("Saved default project '{}' to: {}", project.name, path);
        }
        Command::Presets => {
            println!("Built-in palettes:");
            for name in palette_core::presets::NAMES {
                if let Some(p) = palette_core::presets::preset(name) {
                    print_palette(name, p);
                }
            }
        }
        Command::List { path } => {
            let project = PaletteProject::load_json_file(&path)?;
            println!("Project: {} (fade {}ms)", project.name, project.fade_ms);
            print_palette("base", &project.base);
            for (name, p) in &project.palettes {
                print_palette(name, p);
            }
        }
        Command::AddPalette { path, name, colors } => {
            let mut project = PaletteProject::load_json_file(&path)
                .with_context(|| format!("failed to load project '{path}'"))?;
            let colors = parse_colors(&colors)?;
            let rt = project.runtime(ManualHost::new());
            let palette = rt.palette_from_colors(&colors);
            if palette.len() < colors.len() {
                println!(
                    "Only the first {} colors fit the display.",
                    rt.available_colors()
                );
            }
            project.insert_palette(name.as_str(), palette);
            project.save_json_file(&path)?;
            println!("Added palette '{}' and saved {}", name, path);
        }
        Command::Gradient {
            path,
            name,
            from,
            to,
            steps,
        } => {
            let mut project = PaletteProject::load_json_file(&path)
                .with_context(|| format!("failed to load project '{path}'"))?;
            let from: Color = from.parse()?;
            let to: Color = to.parse()?;
            let palette =
                Palette::gradient(from, to, steps).context("a gradient needs at least 2 steps")?;
            print_palette(&name, &palette);
            project.insert_palette(name.as_str(), palette);
            project.save_json_file(&path)?;
            println!("Added gradient '{}' and saved {}", name, path);
        }
        Command::Simulate {
            path,
            effect,
            duration,
            frame,
        } => simulate(&path, &effect, duration, frame)?,
        Command::Repl { path } => repl(&path)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_project(tag: &str, base: Palette) -> anyhow::Result<String> {
        let mut project = PaletteProject::new(tag);
        project.base = base;
        let path = std::env::temp_dir().join(format!(
            "palette_cli_{tag}_{}.json",
            std::process::id()
        ));
        project.save_json_file(&path)?;
        Ok(path.to_string_lossy().into_owned())
    }

    #[test]
    fn simulate_fails_when_effect_cannot_start() -> anyhow::Result<()> {
        let path = temp_project("short_base", Palette::new(4))?;
        let res = simulate(&path, "black", Some(100), 16);
        std::fs::remove_file(&path)?;

        let err = res.expect_err("a 4-slot base cannot fade to a 16-slot preset");
        assert!(format!("{err:#}").contains("did not start"));
        Ok(())
    }

    #[test]
    fn simulate_runs_effect_to_completion() -> anyhow::Result<()> {
        let path = temp_project("full_base", palette_core::presets::MATTE.clone())?;
        let res = simulate(&path, "darken", Some(50), 16);
        std::fs::remove_file(&path)?;
        res
    }
}
