use crate::asset::{load_asset, AssetImage};
use crate::cli::{Cli, Command};
use crate::config::{self, Frame, Overrides, Settings};
use crate::convert::{self, ConvertJob};
use crate::effects::{
    cloud::Cloud,
    cycle::ColourCycle,
    fire::{Fire, FireVariant},
    mandel::MandelZoom,
    remap::{Rotozoom, Texture, Tunnel},
    scroll::Scroller,
    view::Viewer,
    water::{sine_texture, texture_from_indices, Falloff, Sources, Water},
    Effect,
};
use crate::logging;
use crate::palette::{Palette, Rgba};
use crate::term::{draw_frame, Screen, TermGuard};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log.as_deref())?;

    let settings = config::resolve_settings(cli.config.as_deref())?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, command = ?cli.command, "starting");

    if let Command::Convert(args) = &cli.command {
        let job = ConvertJob {
            input: &args.input,
            output: &args.output,
            width: args.width,
            height: args.height,
            colors: args.colors,
            iterations: args.iterations,
        };
        convert::run(&job, &mut StdRng::seed_from_u64(seed))?;
        return Ok(());
    }

    let overrides = Overrides {
        width: cli.width,
        height: cli.height,
        delay_ms: cli.delay_ms,
    };
    let (effect, frame) = build_effect(&cli.command, &settings, overrides, seed)?;
    tracing::info!(
        effect = effect.name(),
        width = frame.width,
        height = frame.height,
        delay_ms = frame.delay_ms,
        "effect ready"
    );
    play(effect, Duration::from_millis(frame.delay_ms), !cli.no_hud)
}

fn asset(path: &Path) -> Result<AssetImage> {
    load_asset(path).with_context(|| format!("loading asset {}", path.display()))
}

/// An asset texture, or the XOR pattern at `w x h` when no path is given.
fn texture(path: Option<&Path>, w: usize, h: usize) -> Result<Texture> {
    match path {
        Some(p) => {
            let img = asset(p)?;
            Ok(Texture {
                texels: img.to_grid(),
                palette: img.palette_table(),
            })
        }
        None => Ok(Texture::xor(w, h)),
    }
}

fn boxed<E: Effect + 'static>(effect: E, frame: Frame) -> (Box<dyn Effect>, Frame) {
    (Box::new(effect), frame)
}

/// Resolves the section for `cmd`, applies overrides and constructs the effect.
pub(crate) fn build_effect(cmd: &Command, settings: &Settings, overrides: Overrides, seed: u64) -> Result<(Box<dyn Effect>, Frame)> {
    let rng = StdRng::seed_from_u64(seed);
    let built: (Box<dyn Effect>, Frame) = match cmd {
        Command::Cloud => {
            let s = &settings.cloud;
            let f = overrides.apply(s.frame);
            boxed(Cloud::new(f.width, f.height, s.randomness, rng), f)
        }
        Command::Cycle => {
            let f = overrides.apply(settings.cycle.frame);
            boxed(ColourCycle::new(f.width, f.height), f)
        }
        Command::Fire | Command::ConwayFire => {
            let (s, variant) = if matches!(cmd, Command::Fire) {
                (&settings.fire, FireVariant::Classic)
            } else {
                (&settings.conway_fire, FireVariant::Conway)
            };
            let f = overrides.apply(s.frame);
            boxed(Fire::new(f.width, f.height, variant, s.params(), rng), f)
        }
        Command::Mandel => {
            let s = &settings.mandel;
            let f = overrides.apply(s.frame);
            boxed(MandelZoom::new(f.width, f.height, s.path()), f)
        }
        Command::Rotozoom(args) => {
            let s = &settings.rotozoom;
            let f = overrides.apply(s.frame);
            let size = s.texture_size.max(1);
            let tex = texture(args.asset.as_deref(), size, size)?;
            boxed(Rotozoom::new(f.width, f.height, tex, s.params()), f)
        }
        Command::Tunnel(args) => {
            let s = &settings.tunnel;
            let f = overrides.apply(s.frame);
            let size = s.texture_size.max(1);
            let tex = texture(args.asset.as_deref(), size, size)?;
            boxed(Tunnel::new(f.width, f.height, tex, s.params()), f)
        }
        Command::Water => {
            let s = &settings.water;
            let f = overrides.apply(s.frame);
            let params = s.params(Falloff::Radial);
            let water = Water::new(
                "water",
                f.width,
                f.height,
                sine_texture(f.width, f.height),
                Palette::water(),
                params,
                Sources::still(f.width, f.height, &params),
            );
            boxed(water, f)
        }
        Command::Rain(args) => {
            let s = &settings.rain;
            let f = overrides.apply(s.water.frame);
            let params = s.water.params(Falloff::Sine { squash: 6 });
            let tex = texture(args.asset.as_deref(), f.width, f.height)?;
            let mut rng = rng;
            let lo = s.min_drops.min(s.max_drops);
            let drops = rng.gen_range(lo..=s.max_drops.max(lo));
            let sources = Sources::rain(f.width, f.height, drops, &params, rng);
            let water = Water::new(
                "rain",
                f.width,
                f.height,
                texture_from_indices(&tex.texels),
                tex.palette,
                params,
                sources,
            );
            boxed(water, f)
        }
        Command::Scroll(args) => {
            let s = &settings.scroll;
            let f = overrides.apply(s.frame);
            let img = asset(&args.asset)?;
            let scroller = Scroller::new(f.width, f.height, &img.to_grid(), img.palette_table(), s.params(), rng);
            boxed(scroller, f)
        }
        Command::View(args) => {
            let f = overrides.apply(settings.view.frame);
            let img = asset(&args.asset)?;
            boxed(Viewer::new(f.width, f.height, &img.to_grid(), img.palette_table()), f)
        }
        Command::Convert(_) => anyhow::bail!("convert does not produce an effect"),
    };
    Ok(built)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    ToggleHud,
}

pub(crate) fn map_key(k: KeyEvent) -> Option<Action> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('h') => Some(Action::ToggleHud),
        _ => None,
    }
}

pub(crate) fn hud_line(name: &str, frames: u64, fps: f32) -> String {
    format!(" {name} | frame {frames} | {fps:.1} fps | h hud  q quit ")
}

fn play(mut effect: Box<dyn Effect>, delay: Duration, mut hud: bool) -> Result<()> {
    let mut guard = TermGuard::new().context("setting up terminal")?;
    let (w, h) = terminal::size().context("querying terminal size")?;
    let mut screen = Screen::new(w, h);

    let started = Instant::now();
    let mut frames = 0u64;
    let mut last_fps = Instant::now();
    let mut window_frames = 0u32;
    let mut fps_smoothed = 0.0f32;
    let mut quit = false;

    while !quit && !effect.finished() {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(k) => match map_key(k) {
                    Some(Action::Quit) => quit = true,
                    Some(Action::ToggleHud) => hud = !hud,
                    None => {}
                },
                Event::Resize(w, h) => screen.resize(w, h),
                _ => {}
            }
        }
        if quit {
            break;
        }

        effect.step();
        frames += 1;
        window_frames += 1;

        let now = Instant::now();
        let window = (now - last_fps).as_secs_f32();
        if window >= 0.5 {
            let fps = window_frames as f32 / window.max(1e-6);
            fps_smoothed = if fps_smoothed == 0.0 { fps } else { fps_smoothed * 0.8 + fps * 0.2 };
            window_frames = 0;
            last_fps = now;
        }

        let (_, rows) = screen.size();
        let image_rows = rows.saturating_sub(1);
        draw_frame(&mut screen, effect.frame(), effect.palette(), image_rows);
        screen.clear_row(image_rows);
        if hud {
            let line = hud_line(effect.name(), frames, fps_smoothed);
            screen.text(0, image_rows, &line, Rgba::WHITE, Rgba::rgb(20, 20, 28));
        }
        screen.flush(guard.out())?;

        thread::sleep(delay);
    }

    let elapsed = started.elapsed().as_secs_f32();
    tracing::info!(
        effect = effect.name(),
        frames,
        seconds = elapsed,
        fps = frames as f32 / elapsed.max(1e-6),
        finished = effect.finished(),
        "stopped"
    );
    drop(guard);
    Ok(())
}
