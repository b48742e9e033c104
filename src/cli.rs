use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rasterfx")]
#[command(about = "Old-school indexed-colour demo effects in the terminal")]
pub(crate) struct Cli {
    /// Settings file (default: <config dir>/rasterfx/settings.json)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Seed for every random source (default: from entropy)
    #[arg(long, global = true)]
    pub(crate) seed: Option<u64>,

    /// Framebuffer width override
    #[arg(long = "width", id = "fb_width", global = true)]
    pub(crate) width: Option<usize>,

    /// Framebuffer height override
    #[arg(long = "height", id = "fb_height", global = true)]
    pub(crate) height: Option<usize>,

    /// ms per frame override
    #[arg(long, global = true)]
    pub(crate) delay_ms: Option<u64>,

    /// Write logs to this file
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,

    /// Start with the status line hidden
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) no_hud: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Diamond-square plasma cloud with palette rotation
    Cloud,
    /// Nested frames animated only by palette cycling
    Cycle,
    /// Classic heat-diffusion fire
    Fire,
    /// Fire coupled with a Game-of-Life pass
    ConwayFire,
    /// Mandelbrot zoom into seahorse valley
    Mandel,
    /// Rotating, breathing texture
    Rotozoom(TextureArgs),
    /// Polar-mapped texture tunnel
    Tunnel(TextureArgs),
    /// Single-source water ripples
    Water,
    /// Rain drops over a refracted texture
    Rain(TextureArgs),
    /// Perspective text crawl over stars
    Scroll(RequiredAsset),
    /// Show an asset image
    View(RequiredAsset),
    /// Convert a PNG into the asset text format
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TextureArgs {
    /// Asset file used as texture (default: built-in XOR pattern)
    #[arg(long)]
    pub(crate) asset: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RequiredAsset {
    #[arg(long)]
    pub(crate) asset: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ConvertArgs {
    pub(crate) input: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Palette size after reduction (1..=256)
    pub(crate) colors: usize,
    /// k-means rounds
    pub(crate) iterations: usize,
}
