//! PNG to asset conversion: resize, reduce the palette with k-means, then map
//! every pixel to its nearest palette entry.

use crate::asset::{write_asset, AssetImage};
use crate::palette::{Rgba, PALETTE_SIZE};
use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use rand::{seq::SliceRandom, Rng};
use std::{
    collections::HashSet,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

type Colour = [u8; 4];

#[derive(Clone, Debug)]
pub(crate) struct ConvertJob<'a> {
    pub(crate) input: &'a Path,
    pub(crate) output: &'a Path,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) colors: usize,
    pub(crate) iterations: usize,
}

pub(crate) fn run<R: Rng>(job: &ConvertJob<'_>, rng: &mut R) -> Result<AssetImage> {
    if job.width == 0 || job.height == 0 {
        bail!("target size must be positive, got {}x{}", job.width, job.height);
    }
    if !(1..=PALETTE_SIZE).contains(&job.colors) {
        bail!("colors must be between 1 and {PALETTE_SIZE}, got {}", job.colors);
    }

    let source = image::open(job.input)
        .with_context(|| format!("decoding {}", job.input.display()))?
        .to_rgba8();
    tracing::info!(
        input = %job.input.display(),
        src_w = source.width(),
        src_h = source.height(),
        "image decoded"
    );

    let resized = imageops::resize(&source, job.width, job.height, FilterType::Triangle);
    let pixels: Vec<Colour> = resized.pixels().map(|p| p.0).collect();
    let asset = quantize(&pixels, job.width as usize, job.height as usize, job.colors, job.iterations, rng);
    tracing::info!(colours = asset.palette.len(), "palette reduced");

    let file = File::create(job.output).with_context(|| format!("creating {}", job.output.display()))?;
    let mut out = BufWriter::new(file);
    write_asset(&mut out, &asset).with_context(|| format!("writing {}", job.output.display()))?;
    out.flush().with_context(|| format!("writing {}", job.output.display()))?;
    tracing::info!(output = %job.output.display(), "asset written");
    Ok(asset)
}

/// Builds an indexed image from RGBA pixels with at most `k` palette entries.
pub(crate) fn quantize<R: Rng>(pixels: &[Colour], width: usize, height: usize, k: usize, iterations: usize, rng: &mut R) -> AssetImage {
    let unique = unique_colours(pixels);
    let palette = if unique.len() > k {
        kmeans(&unique, k, iterations, rng)
    } else {
        unique
    };
    let indices = pixels.iter().map(|c| nearest(c, &palette) as u8).collect();
    AssetImage {
        width,
        height,
        palette: palette.iter().map(|&[r, g, b, a]| Rgba { r, g, b, a }).collect(),
        pixels: indices,
    }
}

/// Distinct colours in first-seen order.
pub(crate) fn unique_colours(pixels: &[Colour]) -> Vec<Colour> {
    let mut seen = HashSet::new();
    pixels.iter().copied().filter(|c| seen.insert(*c)).collect()
}

fn distance_sq(a: &Colour, b: &Colour) -> u32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Index of the closest entry; ties go to the lower index.
pub(crate) fn nearest(c: &Colour, palette: &[Colour]) -> usize {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| distance_sq(c, p))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Lloyd's algorithm seeded with `k` distinct input colours. Stops early once
/// the centroids settle; an empty cluster keeps its previous centroid.
pub(crate) fn kmeans<R: Rng>(colours: &[Colour], k: usize, iterations: usize, rng: &mut R) -> Vec<Colour> {
    let mut centroids: Vec<Colour> = colours.choose_multiple(rng, k.min(colours.len())).copied().collect();

    for round in 0..iterations {
        let mut sums = vec![[0u64; 4]; centroids.len()];
        let mut counts = vec![0u64; centroids.len()];
        for c in colours {
            let i = nearest(c, &centroids);
            counts[i] += 1;
            for (s, &v) in sums[i].iter_mut().zip(c) {
                *s += v as u64;
            }
        }

        let mut moved = false;
        for ((centroid, sum), &n) in centroids.iter_mut().zip(&sums).zip(&counts) {
            if n == 0 {
                continue;
            }
            let mean = sum.map(|s| ((s + n / 2) / n) as u8);
            moved |= mean != *centroid;
            *centroid = mean;
        }
        if !moved {
            tracing::debug!(round, "k-means converged");
            break;
        }
    }
    centroids
}
