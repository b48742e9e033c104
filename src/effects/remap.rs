//! Inverse texture mapping: every screen pixel asks which texel lands on it.

use super::Effect;
use crate::grid::{Framebuffer, Grid, BACKGROUND};
use crate::palette::Palette;
use std::f64::consts::PI;

/// A tileable source image plus the palette it was authored for.
#[derive(Clone, Debug)]
pub(crate) struct Texture {
    pub(crate) texels: Grid<u8>,
    pub(crate) palette: Palette,
}

impl Texture {
    /// XOR pattern, the stand-in when no asset is supplied.
    pub(crate) fn xor(w: usize, h: usize) -> Self {
        let mut texels = Grid::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = ((x ^ y) % 255) as u8;
                texels.set(x, y, v.max(1));
            }
        }
        Self {
            texels,
            palette: Palette::rainbow(),
        }
    }

    /// Toroidal lookup; any integer coordinate is valid.
    #[inline]
    pub(crate) fn sample(&self, u: i64, v: i64) -> u8 {
        let w = self.texels.width().max(1) as i64;
        let h = self.texels.height().max(1) as i64;
        let u = u.rem_euclid(w) as usize;
        let v = v.rem_euclid(h) as usize;
        self.texels.get(u, v).unwrap_or(BACKGROUND)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RotozoomParams {
    /// Degrees added per frame.
    pub(crate) speed: i32,
    /// Peak magnification; the zoom breathes with `cos(angle)`.
    pub(crate) zoom_scale: f64,
}

impl Default for RotozoomParams {
    fn default() -> Self {
        Self {
            speed: 1,
            zoom_scale: 1.1,
        }
    }
}

pub(crate) struct Rotozoom {
    fb: Framebuffer,
    texture: Texture,
    params: RotozoomParams,
    angle: i32,
}

impl Rotozoom {
    pub(crate) fn new(w: usize, h: usize, texture: Texture, params: RotozoomParams) -> Self {
        Self {
            fb: Framebuffer::new(w, h),
            texture,
            params,
            angle: 0,
        }
    }
}

/// Rotates the screen by `angle_deg` around the origin and scales by
/// `cos(angle) * zoom_scale`, wrapping into the texture.
pub(crate) fn rotozoom(fb: &mut Framebuffer, texture: &Texture, angle_deg: i32, zoom_scale: f64) {
    let rad = (angle_deg as f64).to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    let zoom = cos_a * zoom_scale;

    for y in 0..fb.height() {
        let yf = y as f64;
        for (x, px) in fb.row_mut(y).iter_mut().enumerate() {
            let xf = x as f64;
            let u = ((xf * cos_a - yf * sin_a) * zoom) as i64;
            let v = ((xf * sin_a + yf * cos_a) * zoom) as i64;
            // u walks texture rows, v walks columns
            *px = texture.sample(v, u);
        }
    }
}

impl Effect for Rotozoom {
    fn name(&self) -> &'static str {
        "rotozoom"
    }

    fn step(&mut self) {
        self.angle = (self.angle + self.params.speed).rem_euclid(360);
        rotozoom(&mut self.fb, &self.texture, self.angle, self.params.zoom_scale);
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.texture.palette
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TunnelParams {
    /// Radius of the dark disc at the far end.
    pub(crate) hole_radius: f64,
    pub(crate) distortion: f64,
    /// Angular repeats of the texture around the wall.
    pub(crate) multiplier: f64,
    pub(crate) rotation_step: f64,
    pub(crate) zoom_step: f64,
}

impl Default for TunnelParams {
    fn default() -> Self {
        Self {
            hole_radius: 100.0,
            distortion: 64.0,
            multiplier: 2.5,
            rotation_step: 0.01,
            zoom_step: 0.01,
        }
    }
}

pub(crate) struct Tunnel {
    fb: Framebuffer,
    texture: Texture,
    params: TunnelParams,
    rotation: f64,
    zoom: f64,
}

impl Tunnel {
    pub(crate) fn new(w: usize, h: usize, texture: Texture, params: TunnelParams) -> Self {
        Self {
            fb: Framebuffer::new(w, h),
            texture,
            params,
            rotation: 0.0,
            zoom: 0.0,
        }
    }
}

/// Depth comes from `1 / ln(d²)`, the angle from `atan2`; both are offset by
/// the animation counters (in texture lengths).
pub(crate) fn tunnel(fb: &mut Framebuffer, texture: &Texture, params: &TunnelParams, rotation: f64, zoom: f64) {
    let size = texture.texels.width().min(texture.texels.height()).max(1) as f64;
    let cx = (fb.width() / 2) as f64;
    let cy = (fb.height() / 2) as f64;
    let hole_sq = params.hole_radius * params.hole_radius;

    for y in 0..fb.height() {
        let dy = y as f64 - cy;
        for (x, px) in fb.row_mut(y).iter_mut().enumerate() {
            let dx = x as f64 - cx;
            let d2 = dx * dx + dy * dy;
            let ln = d2.ln();
            if d2 < hole_sq || ln <= f64::EPSILON {
                *px = BACKGROUND;
                continue;
            }
            let depth = params.distortion * size / ln;
            let angle = params.multiplier * size * dx.atan2(dy) / PI;

            let u = (depth + size * zoom) as i64;
            let v = (angle + size * rotation) as i64;
            *px = texture.sample(v, u);
        }
    }
}

impl Effect for Tunnel {
    fn name(&self) -> &'static str {
        "tunnel"
    }

    fn step(&mut self) {
        self.rotation += self.params.rotation_step;
        self.zoom += self.params.zoom_step;
        tunnel(&mut self.fb, &self.texture, &self.params, self.rotation, self.zoom);
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.texture.palette
    }
}
