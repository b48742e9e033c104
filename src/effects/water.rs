//! Two-page height-field water with droplet impulses.
//!
//! Each tick writes the current page from the previous one, adds droplet
//! rings, smooths, renders the surface as a refraction of a static texture and
//! then swaps page roles. The outermost ring of cells is never simulated.

use super::Effect;
use crate::grid::{Framebuffer, Grid};
use crate::palette::Palette;
use rand::{rngs::StdRng, Rng};

pub(crate) struct HeightField {
    pages: [Grid<i32>; 2],
    current: usize,
}

impl HeightField {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        Self {
            pages: [Grid::new(w, h), Grid::new(w, h)],
            current: 0,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.pages[0].width()
    }

    pub(crate) fn height(&self) -> usize {
        self.pages[0].height()
    }

    pub(crate) fn current(&self) -> &Grid<i32> {
        &self.pages[self.current]
    }

    pub(crate) fn current_mut(&mut self) -> &mut Grid<i32> {
        &mut self.pages[self.current]
    }

    #[cfg(test)]
    fn previous(&self) -> &Grid<i32> {
        &self.pages[self.current ^ 1]
    }

    pub(crate) fn swap(&mut self) {
        self.current ^= 1;
    }

    /// (previous page, current page)
    fn split(&mut self) -> (&Grid<i32>, &mut Grid<i32>) {
        let [a, b] = &mut self.pages;
        if self.current == 0 {
            (&*b, a)
        } else {
            (&*a, b)
        }
    }

    /// Wave step: the average of the eight old neighbours minus the value two
    /// ticks ago, damped by `1/wobble`.
    pub(crate) fn diffuse(&mut self, wobble: i32) {
        let wobble = wobble.max(1);
        let (old, new) = self.split();
        for_interior(old.width(), old.height(), |i, w| {
            let n = neighbour_sum(old.as_slice(), i, w) / 8 - new.as_slice()[i];
            new.as_mut_slice()[i] = n - n / wobble;
        });
    }

    /// Blends the current page halfway toward the old neighbour average.
    pub(crate) fn smooth(&mut self) {
        let (old, new) = self.split();
        for_interior(old.width(), old.height(), |i, w| {
            let n = neighbour_sum(old.as_slice(), i, w) / 8 + new.as_slice()[i];
            new.as_mut_slice()[i] = n >> 1;
        });
    }

    /// Adds a disc-shaped bump of `radius` centred on (x, y) to the current
    /// page, clipped to the interior.
    pub(crate) fn impulse(&mut self, x: i32, y: i32, radius: i32, strength: i32, shape: &RippleShape) {
        if radius <= 0 {
            return;
        }
        let (w, h) = (self.width() as i32, self.height() as i32);
        let rh = shape.ripple_height;
        let r2 = radius * radius;
        let length = rh / r2 as f32;
        let page = self.current_mut();

        let (limit, squash) = match shape.falloff {
            Falloff::Radial => (r2, 1),
            Falloff::Sine { squash } => (r2 / squash.max(1), squash.max(1)),
        };

        for cy in -radius..radius {
            let py = y + cy;
            if py < 1 || py >= h - 1 {
                continue;
            }
            for cx in -radius..radius {
                let px = x + cx;
                if px < 1 || px >= w - 1 {
                    continue;
                }
                let square = cy * cy + cx * cx / squash;
                if square >= limit {
                    continue;
                }
                let bump = match shape.falloff {
                    Falloff::Radial => {
                        let dist = (2.0 * square as f32 * length).sqrt() as i32;
                        (dist * shape.density) as f32 * (strength as f32 * rh.powi(3)) / rh.powi(2)
                    }
                    Falloff::Sine { .. } => {
                        let dist = (2.0 * (square as f32 * length).sin()).max(0.0).sqrt() as i32;
                        (dist * shape.density) as f32 * (strength as f32 * rh.powi(3)) / rh.powi(4)
                    }
                };
                page[(px as usize, py as usize)] += bump as i32;
            }
        }
    }
}

fn for_interior(w: usize, h: usize, mut f: impl FnMut(usize, usize)) {
    if w < 3 || h < 3 {
        return;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            f(y * w + x, w);
        }
    }
}

#[inline]
fn neighbour_sum(p: &[i32], i: usize, w: usize) -> i32 {
    p[i - w - 1] + p[i - w] + p[i - w + 1] + p[i - 1] + p[i + 1] + p[i + w - 1] + p[i + w] + p[i + w + 1]
}

/// Refracts `texture` through the slope of `page`. Light mode doubles the
/// vertical displacement and allows the top palette slot.
pub(crate) fn render(page: &Grid<i32>, texture: &Grid<i32>, light: bool, fb: &mut Framebuffer) {
    let (w, h) = (page.width(), page.height());
    let tex = texture.as_slice();
    if tex.is_empty() || fb.width() != w || fb.height() != h {
        return;
    }
    let k = if light { 2 } else { 1 };
    let ceiling = if light { 255 } else { 254 };
    let heights = page.as_slice();
    let out = fb.as_mut_slice();

    for_interior(w, h, |i, w| {
        let dx = (heights[i] - heights[i - 1]) as i64;
        let dy = (heights[i] - heights[i + w]) as i64;
        let idx = (i as i64 + k * w as i64 * dx + dy).rem_euclid(tex.len() as i64) as usize;
        out[i] = tex[idx].clamp(0, ceiling) as u8;
    });
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Falloff {
    /// Bump grows toward the rim.
    Radial,
    /// `sin`-shaped profile on a disc flattened horizontally by `squash`.
    Sine { squash: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RippleShape {
    pub(crate) density: i32,
    pub(crate) ripple_height: f32,
    pub(crate) falloff: Falloff,
}

/// A point source that emits one ring per tick, each wider than the last,
/// until its lifetime runs out and it is retriggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Droplet {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) radius: i32,
    pub(crate) growth: i32,
    pub(crate) age: u32,
    pub(crate) lifetime: u32,
}

impl Droplet {
    /// Emits the next ring. Returns true when the droplet is due for a reset.
    pub(crate) fn tick(&mut self, field: &mut HeightField, shape: &RippleShape, gain: i32) -> bool {
        self.age += 1;
        field.impulse(self.x, self.y, self.radius, self.radius * gain, shape);
        self.radius += self.growth;
        self.age >= self.lifetime
    }

    pub(crate) fn restart(&mut self, x: i32, y: i32, radius: i32) {
        self.x = x;
        self.y = y;
        self.radius = radius;
        self.age = 0;
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct WaterParams {
    pub(crate) shape: RippleShape,
    pub(crate) wobble: i32,
    pub(crate) light: bool,
    /// Impulse strength per unit of ring radius.
    pub(crate) gain: i32,
    pub(crate) ring_growth: i32,
    pub(crate) start_radius: i32,
    /// Rings per droplet before it restarts.
    pub(crate) rings: u32,
}

impl WaterParams {
    pub(crate) fn still() -> Self {
        Self {
            shape: RippleShape {
                density: 128,
                ripple_height: 2.0,
                falloff: Falloff::Radial,
            },
            wobble: 8,
            light: false,
            gain: 10,
            ring_growth: 4,
            start_radius: 5,
            rings: 15,
        }
    }

    pub(crate) fn rain() -> Self {
        Self {
            shape: RippleShape {
                density: 16,
                ripple_height: 14.0,
                falloff: Falloff::Sine { squash: 6 },
            },
            wobble: 8,
            light: true,
            gain: 1,
            ring_growth: 2,
            start_radius: 1,
            rings: 5,
        }
    }
}

/// How droplets restart once their lifetime is spent.
pub(crate) enum Sources {
    /// One source fixed at the centre that restarts in place.
    Still(Droplet),
    /// Many sources that jump to a random spot on restart.
    Rain { drops: Vec<Droplet>, rng: StdRng },
}

impl Sources {
    pub(crate) fn still(w: usize, h: usize, params: &WaterParams) -> Self {
        Sources::Still(Droplet {
            x: (w / 2) as i32,
            y: (h / 2) as i32,
            radius: params.start_radius,
            growth: params.ring_growth,
            age: 0,
            lifetime: params.rings.max(1),
        })
    }

    /// `count` drops scattered over the upper half, each with its own
    /// lifetime and starting radius.
    pub(crate) fn rain(w: usize, h: usize, count: usize, params: &WaterParams, mut rng: StdRng) -> Self {
        let (w, h) = (w.max(1) as i32, h.max(2) as i32);
        let drops = (0..count)
            .map(|_| Droplet {
                x: rng.gen_range(0..w),
                y: rng.gen_range(0..h / 2),
                radius: rng.gen_range(0..25),
                growth: params.ring_growth,
                age: 1,
                lifetime: params.rings.max(1) + rng.gen_range(0..5),
            })
            .collect();
        Sources::Rain { drops, rng }
    }

    fn tick(&mut self, field: &mut HeightField, params: &WaterParams) {
        match self {
            Sources::Still(d) => {
                if d.tick(field, &params.shape, params.gain) {
                    let (x, y) = (d.x, d.y);
                    d.restart(x, y, params.start_radius);
                }
            }
            Sources::Rain { drops, rng } => {
                let (w, h) = (field.width().max(1) as i32, field.height().max(1) as i32);
                for d in drops.iter_mut() {
                    if d.tick(field, &params.shape, params.gain) {
                        d.restart(rng.gen_range(0..w), rng.gen_range(0..h), params.start_radius);
                    }
                }
            }
        }
    }
}

pub(crate) struct Water {
    name: &'static str,
    field: HeightField,
    texture: Grid<i32>,
    fb: Framebuffer,
    palette: Palette,
    params: WaterParams,
    sources: Sources,
}

impl Water {
    pub(crate) fn new(
        name: &'static str,
        w: usize,
        h: usize,
        texture: Grid<i32>,
        palette: Palette,
        params: WaterParams,
        sources: Sources,
    ) -> Self {
        Self {
            name,
            field: HeightField::new(w, h),
            texture,
            fb: Framebuffer::new(w, h),
            palette,
            params,
            sources,
        }
    }
}

impl Effect for Water {
    fn name(&self) -> &'static str {
        self.name
    }

    fn step(&mut self) {
        self.field.diffuse(self.params.wobble);
        self.sources.tick(&mut self.field, &self.params);
        self.field.smooth();
        render(self.field.current(), &self.texture, self.params.light, &mut self.fb);
        self.field.swap();
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}

/// Soft `sin(x) * cos(y)` swell used under the still pond.
pub(crate) fn sine_texture(w: usize, h: usize) -> Grid<i32> {
    let mut t = Grid::new(w, h);
    let scale = h.max(1) as f32;
    for y in 0..h {
        for x in 0..w {
            let v = (x as f32 / scale).sin() * (y as f32 / scale).cos() * 255.0;
            t.set(x, y, v as i32);
        }
    }
    t
}

/// Widens an indexed image into a refraction texture.
pub(crate) fn texture_from_indices(img: &Grid<u8>) -> Grid<i32> {
    let cells = img.as_slice().iter().map(|&v| v as i32).collect();
    Grid::from_vec(img.width(), img.height(), cells).unwrap_or_else(|| Grid::new(img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn flat_water_stays_flat() {
        let mut f = HeightField::new(20, 12);
        for _ in 0..3 {
            f.diffuse(8);
            f.smooth();
            f.swap();
        }
        assert!(f.current().as_slice().iter().all(|&v| v == 0));
        assert!(f.previous().as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn page_index_toggles() {
        let mut f = HeightField::new(4, 4);
        assert_eq!(f.current, 0);
        f.swap();
        assert_eq!(f.current, 1);
        f.swap();
        assert_eq!(f.current, 0);
    }

    #[test]
    fn diffuse_reads_previous_writes_current() {
        let mut f = HeightField::new(5, 5);
        f.swap();
        f.current_mut()[(2, 2)] = 800;
        f.swap();
        // 800 now sits in the previous page
        f.diffuse(8);
        assert_eq!(f.previous()[(2, 2)], 800);
        // neighbour (1,1) sees 800/8 = 100, damped by 100/8
        assert_eq!(f.current()[(1, 1)], 100 - 100 / 8);
        assert_eq!(f.current()[(2, 2)], 0);
    }

    #[test]
    fn border_ring_is_never_written() {
        let mut f = HeightField::new(10, 8);
        f.impulse(1, 1, 6, 50, &WaterParams::still().shape);
        for _ in 0..5 {
            f.diffuse(8);
            f.smooth();
            f.swap();
        }
        for page in [f.current(), f.previous()] {
            for x in 0..10 {
                assert_eq!(page[(x, 0)], 0);
                assert_eq!(page[(x, 7)], 0);
            }
            for y in 0..8 {
                assert_eq!(page[(0, y)], 0);
                assert_eq!(page[(9, y)], 0);
            }
        }
    }

    #[test]
    fn impulse_is_clipped_and_local() {
        let mut f = HeightField::new(40, 40);
        f.impulse(20, 20, 6, 60, &WaterParams::still().shape);
        let page = f.current();
        assert!(page.as_slice().iter().any(|&v| v != 0));
        assert_eq!(page[(5, 5)], 0);
        assert_eq!(page[(20, 27)], 0);

        // centre near a corner must not panic
        f.impulse(0, 39, 10, 60, &WaterParams::rain().shape);
        f.impulse(-50, -50, 10, 60, &WaterParams::rain().shape);
    }

    #[test]
    fn zero_radius_impulse_is_noop() {
        let mut f = HeightField::new(8, 8);
        f.impulse(4, 4, 0, 100, &WaterParams::still().shape);
        assert!(f.current().as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn render_of_flat_water_copies_texture() {
        let page = Grid::<i32>::new(6, 5);
        let mut tex = Grid::<i32>::new(6, 5);
        for (i, v) in tex.as_mut_slice().iter_mut().enumerate() {
            *v = i as i32 * 20 - 100;
        }
        let mut fb = Framebuffer::new(6, 5);
        render(&page, &tex, false, &mut fb);
        assert_eq!(fb[(1, 1)], 40);
        assert_eq!(fb[(4, 3)], 254);
        render(&page, &tex, true, &mut fb);
        assert_eq!(fb[(4, 3)], 255);
        // row 0 and column 0 are border cells
        assert_eq!(fb[(0, 0)], 0);
    }

    #[test]
    fn render_with_negative_slope_wraps() {
        let mut page = Grid::<i32>::new(5, 5);
        page[(2, 2)] = -1_000_000;
        let tex = Grid::from_vec(5, 5, (0..25).collect()).unwrap();
        let mut fb = Framebuffer::new(5, 5);
        render(&page, &tex, true, &mut fb);
        assert!(fb[(2, 2)] < 25);
    }

    #[test]
    fn droplet_restarts_after_lifetime() {
        let params = WaterParams::still();
        let mut field = HeightField::new(64, 48);
        let mut sources = Sources::still(64, 48, &params);
        for _ in 0..params.rings {
            sources.tick(&mut field, &params);
        }
        match sources {
            Sources::Still(d) => {
                assert_eq!((d.x, d.y), (32, 24));
                assert_eq!(d.radius, params.start_radius);
                assert_eq!(d.age, 0);
            }
            Sources::Rain { .. } => unreachable!(),
        }
    }

    #[test]
    fn droplet_radius_grows_each_ring() {
        let mut field = HeightField::new(64, 64);
        let shape = WaterParams::rain().shape;
        let mut d = Droplet {
            x: 32,
            y: 32,
            radius: 3,
            growth: 2,
            age: 0,
            lifetime: 10,
        };
        assert!(!d.tick(&mut field, &shape, 1));
        assert!(!d.tick(&mut field, &shape, 1));
        assert_eq!(d.radius, 7);
        assert_eq!(d.age, 2);
    }

    #[test]
    fn rain_drops_stay_on_screen() {
        let params = WaterParams::rain();
        let mut w = Water::new(
            "rain",
            80,
            60,
            sine_texture(80, 60),
            Palette::water(),
            params,
            Sources::rain(80, 60, 20, &params, StdRng::seed_from_u64(11)),
        );
        for _ in 0..30 {
            w.step();
        }
        if let Sources::Rain { drops, .. } = &w.sources {
            assert_eq!(drops.len(), 20);
            assert!(drops.iter().all(|d| (0..80).contains(&d.x) && (0..60).contains(&d.y)));
        }
    }

    #[test]
    fn pond_produces_ripples() {
        let params = WaterParams::still();
        let mut w = Water::new(
            "water",
            64,
            48,
            sine_texture(64, 48),
            Palette::water(),
            params,
            Sources::still(64, 48, &params),
        );
        for _ in 0..4 {
            w.step();
        }
        let heights = w.field.previous();
        assert!(heights.as_slice().iter().any(|&v| v != 0));
    }

    #[test]
    fn sine_texture_is_non_negative_on_screen() {
        let t = sine_texture(800, 600);
        assert!(t.as_slice().iter().all(|&v| (0..=255).contains(&v)));
    }
}
