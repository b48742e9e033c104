use super::Effect;
use crate::grid::{Framebuffer, BACKGROUND};
use crate::palette::Palette;
use rand::{rngs::StdRng, Rng};

/// Diamond-square plasma. The cloud is generated once; animation is pure
/// palette rotation.
pub(crate) struct Cloud {
    fb: Framebuffer,
    palette: Palette,
}

impl Cloud {
    pub(crate) fn new(w: usize, h: usize, randomness: f64, mut rng: StdRng) -> Self {
        let mut fb = Framebuffer::new(w, h);
        generate(&mut fb, randomness, &mut rng);
        tracing::debug!(w, h, randomness, "cloud generated");
        Self {
            fb,
            palette: Palette::cloud(),
        }
    }
}

impl Effect for Cloud {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn step(&mut self) {
        self.palette.rotate();
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}

/// Seeds the four corners with 1..=255 and subdivides the whole buffer.
pub(crate) fn generate<R: Rng>(fb: &mut Framebuffer, randomness: f64, rng: &mut R) {
    if fb.width() == 0 || fb.height() == 0 {
        return;
    }
    let (xmax, ymax) = (fb.width() - 1, fb.height() - 1);
    for (x, y) in [(0, 0), (xmax, 0), (xmax, ymax), (0, ymax)] {
        fb.set(x, y, rng.gen_range(1..=255));
    }
    subdivide(fb, 0, 0, xmax, ymax, randomness, rng);
}

/// Sets the midpoint of the edge (x1,y1)-(x2,y2) at (x,y) unless a
/// neighbouring square already did.
fn displace_edge<R: Rng>(
    fb: &mut Framebuffer,
    (x1, y1): (usize, usize),
    (x, y): (usize, usize),
    (x2, y2): (usize, usize),
    randomness: f64,
    rng: &mut R,
) {
    if fb[(x, y)] != BACKGROUND {
        return;
    }
    let d = (x1.abs_diff(x2) + y1.abs_diff(y2)) as f64;
    let avg = (fb[(x1, y1)] as i32 + fb[(x2, y2)] as i32) / 2;
    let jitter = (rng.gen::<f64>() - 0.5) * d * randomness;
    let v = (avg as f64 + jitter) as i32;
    fb[(x, y)] = v.clamp(1, 255) as u8;
}

fn subdivide<R: Rng>(
    fb: &mut Framebuffer,
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
    randomness: f64,
    rng: &mut R,
) {
    if x2 - x1 < 2 && y2 - y1 < 2 {
        return;
    }
    let x = (x1 + x2) / 2;
    let y = (y1 + y2) / 2;

    displace_edge(fb, (x1, y1), (x, y1), (x2, y1), randomness, rng);
    displace_edge(fb, (x2, y1), (x2, y), (x2, y2), randomness, rng);
    displace_edge(fb, (x1, y2), (x, y2), (x2, y2), randomness, rng);
    displace_edge(fb, (x1, y1), (x1, y), (x1, y2), randomness, rng);

    if fb[(x, y)] == BACKGROUND {
        let sum = fb[(x1, y1)] as u32 + fb[(x2, y1)] as u32 + fb[(x2, y2)] as u32 + fb[(x1, y2)] as u32;
        fb[(x, y)] = (sum / 4) as u8;
    }

    subdivide(fb, x1, y1, x, y, randomness, rng);
    subdivide(fb, x, y1, x2, y, randomness, rng);
    subdivide(fb, x, y, x2, y2, randomness, rng);
    subdivide(fb, x1, y, x, y2, randomness, rng);
}
