use super::Effect;
use crate::grid::Framebuffer;
use crate::palette::{FireRamp, Palette};
use rand::{rngs::StdRng, Rng};
use std::ops::Range;

const MAX_HEAT: u8 = 255;
const SPARK_MIN: u8 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FireVariant {
    /// Evenly gated diffusion.
    Classic,
    /// Skewed diffusion plus a Game of Life pass every few frames.
    Conway,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FireParams {
    /// Rows at the top that are never recomputed (the bleed reaches two rows up).
    pub(crate) top_margin: usize,
    /// The automaton runs once every this many frames.
    pub(crate) automaton_interval: u32,
    /// Cells cooler than this count as alive.
    pub(crate) alive_below: u8,
}

impl Default for FireParams {
    fn default() -> Self {
        Self {
            top_margin: 2,
            automaton_interval: 3,
            alive_below: 128,
        }
    }
}

// (dx, dy, chance in tenths)
type Tap = (isize, isize, u32);

const CLASSIC_TAPS: [Tap; 7] = [
    (-1, 0, 5),
    (-1, -1, 5),
    (0, -1, 5),
    (1, -1, 5),
    (1, 0, 5),
    (1, 1, 5),
    (0, 1, 5),
];
const CONWAY_TAPS: [Tap; 5] = [(0, 1, 2), (1, 1, 8), (-1, 0, 5), (0, 0, 7), (1, 0, 5)];

const CLASSIC_BLEED: [(isize, isize); 3] = [(-1, 0), (1, 0), (0, -1)];
const CONWAY_BLEED: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, -2)];

impl FireVariant {
    fn taps(self) -> &'static [Tap] {
        match self {
            FireVariant::Classic => &CLASSIC_TAPS,
            FireVariant::Conway => &CONWAY_TAPS,
        }
    }

    fn bleed(self) -> &'static [(isize, isize)] {
        match self {
            FireVariant::Classic => &CLASSIC_BLEED,
            FireVariant::Conway => &CONWAY_BLEED,
        }
    }

    fn ramp(self) -> FireRamp {
        match self {
            FireVariant::Classic => FireRamp::Classic,
            FireVariant::Conway => FireRamp::Conway,
        }
    }
}

pub(crate) struct Fire {
    fb: Framebuffer,
    palette: Palette,
    variant: FireVariant,
    params: FireParams,
    rng: StdRng,
    cycles: u32,
}

impl Fire {
    pub(crate) fn new(w: usize, h: usize, variant: FireVariant, params: FireParams, rng: StdRng) -> Self {
        let mut fire = Self {
            fb: Framebuffer::new(w, h),
            palette: Palette::fire(variant.ramp()),
            variant,
            params,
            rng,
            cycles: 0,
        };
        if variant == FireVariant::Conway {
            if let Some(y) = h.checked_sub(1) {
                for x in 0..w {
                    let v = fire.rng.gen_range(0..MAX_HEAT);
                    fire.fb.set(x, y, v);
                }
            }
        }
        fire
    }

    fn seed_bottom_row(&mut self) {
        let Some(y) = self.fb.height().checked_sub(1) else {
            return;
        };
        let variant = self.variant;
        let rng = &mut self.rng;
        for v in self.fb.row_mut(y) {
            *v = match variant {
                FireVariant::Classic => rng.gen_range(0..MAX_HEAT),
                FireVariant::Conway => match rng.gen_range(0..10) {
                    0..=2 => 0,
                    3..=7 => rng.gen_range(0..MAX_HEAT),
                    _ => MAX_HEAT,
                },
            };
        }
    }

    /// Rows the diffusion recomputes: below the margin, above the seed row.
    fn burn_rows(&self) -> Range<usize> {
        let top = self.params.top_margin.max(2);
        top..self.fb.height().saturating_sub(1)
    }
}

impl Effect for Fire {
    fn name(&self) -> &'static str {
        match self.variant {
            FireVariant::Classic => "fire",
            FireVariant::Conway => "conway fire",
        }
    }

    fn step(&mut self) {
        self.seed_bottom_row();

        if self.variant == FireVariant::Conway {
            self.cycles += 1;
            if self.cycles >= self.params.automaton_interval.max(1) {
                self.cycles = 0;
                let rows = self.params.top_margin + 1..self.fb.height().saturating_sub(1);
                life_pass(&mut self.fb, rows, self.params.alive_below, &mut self.rng);
            }
        }

        let rows = self.burn_rows();
        diffuse(&mut self.fb, rows, self.variant, &mut self.rng);
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}

#[inline]
fn offset(x: usize, y: usize, dx: isize, dy: isize) -> Option<(usize, usize)> {
    Some((x.checked_add_signed(dx)?, y.checked_add_signed(dy)?))
}

/// Below-left always counts; each tap joins the average on its own dice roll.
fn gated_average<R: Rng>(fb: &Framebuffer, x: usize, y: usize, taps: &[Tap], rng: &mut R) -> (u32, u32) {
    let mut total = fb[(x - 1, y + 1)] as u32;
    let mut div = 1u32;
    for &(dx, dy, chance) in taps {
        if rng.gen_ratio(chance, 10) {
            if let Some(v) = offset(x, y, dx, dy).and_then(|(nx, ny)| fb.get(nx, ny)) {
                total += v as u32;
                div += 1;
            }
        }
    }
    (total, div)
}

/// One upward heat pass over `rows`, in place, left to right.
pub(crate) fn diffuse<R: Rng>(fb: &mut Framebuffer, rows: Range<usize>, variant: FireVariant, rng: &mut R) {
    let (w, h) = (fb.width(), fb.height());
    if w < 3 {
        return;
    }
    for x in 1..w - 1 {
        for y in rows.clone() {
            if y + 1 >= h {
                continue;
            }
            let (total, div) = gated_average(fb, x, y, variant.taps(), rng);
            let avg = (total / div) as u8;

            fb[(x, y)] = avg;
            for &(dx, dy) in variant.bleed() {
                if rng.gen_bool(0.5) {
                    if let Some((nx, ny)) = offset(x, y, dx, dy) {
                        fb.set(nx, ny, avg);
                    }
                }
            }

            if rng.gen_ratio(1, 256) {
                let rx = rng.gen_range(0..w);
                let ry = rng.gen_range(0..h);
                if fb[(rx, ry)] >= SPARK_MIN {
                    fb[(rx, ry)] = rng.gen_range(0..MAX_HEAT);
                }
            }
        }
    }
}

/// Game of Life over the heat field. State is read from a snapshot so the
/// pass is order independent; dying cells cool to a re-average of their
/// surroundings, births flare to full heat.
pub(crate) fn life_pass<R: Rng>(fb: &mut Framebuffer, rows: Range<usize>, alive_below: u8, rng: &mut R) {
    let (w, h) = (fb.width(), fb.height());
    if w < 3 {
        return;
    }
    let snapshot = fb.clone();
    let alive = |x: usize, y: usize| snapshot[(x, y)] < alive_below;

    for x in 1..w - 1 {
        for y in rows.clone() {
            if y == 0 || y + 1 >= h {
                continue;
            }
            let mut neighbours = 0;
            for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
                if let Some((nx, ny)) = offset(x, y, dx, dy) {
                    if alive(nx, ny) {
                        neighbours += 1;
                    }
                }
            }

            if alive(x, y) {
                if !(2..=3).contains(&neighbours) {
                    let (total, div) = gated_average(fb, x, y, &CONWAY_TAPS, rng);
                    let div = div + u32::from(rng.gen_ratio(2, 10));
                    fb[(x, y)] = (total / div) as u8;
                }
            } else if neighbours == 3 {
                fb[(x, y)] = MAX_HEAT;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn bottom_row_is_reseeded_every_frame() {
        let mut f = Fire::new(64, 32, FireVariant::Classic, FireParams::default(), rng(1));
        f.step();
        let first: Vec<u8> = f.frame().row(31).to_vec();
        assert!(first.iter().any(|&v| v > 0));
        assert!(first.iter().all(|&v| v < MAX_HEAT));
        f.step();
        assert_ne!(f.frame().row(31), &first[..]);
    }

    #[test]
    fn cold_field_stays_cold() {
        let mut fb = Framebuffer::new(16, 16);
        diffuse(&mut fb, 2..15, FireVariant::Classic, &mut rng(2));
        diffuse(&mut fb, 2..15, FireVariant::Conway, &mut rng(3));
        assert!(fb.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn heat_rises_above_seed_row() {
        let mut f = Fire::new(40, 30, FireVariant::Conway, FireParams::default(), rng(4));
        for _ in 0..10 {
            f.step();
        }
        let flames: u32 = (24..29).map(|y| f.frame().row(y).iter().map(|&v| v as u32).sum::<u32>()).sum();
        assert!(flames > 0);
    }

    #[test]
    fn margin_rows_untouched_by_diffusion() {
        let mut fb = Framebuffer::new(10, 10);
        for y in 0..10 {
            fb.row_mut(y).fill(200);
        }
        fb.row_mut(0).fill(7);
        diffuse(&mut fb, 2..9, FireVariant::Classic, &mut rng(5));
        assert!(fb.row(0).iter().all(|&v| v == 7));
    }

    #[test]
    fn dead_cell_with_three_live_neighbours_is_born() {
        let mut fb = Framebuffer::new(3, 3);
        fb.fill(200);
        fb.set(0, 0, 10);
        fb.set(2, 0, 10);
        fb.set(1, 2, 10);
        for seed in 0..8 {
            let mut g = fb.clone();
            life_pass(&mut g, 1..2, 128, &mut rng(seed));
            assert_eq!(g[(1, 1)], 255);
        }
    }

    #[test]
    fn dead_cell_without_three_stays() {
        let mut fb = Framebuffer::new(3, 3);
        fb.fill(200);
        fb.set(0, 0, 10);
        fb.set(2, 0, 10);
        life_pass(&mut fb, 1..2, 128, &mut rng(6));
        assert_eq!(fb[(1, 1)], 200);
    }

    #[test]
    fn lonely_live_cell_cools_toward_neighbours() {
        let mut fb = Framebuffer::new(3, 3);
        fb.fill(200);
        fb.set(1, 1, 10);
        life_pass(&mut fb, 1..2, 128, &mut rng(7));
        assert!(fb[(1, 1)] > 10);
    }

    #[test]
    fn surviving_live_cell_is_kept() {
        let mut fb = Framebuffer::new(3, 3);
        fb.fill(200);
        fb.set(1, 1, 10);
        fb.set(0, 1, 20);
        fb.set(2, 1, 30);
        life_pass(&mut fb, 1..2, 128, &mut rng(8));
        assert_eq!(fb[(1, 1)], 10);
    }

    #[test]
    fn automaton_runs_on_interval() {
        let params = FireParams {
            automaton_interval: 3,
            ..FireParams::default()
        };
        let mut f = Fire::new(8, 8, FireVariant::Conway, params, rng(9));
        f.step();
        f.step();
        assert_eq!(f.cycles, 2);
        f.step();
        assert_eq!(f.cycles, 0);
    }

    #[test]
    fn tiny_buffers_do_not_panic() {
        for (w, h) in [(0, 0), (1, 1), (2, 5), (5, 2), (3, 3)] {
            let mut f = Fire::new(w, h, FireVariant::Conway, FireParams::default(), rng(10));
            for _ in 0..4 {
                f.step();
            }
        }
    }

    proptest! {
        #[test]
        fn classic_heat_never_reaches_max(seed in any::<u64>()) {
            let mut f = Fire::new(24, 16, FireVariant::Classic, FireParams::default(), rng(seed));
            for _ in 0..6 {
                f.step();
            }
            prop_assert!(f.frame().as_slice().iter().all(|&v| v < MAX_HEAT));
        }
    }
}
