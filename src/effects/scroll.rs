//! Perspective text crawl over a fixed starfield.

use super::Effect;
use crate::grid::{Framebuffer, Grid, BACKGROUND};
use crate::palette::{Palette, Rgba};
use rand::{rngs::StdRng, Rng};

pub(crate) const STAR: u8 = 255;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ScrollParams {
    pub(crate) stars: usize,
    /// Crawl colour that stars may shine through besides the background.
    pub(crate) clear_colour: u8,
}

impl Default for ScrollParams {
    fn default() -> Self {
        Self {
            stars: 1024,
            clear_colour: 153,
        }
    }
}

pub(crate) struct Scroller {
    fb: Framebuffer,
    text: Grid<u8>,
    palette: Palette,
    stars: Vec<(usize, usize)>,
    clear_colour: u8,
    /// Rows of text revealed so far.
    revealed: usize,
    row: Vec<u8>,
}

impl Scroller {
    pub(crate) fn new(w: usize, h: usize, text: &Grid<u8>, mut palette: Palette, params: ScrollParams, mut rng: StdRng) -> Self {
        palette.set(0, Rgba { a: 0, ..Rgba::BLACK });
        palette.set(STAR, Rgba { a: 0, ..Rgba::WHITE });

        // the crawl is read from a screen-sized copy of the text image
        let mut crawl = Grid::new(w, h);
        for y in 0..h.min(text.height()) {
            for x in 0..w.min(text.width()) {
                crawl.set(x, y, text[(x, y)]);
            }
        }

        let stars = if w == 0 || h == 0 {
            Vec::new()
        } else {
            (0..params.stars)
                .map(|_| (rng.gen_range(0..w), rng.gen_range(0..h)))
                .collect()
        };

        Self {
            fb: Framebuffer::new(w, h),
            text: crawl,
            palette,
            stars,
            clear_colour: params.clear_colour,
            revealed: 1,
            row: vec![BACKGROUND; w],
        }
    }

    fn paint_stars(&mut self) {
        for &(x, y) in &self.stars {
            let v = self.fb[(x, y)];
            if v == BACKGROUND || v == self.clear_colour {
                self.fb[(x, y)] = STAR;
            }
        }
    }
}

/// Resamples `src` to `percent` of its length with linear interpolation.
/// Percentages outside 0..=100 return the row unchanged.
pub(crate) fn scale_row(src: &[u8], percent: f64) -> Vec<u8> {
    if !(0.0..=100.0).contains(&percent) || src.is_empty() {
        return src.to_vec();
    }
    let len = (src.len() as f64 * percent / 100.0) as usize;
    match len {
        0 => Vec::new(),
        1 => vec![src[0]],
        _ => {
            let step = (src.len() - 1) as f64 / (len - 1) as f64;
            (0..len)
                .map(|i| {
                    let pos = i as f64 * step;
                    let lo = (pos as usize).min(src.len() - 1);
                    let hi = (lo + 1).min(src.len() - 1);
                    let t = pos - lo as f64;
                    ((1.0 - t) * src[lo] as f64 + t * src[hi] as f64) as u8
                })
                .collect()
        }
    }
}

impl Effect for Scroller {
    fn name(&self) -> &'static str {
        "scroller"
    }

    /// The revealed block always ends on the last screen row: text row `r`
    /// lands on screen row `h - 1 - revealed + r`.
    fn step(&mut self) {
        if self.finished() {
            return;
        }
        let (w, h) = (self.fb.width(), self.fb.height());
        let top = h - 1 - self.revealed.min(h - 1);
        let mut percent = (100.0 - self.revealed as f64 / 4.0 + 1.0).max(0.0);

        for r in 0..=self.revealed {
            let y = top + r;
            if y >= h || r >= self.text.height() {
                break;
            }
            self.row.fill(BACKGROUND);
            let scaled = scale_row(self.text.row(r), percent);
            if r % 4 == 0 {
                percent += 1.0;
            }
            let start = (w / 2).saturating_sub(scaled.len() / 2);
            for (dst, &v) in self.row.iter_mut().skip(start).zip(&scaled) {
                *dst = v;
            }
            self.fb.row_mut(y).copy_from_slice(&self.row);
        }

        self.revealed += 1;
        self.paint_stars();
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn finished(&self) -> bool {
        self.revealed >= self.fb.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn crawl(w: usize, h: usize) -> Grid<u8> {
        let mut g = Grid::new(w, h);
        for y in 0..h {
            for x in 0..w {
                g.set(x, y, 10 + (x % 7) as u8);
            }
        }
        g
    }

    #[test]
    fn scale_row_shrinks_and_interpolates() {
        let src = [0u8, 100, 200];
        assert_eq!(scale_row(&src, 100.0), vec![0, 100, 200]);
        let half = scale_row(&[0, 10, 20, 30], 50.0);
        assert_eq!(half, vec![0, 30]);
        let widened = scale_row(&[0, 90], 100.0);
        assert_eq!(widened, vec![0, 90]);
        assert_eq!(scale_row(&src, 150.0), src.to_vec());
        assert_eq!(scale_row(&src, -1.0), src.to_vec());
        assert!(scale_row(&src, 10.0).is_empty());
        assert_eq!(scale_row(&[0u8, 100, 200, 250], 25.0), vec![0]);
    }

    #[test]
    fn palette_ends_are_forced() {
        let s = Scroller::new(
            8,
            8,
            &crawl(8, 8),
            Palette::rainbow(),
            ScrollParams::default(),
            StdRng::seed_from_u64(1),
        );
        let p = s.palette();
        assert_eq!((p.get(0).r, p.get(0).g, p.get(0).b), (0, 0, 0));
        assert_eq!((p.get(255).r, p.get(255).g, p.get(255).b), (255, 255, 255));
    }

    #[test]
    fn crawl_rises_from_bottom_and_finishes() {
        let (w, h) = (40, 20);
        let params = ScrollParams {
            stars: 0,
            ..ScrollParams::default()
        };
        let mut s = Scroller::new(w, h, &crawl(w, h), Palette::rainbow(), params, StdRng::seed_from_u64(2));
        s.step();
        // two rows revealed on the first frame, the rest still empty
        assert!(s.frame().row(h - 1).iter().any(|&v| v != 0));
        assert!(s.frame().row(h - 2).iter().any(|&v| v != 0));
        assert!(s.frame().row(h - 3).iter().all(|&v| v == 0));

        let mut frames = 1;
        while !s.finished() {
            s.step();
            frames += 1;
        }
        assert_eq!(frames, h - 1);
        let before = s.frame().clone();
        s.step();
        assert_eq!(s.frame(), &before);
    }

    #[test]
    fn rows_are_centred() {
        let (w, h) = (100, 50);
        let params = ScrollParams {
            stars: 0,
            ..ScrollParams::default()
        };
        let mut s = Scroller::new(w, h, &crawl(w, h), Palette::rainbow(), params, StdRng::seed_from_u64(3));
        for _ in 0..40 {
            s.step();
        }
        // revealed = 40 -> first row at 91%: 91 texels starting at 50 - 45
        let top = s.frame().row(h - 1 - 40);
        assert!(top[..5].iter().all(|&v| v == 0));
        assert_ne!(top[5], 0);
        assert_ne!(top[95], 0);
        assert!(top[96..].iter().all(|&v| v == 0));
    }

    #[test]
    fn stars_only_replace_background_or_clear_colour() {
        let (w, h) = (16, 16);
        let mut text = Grid::new(w, h);
        text.fill(42);
        let params = ScrollParams {
            stars: 200,
            clear_colour: 153,
        };
        let mut s = Scroller::new(w, h, &text, Palette::rainbow(), params, StdRng::seed_from_u64(4));
        s.step();
        for y in 0..h {
            for x in 0..w {
                let v = s.frame()[(x, y)];
                assert!(v == 0 || v == 42 || v == STAR, "unexpected {v}");
            }
        }
        assert!(s.frame().as_slice().iter().any(|&v| v == STAR));
        // stars never overwrite text
        let bottom = s.frame().row(h - 1);
        assert!(bottom.iter().all(|&v| v == 42));
    }
}
