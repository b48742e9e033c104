use super::Effect;
use crate::grid::Framebuffer;
use crate::palette::Palette;

/// Static nested frames; the motion comes from rotating every palette slot
/// except the background.
pub(crate) struct ColourCycle {
    fb: Framebuffer,
    palette: Palette,
}

impl ColourCycle {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        let mut fb = Framebuffer::new(w, h);
        draw_frames(&mut fb);
        Self {
            fb,
            palette: Palette::stripes(),
        }
    }
}

/// Column `x` paints value `x mod 255` down its diagonal band, mirrored to
/// the top edge and the right edge, which reads as a tunnel mouth.
pub(crate) fn draw_frames(fb: &mut Framebuffer) {
    let (w, h) = (fb.width(), fb.height());
    for x in 0..w {
        let v = (x % 255) as u8;
        for y in x..h.saturating_sub(x) {
            fb.set(x, y, v);
            fb.set(y, x, v);
            fb.set(w - x, y, v);
        }
    }
}

impl Effect for ColourCycle {
    fn name(&self) -> &'static str {
        "colour cycle"
    }

    fn step(&mut self) {
        self.palette.rotate_from(1);
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}
