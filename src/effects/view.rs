use super::Effect;
use crate::grid::{Framebuffer, Grid};
use crate::palette::Palette;

/// Shows a loaded image as-is, clipped to the framebuffer.
pub(crate) struct Viewer {
    fb: Framebuffer,
    palette: Palette,
}

impl Viewer {
    pub(crate) fn new(w: usize, h: usize, image: &Grid<u8>, palette: Palette) -> Self {
        let mut fb = Framebuffer::new(w, h);
        for y in 0..h.min(image.height()) {
            let n = w.min(image.width());
            fb.row_mut(y)[..n].copy_from_slice(&image.row(y)[..n]);
        }
        Self { fb, palette }
    }
}

impl Effect for Viewer {
    fn name(&self) -> &'static str {
        "viewer"
    }

    fn step(&mut self) {}

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}
