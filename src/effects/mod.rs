pub(crate) mod cloud;
pub(crate) mod cycle;
pub(crate) mod fire;
pub(crate) mod mandel;
pub(crate) mod remap;
pub(crate) mod scroll;
pub(crate) mod view;
pub(crate) mod water;

use crate::grid::Framebuffer;
use crate::palette::Palette;

/// One running demo: owns its framebuffer, palette and any simulation state.
pub(crate) trait Effect {
    fn name(&self) -> &'static str;

    /// Advances one frame. Either the framebuffer or the palette (or both) change.
    fn step(&mut self);

    fn frame(&self) -> &Framebuffer;

    fn palette(&self) -> &Palette;

    /// Effects with a fixed run length report completion here.
    fn finished(&self) -> bool {
        false
    }
}
