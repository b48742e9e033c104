use super::Effect;
use crate::grid::Framebuffer;
use crate::palette::Palette;

pub(crate) const MAX_ITERATIONS: u8 = 255;
const ESCAPE_RADIUS_SQ: f64 = 4.0;
const MIN_ZOOM: f64 = 1e-9;

/// Where the camera looks and how it drifts each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct View {
    pub(crate) center: (f64, f64),
    pub(crate) zoom: f64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ZoomPath {
    pub(crate) start: View,
    pub(crate) zoom_step: f64,
    pub(crate) center_step: (f64, f64),
    pub(crate) zoom_limit: f64,
}

impl Default for ZoomPath {
    fn default() -> Self {
        // Seahorse valley, drifting into a slightly rotated baby brot.
        Self {
            start: View {
                center: (-0.743023954, -0.129123012),
                zoom: 1.0,
            },
            zoom_step: 1.0,
            center_step: (-0.00000001, -0.00001),
            zoom_limit: 1024.0,
        }
    }
}

pub(crate) struct MandelZoom {
    fb: Framebuffer,
    palette: Palette,
    view: View,
    path: ZoomPath,
}

impl MandelZoom {
    pub(crate) fn new(w: usize, h: usize, path: ZoomPath) -> Self {
        Self {
            fb: Framebuffer::new(w, h),
            palette: Palette::mandelbrot(),
            view: path.start,
            path,
        }
    }
}

impl Effect for MandelZoom {
    fn name(&self) -> &'static str {
        "mandelbrot zoom"
    }

    fn step(&mut self) {
        render(&mut self.fb, self.view);
        self.view.zoom += self.path.zoom_step;
        self.view.center.0 += self.path.center_step.0;
        self.view.center.1 += self.path.center_step.1;
    }

    fn frame(&self) -> &Framebuffer {
        &self.fb
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn finished(&self) -> bool {
        self.view.zoom >= self.path.zoom_limit
    }
}

/// Iterations of `z = z² + c`, starting at `z = c`, before `|z|² >= 4`.
/// Points that never escape return [`MAX_ITERATIONS`].
pub(crate) fn escape_time(cx: f64, cy: f64) -> u8 {
    let (mut zx, mut zy) = (cx, cy);
    let (mut zx2, mut zy2) = (zx * zx, zy * zy);
    let mut n = 0u8;
    while zx2 + zy2 < ESCAPE_RADIUS_SQ && n < MAX_ITERATIONS {
        zy = 2.0 * zx * zy + cy;
        zx = zx2 - zy2 + cx;
        zx2 = zx * zx;
        zy2 = zy * zy;
        n += 1;
    }
    n
}

/// Screen pixel to complex plane. At zoom 1 the screen spans one unit on
/// each axis around the center.
pub(crate) fn to_plane(x: usize, y: usize, w: usize, h: usize, view: View) -> (f64, f64) {
    let zoom = view.zoom.max(MIN_ZOOM);
    let half_w = (w / 2) as f64;
    let half_h = (h / 2) as f64;
    (
        (x as f64 - half_w) / (zoom * w as f64) + view.center.0,
        (y as f64 - half_h) / (zoom * h as f64) + view.center.1,
    )
}

/// Recomputes the whole buffer; nothing is carried over between frames.
pub(crate) fn render(fb: &mut Framebuffer, view: View) {
    let (w, h) = (fb.width(), fb.height());
    for y in 0..h {
        for (x, px) in fb.row_mut(y).iter_mut().enumerate() {
            let (cx, cy) = to_plane(x, y, w, h, view);
            *px = escape_time(cx, cy);
        }
    }
}
