use crossterm::style::Color;

pub(crate) const PALETTE_SIZE: usize = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rgba {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Rgba {
    pub(crate) const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub(crate) const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub(crate) const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
        let mix = |x: u8, y: u8| ((1.0 - t) * x as f32 + t * y as f32) as u8;
        Rgba::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }

    pub(crate) fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// 256-entry colour table indexed by framebuffer values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Palette {
    colours: [Rgba; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colours: [Rgba::BLACK; PALETTE_SIZE],
        }
    }
}

impl Palette {
    pub(crate) fn from_fn(mut f: impl FnMut(usize) -> Rgba) -> Self {
        let mut p = Self::default();
        for (i, c) in p.colours.iter_mut().enumerate() {
            *c = f(i);
        }
        p
    }

    /// Builds a palette from loaded entries; missing slots stay black.
    pub(crate) fn from_entries(entries: &[Rgba]) -> Self {
        let mut p = Self::default();
        for (dst, src) in p.colours.iter_mut().zip(entries) {
            *dst = *src;
        }
        p
    }

    #[inline]
    pub(crate) fn get(&self, i: u8) -> Rgba {
        self.colours[i as usize]
    }

    pub(crate) fn set(&mut self, i: u8, c: Rgba) {
        self.colours[i as usize] = c;
    }

    /// Cyclic left shift by one slot: slot 0 receives slot 1, slot 255 receives slot 0.
    pub(crate) fn rotate(&mut self) {
        self.colours.rotate_left(1);
    }

    /// Rotates only `start..256`, leaving the lower slots pinned.
    pub(crate) fn rotate_from(&mut self, start: usize) {
        if start < PALETTE_SIZE - 1 {
            self.colours[start..].rotate_left(1);
        }
    }

    /// Black → orange → cyan → black, used by the plasma cloud.
    pub(crate) fn cloud() -> Self {
        let black = Rgba::BLACK;
        let orange = Rgba::rgb(255, 165, 0);
        let cyan = Rgba::rgb(0, 255, 255);

        Self::from_fn(|i| match i {
            0 => black,
            1..=84 => Rgba::lerp(black, orange, i as f32 / 85.0),
            85 => orange,
            86..=169 => Rgba::lerp(orange, cyan, (i - 85) as f32 / 84.0),
            170 => cyan,
            _ => Rgba::lerp(cyan, black, (i - 170) as f32 / 85.0),
        })
    }

    /// Two red and two blue bands on black, for palette-cycling the tunnel frame.
    pub(crate) fn stripes() -> Self {
        Self::from_fn(|i| {
            let up = |k: usize| (k * 8) as u8;
            let down = |k: usize| (255 - k * 8) as u8;
            match i {
                32..=63 => Rgba::rgb(up(i - 32), 0, 0),
                64..=95 => Rgba::rgb(down(i - 64), 0, 0),
                128..=159 => Rgba::rgb(0, 0, up(i - 128)),
                160..=191 => Rgba::rgb(0, 0, down(i - 160)),
                _ => Rgba::BLACK,
            }
        })
    }

    /// Heat ramp black → dark red → orange → yellow → white.
    pub(crate) fn fire(ramp: FireRamp) -> Self {
        let reds = fire_reds(ramp);
        let greens = fire_greens();
        let blues = fire_blues(ramp);
        Self::from_fn(|i| Rgba::rgb(reds[i], greens[i], blues[i]))
    }

    /// Escape-time colouring; the interior slot 255 is black.
    pub(crate) fn mandelbrot() -> Self {
        let mut p = Self::from_fn(|i| {
            Rgba::rgb(((i * 2) % 256) as u8, ((i * 5) % 256) as u8, ((i * 7) % 256) as u8)
        });
        p.set(255, Rgba::BLACK);
        p
    }

    /// Blue sawtooth with a white highlight in the top slot.
    pub(crate) fn water() -> Self {
        let mut p = Self::from_fn(|i| Rgba::rgb(0, 0, (i * 2) as u8));
        p.set(255, Rgba::WHITE);
        p
    }

    /// Full hue sweep; slot 0 stays black.
    pub(crate) fn rainbow() -> Self {
        Self::from_fn(|i| {
            if i == 0 {
                return Rgba::BLACK;
            }
            hsv_to_rgb(i as f32 / PALETTE_SIZE as f32 * 360.0, 0.85, 1.0)
        })
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgba {
    let h = (h % 360.0 + 360.0) % 360.0;
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r1, g1, b1) = match (h / 60.0) as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f32| ((f + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba::rgb(to_u8(r1), to_u8(g1), to_u8(b1))
}

/// The two fire demos shipped slightly different ramps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FireRamp {
    Classic,
    Conway,
}

fn pad_to_palette(mut v: Vec<u8>, fill: u8) -> Vec<u8> {
    v.resize(v.len().max(PALETTE_SIZE), fill);
    v
}

fn fire_reds(ramp: FireRamp) -> Vec<u8> {
    let dark = match ramp {
        FireRamp::Classic => 8,
        FireRamp::Conway => 18,
    };
    let mut out = vec![0u8; dark];
    out.extend((1..=16).map(|i| (i * 8) as u8));

    let mut count = 128u8;
    for _ in 0..=7 {
        out.push(count);
        if count == 176 {
            count += 4;
            out.push(count);
            continue;
        }
        for _ in 0..4 {
            count += 4;
            out.push(count);
        }
    }
    pad_to_palette(out, 252)
}

fn fire_greens() -> Vec<u8> {
    let mut out = vec![0u8; 40];
    for g in (4..=252u8).step_by(4) {
        out.push(g);
        out.push(g);
    }
    pad_to_palette(out, 252)
}

fn fire_blues(ramp: FireRamp) -> Vec<u8> {
    let mut out = vec![0u8];
    match ramp {
        FireRamp::Classic => {
            for i in 0..36u8 {
                out.push(i);
                out.push(i);
            }
            for i in (0..=18u8).rev() {
                out.push(i * 2);
                out.push(i * 2);
            }
            out.resize(144, 0);
            for i in 0..54u8 {
                out.push(i * 4);
                out.push(i * 4);
            }
        }
        FireRamp::Conway => {
            out.extend((0..36u8).map(|i| i * 2));
            for i in (0..=18u8).rev() {
                out.push(i);
                out.push(i);
            }
            let mut i = 0u8;
            while out.len() < 144 {
                out.push(i);
                i += 1;
            }
            for i in 0..54u8 {
                out.push(i);
                out.push(i);
            }
        }
    }
    pad_to_palette(out, 252)
}
