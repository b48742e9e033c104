use crate::grid::Framebuffer;
use crate::palette::{Palette, Rgba};
use crossterm::{
    cursor, execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Stdout, Write};

const HALF_BLOCK: char = '▀';

/// Raw mode plus alternate screen for as long as it lives.
pub(crate) struct TermGuard {
    out: Stdout,
}

impl TermGuard {
    pub(crate) fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(Self { out })
    }

    pub(crate) fn out(&mut self) -> &mut Stdout {
        &mut self.out
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Rgba,
    pub(crate) bg: Rgba,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Rgba::WHITE,
        bg: Rgba::BLACK,
    };
    // never equal to anything drawn, so the first flush paints every cell
    const UNKNOWN: Cell = Cell {
        ch: '\0',
        fg: Rgba::BLACK,
        bg: Rgba::BLACK,
    };
}

/// Double-buffered terminal cells; `flush` only emits cells that changed.
pub(crate) struct Screen {
    w: u16,
    h: u16,
    prev: Vec<Cell>,
    next: Vec<Cell>,
}

impl Screen {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        let n = w as usize * h as usize;
        Self {
            w,
            h,
            prev: vec![Cell::UNKNOWN; n],
            next: vec![Cell::BLANK; n],
        }
    }

    pub(crate) fn size(&self) -> (u16, u16) {
        (self.w, self.h)
    }

    pub(crate) fn resize(&mut self, w: u16, h: u16) {
        if self.w == w && self.h == h {
            return;
        }
        *self = Self::new(w, h);
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.w as usize + x as usize
    }

    #[cfg(test)]
    pub(crate) fn get_next(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.next[self.idx(x, y)])
    }

    pub(crate) fn set_next(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.next[i] = cell;
    }

    pub(crate) fn text(&mut self, x: u16, y: u16, s: &str, fg: Rgba, bg: Rgba) {
        for (i, ch) in s.chars().enumerate() {
            let Ok(i) = u16::try_from(i) else { break };
            self.set_next(x.saturating_add(i), y, Cell { ch, fg, bg });
        }
    }

    pub(crate) fn clear_row(&mut self, y: u16) {
        for x in 0..self.w {
            self.set_next(x, y, Cell::BLANK);
        }
    }

    pub(crate) fn flush<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let mut last_fg: Option<Rgba> = None;
        let mut last_bg: Option<Rgba> = None;
        let mut cursor_at: Option<(u16, u16)> = None;

        queue!(out, BeginSynchronizedUpdate)?;
        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.idx(x, y);
                let b = self.next[i];
                if self.prev[i] == b {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(out, cursor::MoveTo(x, y))?;
                }
                if last_bg != Some(b.bg) {
                    queue!(out, SetBackgroundColor(b.bg.to_color()))?;
                    last_bg = Some(b.bg);
                }
                if last_fg != Some(b.fg) {
                    queue!(out, SetForegroundColor(b.fg.to_color()))?;
                    last_fg = Some(b.fg);
                }
                queue!(out, Print(b.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        queue!(out, EndSynchronizedUpdate)?;
        out.flush()?;

        self.prev.copy_from_slice(&self.next);
        Ok(())
    }
}

/// Nearest-neighbour lookup of sample (sx, sy) on a `cols x rows` sample grid.
pub(crate) fn sample(fb: &Framebuffer, sx: usize, sy: usize, cols: usize, rows: usize) -> u8 {
    if cols == 0 || rows == 0 {
        return 0;
    }
    let x = sx * fb.width() / cols;
    let y = sy * fb.height() / rows;
    fb.get(x, y).unwrap_or(0)
}

/// Paints the framebuffer into the top `rows` cell rows, two samples per cell.
pub(crate) fn draw_frame(screen: &mut Screen, fb: &Framebuffer, palette: &Palette, rows: u16) {
    let (cols, h) = screen.size();
    let rows = rows.min(h);
    let (sc, sr) = (cols as usize, rows as usize * 2);
    for cy in 0..rows {
        for cx in 0..cols {
            let upper = sample(fb, cx as usize, cy as usize * 2, sc, sr);
            let lower = sample(fb, cx as usize, cy as usize * 2 + 1, sc, sr);
            screen.set_next(
                cx,
                cy,
                Cell {
                    ch: HALF_BLOCK,
                    fg: palette.get(upper),
                    bg: palette.get(lower),
                },
            );
        }
    }
}
