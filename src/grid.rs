use std::ops::{Index, IndexMut};

/// Palette slot that means "nothing drawn here".
pub(crate) const BACKGROUND: u8 = 0;

/// Row-major 2D buffer. All coordinate access is bounds checked; the flat
/// slice is exposed for whole-buffer copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Grid<T> {
    w: usize,
    h: usize,
    cells: Vec<T>,
}

/// Indexed-colour virtual screen.
pub(crate) type Framebuffer = Grid<u8>;

impl<T: Copy + Default> Grid<T> {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            cells: vec![T::default(); w * h],
        }
    }

    /// Wraps an existing flat buffer; `None` when the length does not match.
    pub(crate) fn from_vec(w: usize, h: usize, cells: Vec<T>) -> Option<Self> {
        if cells.len() != w * h {
            return None;
        }
        Some(Self { w, h, cells })
    }

    #[inline]
    pub(crate) fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub(crate) fn contains(&self, x: usize, y: usize) -> bool {
        x < self.w && y < self.h
    }

    #[inline]
    pub(crate) fn idx(&self, x: usize, y: usize) -> Option<usize> {
        self.contains(x, y).then(|| y * self.w + x)
    }

    #[inline]
    pub(crate) fn get(&self, x: usize, y: usize) -> Option<T> {
        self.idx(x, y).map(|i| self.cells[i])
    }

    /// Writes are silently dropped outside the grid.
    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, v: T) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = v;
        }
    }

    #[cfg(test)]
    pub(crate) fn fill(&mut self, v: T) {
        self.cells.fill(v);
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub(crate) fn row(&self, y: usize) -> &[T] {
        &self.cells[y * self.w..(y + 1) * self.w]
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.cells[y * self.w..(y + 1) * self.w]
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        assert!(x < self.w && y < self.h, "({x}, {y}) outside {}x{}", self.w, self.h);
        &self.cells[y * self.w + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        assert!(x < self.w && y < self.h, "({x}, {y}) outside {}x{}", self.w, self.h);
        &mut self.cells[y * self.w + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_grid_is_background() {
        let fb = Framebuffer::new(4, 3);
        assert_eq!(fb.as_slice().len(), 12);
        assert!(fb.as_slice().iter().all(|&v| v == BACKGROUND));
    }

    #[test]
    fn set_outside_is_ignored() {
        let mut fb = Framebuffer::new(4, 3);
        fb.set(4, 0, 9);
        fb.set(0, 3, 9);
        assert!(fb.as_slice().iter().all(|&v| v == 0));
        fb.set(3, 2, 9);
        assert_eq!(fb[(3, 2)], 9);
        assert_eq!(fb.as_slice()[11], 9);
    }

    #[test]
    fn rows_are_contiguous() {
        let g = Grid::from_vec(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(g.row(1), &[4, 5, 6]);
        assert_eq!(g.get(3, 0), None);
        assert_eq!(g.get(2, 1), Some(6));
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Grid::from_vec(3, 2, vec![0u8; 5]).is_none());
    }

    #[test]
    #[should_panic]
    fn index_past_row_end_panics() {
        let g = Framebuffer::new(4, 3);
        let _ = g[(4, 0)];
    }

    proptest! {
        #[test]
        fn get_agrees_with_contains(w in 1usize..32, h in 1usize..32, x in 0usize..40, y in 0usize..40) {
            let g = Grid::<i32>::new(w, h);
            prop_assert_eq!(g.get(x, y).is_some(), x < w && y < h);
        }
    }
}
