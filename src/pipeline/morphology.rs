//! Binary morphology with a square structuring element.
//!
//! Cells outside the grid are ignored, so erosion never eats into a region
//! from the image border and dilation never grows anything in from outside.
//! A square element is separable: every pass runs along rows, then columns.

use rayon::prelude::*;

use crate::types::Mask;

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

impl Op {
    fn reduce(self, mut window: impl Iterator<Item = bool>) -> bool {
        match self {
            Op::Erode => window.all(|hit| hit),
            Op::Dilate => window.any(|hit| hit),
        }
    }
}

/// Inclusive window `[i - before, i + after]` clipped to `0..len`, with the
/// anchor at `size / 2` like the usual centered kernels.
fn window(i: usize, len: usize, size: usize) -> std::ops::RangeInclusive<usize> {
    let before = size / 2;
    let after = size - 1 - before;
    i.saturating_sub(before)..=(i + after).min(len - 1)
}

fn apply(mask: &Mask, size: usize, op: Op) -> Mask {
    if size <= 1 || mask.cells.is_empty() {
        return mask.clone();
    }

    let width = mask.width as usize;
    let height = mask.height as usize;

    let mut rows = vec![false; mask.cells.len()];
    rows.par_chunks_exact_mut(width)
        .zip(mask.cells.par_chunks_exact(width))
        .for_each(|(dst, src)| {
            for (x, cell) in dst.iter_mut().enumerate() {
                *cell = op.reduce(src[window(x, width, size)].iter().copied());
            }
        });

    let mut cells = vec![false; mask.cells.len()];
    cells
        .par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, dst)| {
            let span = window(y, height, size);
            for (x, cell) in dst.iter_mut().enumerate() {
                *cell = op.reduce(span.clone().map(|yy| rows[yy * width + x]));
            }
        });

    Mask {
        cells,
        width: mask.width,
        height: mask.height,
    }
}

pub fn erode(mask: &Mask, size: usize) -> Mask {
    apply(mask, size, Op::Erode)
}

pub fn dilate(mask: &Mask, size: usize) -> Mask {
    apply(mask, size, Op::Dilate)
}

/// Erosion followed by dilation. Drops true regions smaller than the element.
pub fn open(mask: &Mask, size: usize) -> Mask {
    dilate(&erode(mask, size), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: u32, height: u32, cells: &[(u32, u32)]) -> Mask {
        let mut mask = Mask::empty(width, height);
        for &(x, y) in cells {
            mask.set(x, y, true);
        }
        mask
    }

    fn block(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> Mask {
        let cells: Vec<_> = (y0..y0 + h)
            .flat_map(|y| (x0..x0 + w).map(move |x| (x, y)))
            .collect();
        mask_with(width, height, &cells)
    }

    #[test]
    fn open_erases_an_isolated_cell() {
        let mask = mask_with(9, 9, &[(4, 4)]);
        let opened = open(&mask, 5);
        assert!(!opened.get(4, 4));
        assert_eq!(opened.count(), 0);
    }

    #[test]
    fn open_erases_a_corner_speck() {
        let mask = mask_with(6, 6, &[(0, 0), (1, 0)]);
        assert_eq!(open(&mask, 5).count(), 0);
    }

    #[test]
    fn open_keeps_a_solid_five_by_five_region() {
        let mask = block(12, 12, 3, 4, 5, 5);
        assert_eq!(open(&mask, 5), mask);
    }

    #[test]
    fn open_keeps_the_interior_of_a_larger_region() {
        let mask = block(20, 16, 2, 3, 11, 8);
        let opened = open(&mask, 5);
        for y in 3..11 {
            for x in 2..13 {
                assert!(opened.get(x, y), "lost ({x}, {y})");
            }
        }
    }

    #[test]
    fn full_mask_survives_open() {
        let mut mask = Mask::empty(7, 5);
        mask.cells.iter_mut().for_each(|c| *c = true);
        assert_eq!(open(&mask, 5), mask);
    }

    #[test]
    fn dilate_grows_by_the_radius() {
        let mask = mask_with(9, 9, &[(4, 4)]);
        let grown = dilate(&mask, 5);
        assert_eq!(grown, block(9, 9, 2, 2, 5, 5));
    }

    #[test]
    fn dilate_clips_at_the_border() {
        let mask = mask_with(4, 4, &[(0, 0)]);
        assert_eq!(dilate(&mask, 5), block(4, 4, 0, 0, 3, 3));
    }

    #[test]
    fn erode_shrinks_by_the_radius() {
        let mask = block(12, 12, 2, 2, 7, 7);
        assert_eq!(erode(&mask, 5), block(12, 12, 4, 4, 3, 3));
    }

    #[test]
    fn unit_kernel_is_identity() {
        let mask = mask_with(5, 5, &[(1, 1), (3, 4)]);
        assert_eq!(open(&mask, 1), mask);
        assert_eq!(dilate(&mask, 1), mask);
    }

    #[test]
    fn even_kernel_anchors_like_odd_one() {
        // size 4: two cells before, one after
        let mask = mask_with(8, 1, &[(4, 0)]);
        let grown = dilate(&mask, 4);
        assert_eq!(grown, block(8, 1, 3, 0, 4, 1));
    }
}
