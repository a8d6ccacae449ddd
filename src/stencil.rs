//! Finite-difference update of a single interior cell.

use serde::{Deserialize, Serialize};

use crate::grid::WaveGrid;

/// Spatial stencil used by the leapfrog update for steps after the first.
///
/// `Reference` keeps the arithmetic of the established solver, which folds the
/// center into the neighbor sum before subtracting `4 * center` and therefore
/// nets `-3 * center` inside the `pd` term. `Laplacian` is the textbook
/// five-point form. The two disagree whenever the field is non-zero; results
/// produced with one are not comparable with the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Stencil {
    #[default]
    Reference,
    Laplacian,
}

/// The update rule plus its shared constant `pd = c^2 * (dt/dx)^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRule {
    pub pd: f32,
    pub stencil: Stencil,
}

impl UpdateRule {
    pub fn new(pd: f32, stencil: Stencil) -> Self {
        UpdateRule { pd, stencil }
    }

    /// Computes `grid[step][row][col]` from steps `step - 1` and `step - 2`.
    ///
    /// `row` and `col` must be interior and `step >= 1`; step 0 is the initial
    /// condition. Only the target cell is written.
    #[inline]
    pub fn apply(&self, grid: &WaveGrid, step: usize, row: usize, col: usize) {
        let value = if step > 1 {
            let prev = step - 1;
            let up = grid.cell(prev, row - 1, col);
            let down = grid.cell(prev, row + 1, col);
            let right = grid.cell(prev, row, col + 1);
            let left = grid.cell(prev, row, col - 1);
            let before = grid.cell(prev, row, col);
            let before2 = grid.cell(step - 2, row, col);
            self.leapfrog(up, down, right, left, before, before2)
        } else {
            // zero initial velocity: half-strength stencil, no step -1 term
            let up = grid.cell(0, row - 1, col);
            let down = grid.cell(0, row + 1, col);
            let right = grid.cell(0, row, col + 1);
            let left = grid.cell(0, row, col - 1);
            let before = grid.cell(0, row, col);
            self.starter(up, down, right, left, before)
        };
        grid.set_cell(step, row, col, value);
    }

    #[inline(always)]
    fn starter(&self, up: f32, down: f32, right: f32, left: f32, before: f32) -> f32 {
        ((self.pd / 2.0) * (up + right + left + down - (4.0 * before))) + before
    }

    #[inline(always)]
    fn leapfrog(&self, up: f32, down: f32, right: f32, left: f32, before: f32, before2: f32) -> f32 {
        let spatial = match self.stencil {
            Stencil::Reference => up + right + left + down + before - (4.0 * before),
            Stencil::Laplacian => up + right + left + down - (4.0 * before),
        };
        (self.pd * spatial) + (2.0 * before) - before2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PD: f32 = 0.0025;

    fn impulse_grid(steps: usize) -> WaveGrid {
        let mut grid = WaveGrid::new(5, 5, steps, 1).unwrap();
        grid.set_initial(2, 2, 100.0).unwrap();
        grid
    }

    #[test]
    fn test_first_step_uses_half_strength_starter() {
        let grid = impulse_grid(2);
        let rule = UpdateRule::new(PD, Stencil::Reference);
        rule.apply(&grid, 1, 2, 2);
        rule.apply(&grid, 1, 1, 2);
        rule.apply(&grid, 1, 2, 3);

        let center = (PD / 2.0) * (0.0 + 0.0 + 0.0 + 0.0 - 4.0 * 100.0) + 100.0;
        assert_eq!(grid.cell(1, 2, 2), center);
        assert_eq!(grid.cell(1, 1, 2), (PD / 2.0) * 100.0);
        assert_eq!(grid.cell(1, 2, 3), (PD / 2.0) * 100.0);
    }

    #[test]
    fn test_first_step_ignores_stencil_choice() {
        let a = impulse_grid(2);
        let b = impulse_grid(2);
        UpdateRule::new(PD, Stencil::Reference).apply(&a, 1, 2, 2);
        UpdateRule::new(PD, Stencil::Laplacian).apply(&b, 1, 2, 2);
        assert_eq!(a.cell(1, 2, 2), b.cell(1, 2, 2));
    }

    #[test]
    fn test_stencils_differ_by_one_center_term() {
        let grid = WaveGrid::new(3, 3, 3, 1).unwrap();
        grid.set_cell(1, 1, 1, 10.0);
        grid.set_cell(0, 1, 1, 4.0);

        UpdateRule::new(PD, Stencil::Reference).apply(&grid, 2, 1, 1);
        let reference = grid.cell(2, 1, 1);
        assert_eq!(reference, PD * (10.0 - 40.0) + 20.0 - 4.0);

        UpdateRule::new(PD, Stencil::Laplacian).apply(&grid, 2, 1, 1);
        let laplacian = grid.cell(2, 1, 1);
        assert_eq!(laplacian, PD * (-40.0) + 20.0 - 4.0);
        assert!(laplacian < reference);
    }

    #[test]
    fn test_only_target_cell_is_written() {
        let grid = impulse_grid(3);
        let rule = UpdateRule::new(PD, Stencil::Laplacian);
        rule.apply(&grid, 1, 2, 2);
        let step1 = grid.slice(1).unwrap();
        let written: Vec<usize> = step1
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(written, vec![2 * 5 + 2]);
    }
}
