use crate::grid::WaveGrid;
use crate::stencil::UpdateRule;

/// Single-thread version of the leapfrog recurrence.
///
/// Visits every interior cell of every step in row-major order, with no
/// partition and no barrier. Performs the same arithmetic per cell as the
/// parallel steppers, so their outputs must match bit for bit.
pub fn sequential(grid: &WaveGrid, rule: &UpdateRule) {
    for step in 1..grid.steps() {
        for row in 1..grid.rows() - 1 {
            for col in 1..grid.cols() - 1 {
                rule.apply(grid, step, row, col);
            }
        }
        grid.mark_completed(step);
    }
}
