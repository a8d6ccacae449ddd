//! Static round-robin assignment of interior cells to workers.

use std::fmt;

use crate::error::{WaveError, WaveResult};

/// Interior cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// For each worker, the ordered cells it computes at every step.
///
/// The per-worker lists form a disjoint cover of the interior, which is what
/// lets workers write the shared grid without a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    rows: usize,
    cols: usize,
    workers: Vec<Vec<Cell>>,
}

impl WorkAssignment {
    /// Enumerates interior cells in row-major order and hands the `n`-th one
    /// to worker `n % threads`.
    pub fn round_robin(rows: usize, cols: usize, threads: usize) -> WaveResult<Self> {
        if rows < 3 || cols < 3 {
            return Err(WaveError::GridTooSmall { rows, cols });
        }
        if threads == 0 {
            return Err(WaveError::NoThreads);
        }

        let interior = (rows - 2)
            .checked_mul(cols - 2)
            .ok_or(WaveError::Allocation { cells: usize::MAX })?;
        let per_worker = interior.div_ceil(threads);

        let mut workers = Vec::new();
        workers
            .try_reserve_exact(threads)
            .map_err(|_| WaveError::Allocation { cells: interior })?;
        for _ in 0..threads {
            let mut cells = Vec::new();
            cells
                .try_reserve_exact(per_worker)
                .map_err(|_| WaveError::Allocation { cells: per_worker })?;
            workers.push(cells);
        }

        let mut counter = 0;
        for row in 1..rows - 1 {
            for col in 1..cols - 1 {
                workers[counter % threads].push(Cell { row, col });
                counter += 1;
            }
        }

        Ok(WorkAssignment {
            rows,
            cols,
            workers,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Cells of one worker, in the order they are computed.
    pub fn worker(&self, index: usize) -> &[Cell] {
        &self.workers[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.workers.iter().map(Vec::as_slice).enumerate()
    }

    pub fn total_cells(&self) -> usize {
        self.workers.iter().map(Vec::len).sum()
    }
}

impl fmt::Display for WorkAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, cells) in self.iter() {
            writeln!(f, "Worker {}", index)?;
            writeln!(f, "cells: {}", cells.len())?;
            for cell in cells {
                writeln!(f, "{},{}", cell.row, cell.col)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
