use std::sync::Arc;

use tracing::debug;

use crate::error::{WaveError, WaveResult};
use crate::grid::WaveGrid;
use crate::partition::WorkAssignment;
use crate::stencil::UpdateRule;

/// Read-mostly state shared by every worker of a run.
///
/// The driver keeps one `Arc` for the whole run and reads the grid back
/// after the workers joined.
#[derive(Debug)]
pub struct RunContext {
    grid: WaveGrid,
    assignment: WorkAssignment,
    rule: UpdateRule,
}

impl RunContext {
    pub fn new(grid: WaveGrid, assignment: WorkAssignment, rule: UpdateRule) -> WaveResult<Self> {
        if assignment.rows() != grid.rows() || assignment.cols() != grid.cols() {
            return Err(WaveError::Config(format!(
                "partition is for a {}x{} grid, grid is {}x{}",
                assignment.rows(),
                assignment.cols(),
                grid.rows(),
                grid.cols()
            )));
        }
        if assignment.worker_count() != grid.threads() {
            return Err(WaveError::Config(format!(
                "partition has {} workers, step barriers expect {}",
                assignment.worker_count(),
                grid.threads()
            )));
        }
        Ok(RunContext {
            grid,
            assignment,
            rule,
        })
    }

    pub fn grid(&self) -> &WaveGrid {
        &self.grid
    }

    /// Mutable grid access for the pre-run initial condition. Workers only
    /// ever see the context behind an `Arc`, so this cannot race with them.
    pub(crate) fn grid_mut(&mut self) -> &mut WaveGrid {
        &mut self.grid
    }

    pub fn assignment(&self) -> &WorkAssignment {
        &self.assignment
    }

    pub fn rule(&self) -> &UpdateRule {
        &self.rule
    }
}

/// What one worker did over a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub cells: usize,
    pub barrier_waits: usize,
}

/// Per-worker configuration, owned by the thread that runs it.
pub struct Worker {
    index: usize,
    context: Arc<RunContext>,
}

impl Worker {
    pub fn new(index: usize, context: Arc<RunContext>) -> Self {
        Worker { index, context }
    }

    /// Computes this worker's cells for steps `1..steps`, waiting at each
    /// step's barrier before moving on.
    pub fn run(&self) -> WorkerReport {
        let grid = self.context.grid();
        let rule = *self.context.rule();
        let cells = self.context.assignment().worker(self.index);
        debug!(worker = self.index, cells = cells.len(), "worker started");

        let mut barrier_waits = 0;
        for step in 1..grid.steps() {
            for cell in cells {
                rule.apply(grid, step, cell.row, cell.col);
            }
            // nobody reads step `step` before every owner has written it
            if grid.wait_at_step_barrier(step).is_leader() {
                grid.mark_completed(step);
            }
            barrier_waits += 1;
        }

        debug!(worker = self.index, barrier_waits, "worker done");
        WorkerReport {
            worker: self.index,
            cells: cells.len(),
            barrier_waits,
        }
    }
}
