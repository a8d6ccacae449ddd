//! Run driver: builds the shared state, runs the selected stepper and hands
//! the finished grid to persistence.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn};

use crate::config::{Backend, SimulationConfig};
use crate::error::WaveResult;
use crate::grid::WaveGrid;
use crate::implementations::barrier::barrier_parallel::barrier_parallel;
use crate::implementations::pool::rayon_parallel;
use crate::implementations::single::sequential;
use crate::implementations::worker::{RunContext, WorkerReport};
use crate::io::save_step;
use crate::partition::WorkAssignment;
use crate::stencil::{Stencil, UpdateRule};

/// A configured run whose workers have not started yet.
#[derive(Debug)]
pub struct Simulation {
    context: RunContext,
    backend: Backend,
}

impl Simulation {
    /// Validates `config`, allocates the grid and partition and applies the
    /// configured impulses.
    pub fn new(config: &SimulationConfig) -> WaveResult<Self> {
        config.validate()?;

        let grid = WaveGrid::with_storage(
            config.size,
            config.size,
            config.steps,
            config.threads,
            config.storage,
        )?;
        let assignment = WorkAssignment::round_robin(config.size, config.size, config.threads)?;
        let rule = UpdateRule::new(config.physics.coefficient(), config.stencil);

        let mut simulation = Simulation::from_parts(grid, assignment, rule, config.backend)?;
        for impulse in &config.impulses {
            simulation.set_initial(impulse.row, impulse.col, impulse.value)?;
        }
        Ok(simulation)
    }

    pub fn from_parts(
        grid: WaveGrid,
        assignment: WorkAssignment,
        rule: UpdateRule,
        backend: Backend,
    ) -> WaveResult<Self> {
        Ok(Simulation {
            context: RunContext::new(grid, assignment, rule)?,
            backend,
        })
    }

    pub fn grid(&self) -> &WaveGrid {
        self.context.grid()
    }

    pub fn assignment(&self) -> &WorkAssignment {
        self.context.assignment()
    }

    pub fn rule(&self) -> &UpdateRule {
        self.context.rule()
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Pre-run hook setting the initial displacement of an interior cell.
    pub fn set_initial(&mut self, row: usize, col: usize, value: f32) -> WaveResult<()> {
        self.context.grid_mut().set_initial(row, col, value)
    }

    /// True when step 0 holds no excitation, whichever way it was written.
    pub fn is_inert(&self) -> WaveResult<bool> {
        Ok(self.grid().slice(0)?.iter().all(|v| *v == 0.0))
    }

    /// Runs steps `1..steps` to completion.
    pub fn run(self) -> WaveResult<Outcome> {
        let grid = self.context.grid();
        let span = info_span!(
            "run",
            rows = grid.rows(),
            cols = grid.cols(),
            steps = grid.steps(),
            threads = grid.threads(),
            backend = ?self.backend
        );
        let _enter = span.enter();

        if self.is_inert()? {
            warn!("initial condition is all zero, the field will stay at zero");
        }
        if self.context.rule().stencil == Stencil::Reference {
            debug!("reference stencil nets -3*center inside the pd term, not the five-point -4*center");
        }
        info!(pd = self.context.rule().pd, storage = ?grid.storage(), "starting run");

        let context = Arc::new(self.context);
        let start = Instant::now();
        let reports = match self.backend {
            Backend::Threads => barrier_parallel(&context)?,
            Backend::Rayon => rayon_parallel(&context)?,
            Backend::Sequential => {
                sequential(context.grid(), context.rule());
                vec![WorkerReport {
                    worker: 0,
                    cells: context.assignment().total_cells(),
                    barrier_waits: 0,
                }]
            }
        };
        let elapsed = start.elapsed();
        info!(?elapsed, "run finished");

        Ok(Outcome {
            context,
            reports,
            elapsed,
        })
    }
}

/// A finished run. The grid is stable and safe to read.
#[derive(Debug)]
pub struct Outcome {
    context: Arc<RunContext>,
    reports: Vec<WorkerReport>,
    elapsed: Duration,
}

impl Outcome {
    pub fn grid(&self) -> &WaveGrid {
        self.context.grid()
    }

    pub fn assignment(&self) -> &WorkAssignment {
        self.context.assignment()
    }

    /// One report per worker, in worker order.
    pub fn reports(&self) -> &[WorkerReport] {
        &self.reports
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Saves `step` to `path`. Returns `false` without writing when the step
    /// lies beyond the run (`step > steps`).
    pub fn persist(&self, path: impl AsRef<Path>, step: usize) -> WaveResult<bool> {
        let steps = self.grid().steps();
        if step > steps {
            info!(step, steps, "output step beyond the run, nothing saved");
            return Ok(false);
        }
        save_step(self.grid(), path, step)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn simulation() -> Simulation {
        let config = SimulationConfig::new(5, 3, 2, PathBuf::from("out.raw"), 2);
        Simulation::new(&config).unwrap()
    }

    #[test]
    fn test_unseeded_run_is_inert() {
        assert!(simulation().is_inert().unwrap());
    }

    #[test]
    fn test_direct_grid_write_counts_as_excitation() {
        let simulation = simulation();
        simulation.grid().write_cell(0, 2, 2, 5.0).unwrap();
        assert!(!simulation.is_inert().unwrap());
    }

    #[test]
    fn test_set_initial_counts_as_excitation() {
        let mut simulation = simulation();
        simulation.set_initial(1, 3, -2.0).unwrap();
        assert!(!simulation.is_inert().unwrap());
    }
}
