//! Error types for the wave solver.

use thiserror::Error;

/// Result alias used across the crate.
pub type WaveResult<T> = Result<T, WaveError>;

/// Every failure in the solver is fatal to the run.
#[derive(Error, Debug)]
pub enum WaveError {
    /// The grid has no interior cell.
    #[error("grid must be at least 3x3, got {rows}x{cols}")]
    GridTooSmall { rows: usize, cols: usize },

    #[error("at least one time step is required")]
    NoSteps,

    #[error("at least one worker thread is required")]
    NoThreads,

    /// Cell access outside the grid.
    #[error("cell ({row}, {col}) at step {step} is outside a {rows}x{cols} grid with {steps} steps")]
    OutOfBounds {
        step: usize,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        steps: usize,
    },

    /// Border cells keep their initial value and cannot be seeded.
    #[error("cell ({row}, {col}) lies on the border")]
    BorderCell { row: usize, col: usize },

    /// Rolling storage does not hold the requested step.
    #[error("step {step} is not retained (retained steps start at {oldest})")]
    StepNotRetained { step: usize, oldest: usize },

    #[error("failed to allocate storage for {cells} cells")]
    Allocation { cells: usize },

    #[error("failed to start worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted slice does not match the expected dimensions.
    #[error("slice holds {found} values, expected {rows}x{cols}")]
    SliceSize { found: usize, rows: usize, cols: usize },
}
