use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Barrier, BarrierWaitResult};

use serde::{Deserialize, Serialize};

use crate::error::{WaveError, WaveResult};

/// Number of slices kept by [`Storage::Rolling`]: the step being written
/// and the two steps the leapfrog update reads from.
pub const ROLLING_SLOTS: usize = 3;

/// How many time steps of the field are kept in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Storage {
    /// One slice per step; any step can be read back after the run.
    #[default]
    FullHistory,
    /// Three slices reused modulo 3; only the last three steps survive.
    Rolling,
}

/// Time history of the scalar field plus one barrier per step.
///
/// Cells hold `f32` bit patterns in atomics so the grid can be shared by
/// reference between workers without a lock. Each interior cell is owned by
/// exactly one worker, and the barrier of step `s` orders every write of
/// step `s` before any read of it, so relaxed loads and stores suffice.
pub struct WaveGrid {
    rows: usize,
    cols: usize,
    steps: usize,
    threads: usize,
    storage: Storage,
    slices: Vec<Box<[AtomicU32]>>,
    barriers: Vec<Barrier>,
    latest: AtomicUsize,
}

impl WaveGrid {
    /// Creates a zeroed grid keeping every step.
    pub fn new(rows: usize, cols: usize, steps: usize, threads: usize) -> WaveResult<Self> {
        Self::with_storage(rows, cols, steps, threads, Storage::FullHistory)
    }

    pub fn with_storage(
        rows: usize,
        cols: usize,
        steps: usize,
        threads: usize,
        storage: Storage,
    ) -> WaveResult<Self> {
        if rows < 3 || cols < 3 {
            return Err(WaveError::GridTooSmall { rows, cols });
        }
        if steps == 0 {
            return Err(WaveError::NoSteps);
        }
        if threads == 0 {
            return Err(WaveError::NoThreads);
        }

        let cells = rows
            .checked_mul(cols)
            .ok_or(WaveError::Allocation { cells: usize::MAX })?;
        let slots = match storage {
            Storage::FullHistory => steps,
            Storage::Rolling => steps.min(ROLLING_SLOTS),
        };

        let mut slices = Vec::new();
        slices
            .try_reserve_exact(slots)
            .map_err(|_| WaveError::Allocation {
                cells: cells.saturating_mul(slots),
            })?;
        for _ in 0..slots {
            slices.push(zeroed_slice(cells)?);
        }

        let mut barriers = Vec::new();
        barriers
            .try_reserve_exact(steps)
            .map_err(|_| WaveError::Allocation { cells: steps })?;
        barriers.extend((0..steps).map(|_| Barrier::new(threads)));

        Ok(WaveGrid {
            rows,
            cols,
            steps,
            threads,
            storage,
            slices,
            barriers,
            latest: AtomicUsize::new(0),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of participants each step barrier waits for.
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn storage(&self) -> Storage {
        self.storage
    }

    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1
    }

    /// Steps whose values can currently be read back.
    pub fn retained_steps(&self) -> Range<usize> {
        match self.storage {
            Storage::FullHistory => 0..self.steps,
            Storage::Rolling => {
                let oldest = self.latest.load(Ordering::Acquire).saturating_sub(ROLLING_SLOTS - 1);
                oldest..(oldest + ROLLING_SLOTS).min(self.steps)
            }
        }
    }

    /// Newest step known to be fully computed.
    pub fn latest_step(&self) -> usize {
        self.latest.load(Ordering::Acquire)
    }

    pub(crate) fn mark_completed(&self, step: usize) {
        self.latest.store(step, Ordering::Release);
    }

    #[inline(always)]
    fn slot(&self, step: usize) -> usize {
        match self.storage {
            Storage::FullHistory => step,
            Storage::Rolling => step % ROLLING_SLOTS,
        }
    }

    /// Unchecked read used on the hot path. Indices must be in range.
    #[inline(always)]
    pub(crate) fn cell(&self, step: usize, row: usize, col: usize) -> f32 {
        let bits = self.slices[self.slot(step)][row * self.cols + col].load(Ordering::Relaxed);
        f32::from_bits(bits)
    }

    /// Unchecked write used on the hot path. Only the owner of the cell may call it.
    #[inline(always)]
    pub(crate) fn set_cell(&self, step: usize, row: usize, col: usize, value: f32) {
        self.slices[self.slot(step)][row * self.cols + col].store(value.to_bits(), Ordering::Relaxed);
    }

    fn check_bounds(&self, step: usize, row: usize, col: usize) -> WaveResult<()> {
        if step >= self.steps || row >= self.rows || col >= self.cols {
            return Err(WaveError::OutOfBounds {
                step,
                row,
                col,
                rows: self.rows,
                cols: self.cols,
                steps: self.steps,
            });
        }
        Ok(())
    }

    fn check_retained(&self, step: usize) -> WaveResult<()> {
        let retained = self.retained_steps();
        if !retained.contains(&step) {
            return Err(WaveError::StepNotRetained {
                step,
                oldest: retained.start,
            });
        }
        Ok(())
    }

    pub fn read_cell(&self, step: usize, row: usize, col: usize) -> WaveResult<f32> {
        self.check_bounds(step, row, col)?;
        self.check_retained(step)?;
        Ok(self.cell(step, row, col))
    }

    /// Writes an interior cell. Border cells are rejected so they keep their
    /// initial value at every step.
    pub fn write_cell(&self, step: usize, row: usize, col: usize, value: f32) -> WaveResult<()> {
        self.check_bounds(step, row, col)?;
        if self.is_border(row, col) {
            return Err(WaveError::BorderCell { row, col });
        }
        self.set_cell(step, row, col, value);
        Ok(())
    }

    /// Seeds the initial condition at step 0. Must run before any worker starts.
    pub fn set_initial(&mut self, row: usize, col: usize, value: f32) -> WaveResult<()> {
        self.write_cell(0, row, col, value)
    }

    /// Blocks until `threads` workers reached the barrier of `step`.
    pub fn wait_at_step_barrier(&self, step: usize) -> BarrierWaitResult {
        self.barriers[step].wait()
    }

    /// Row-major copy of one step.
    pub fn slice(&self, step: usize) -> WaveResult<Vec<f32>> {
        self.check_bounds(step, 0, 0)?;
        self.check_retained(step)?;
        let slot = &self.slices[self.slot(step)];
        Ok(slot
            .iter()
            .map(|bits| f32::from_bits(bits.load(Ordering::Relaxed)))
            .collect())
    }
}

fn zeroed_slice(cells: usize) -> WaveResult<Box<[AtomicU32]>> {
    let mut slice = Vec::new();
    slice
        .try_reserve_exact(cells)
        .map_err(|_| WaveError::Allocation { cells })?;
    // 0.0f32 is the all-zero bit pattern
    slice.extend((0..cells).map(|_| AtomicU32::new(0)));
    Ok(slice.into_boxed_slice())
}

impl fmt::Debug for WaveGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveGrid")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("steps", &self.steps)
            .field("threads", &self.threads)
            .field("storage", &self.storage)
            .field("latest", &self.latest_step())
            .finish()
    }
}

// Dumps every retained step
impl fmt::Display for WaveGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in self.retained_steps() {
            writeln!(f, "Step:{}", step)?;
            for row in 0..self.rows {
                for col in 0..self.cols {
                    write!(f, "{:09.4}   ", self.cell(step, row, col))?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
