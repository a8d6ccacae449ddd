use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{WaveError, WaveResult};
use crate::grid::{Storage, ROLLING_SLOTS};
use crate::stencil::Stencil;

/// Coefficient of the reference solver, `0.0025`, bit for bit.
pub const REFERENCE_COEFFICIENT: f32 = 0.0025;

/// Physical parameters of the wave equation.
///
/// `pd` pins the update coefficient directly. When it is `None` the
/// coefficient is derived from `c`, `dt` and `dx`; that derivation rounds in
/// `f32`, so `(1.0, 0.1, 2.0)` lands one ulp above `0.0025`. The default keeps
/// `pd` pinned to [`REFERENCE_COEFFICIENT`]. A `[physics]` table in a config
/// file that omits `pd` derives it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Wave speed `c`.
    #[serde(default = "default_wave_speed")]
    pub wave_speed: f32,
    /// Time step `dt`.
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    /// Spatial step `dx`.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Explicit `pd`, overriding the derived value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pd: Option<f32>,
}

fn default_wave_speed() -> f32 {
    1.0
}

fn default_time_step() -> f32 {
    0.1
}

fn default_cell_size() -> f32 {
    2.0
}

impl Default for Physics {
    fn default() -> Self {
        Physics {
            wave_speed: default_wave_speed(),
            time_step: default_time_step(),
            cell_size: default_cell_size(),
            pd: Some(REFERENCE_COEFFICIENT),
        }
    }
}

impl Physics {
    /// Parameters that derive `pd` from `c`, `dt` and `dx`.
    pub fn derived(wave_speed: f32, time_step: f32, cell_size: f32) -> Self {
        Physics {
            wave_speed,
            time_step,
            cell_size,
            pd: None,
        }
    }

    /// The explicit `pd` if set, else `c^2 * (dt/dx)^2`.
    pub fn coefficient(&self) -> f32 {
        match self.pd {
            Some(pd) => pd,
            None => {
                let ratio = self.time_step / self.cell_size;
                (self.wave_speed * self.wave_speed) * (ratio * ratio)
            }
        }
    }

    /// Courant number `c * dt / dx`, or `sqrt(pd)` when `pd` is explicit.
    pub fn courant_number(&self) -> f32 {
        match self.pd {
            Some(pd) => pd.sqrt(),
            None => self.wave_speed * self.time_step / self.cell_size,
        }
    }

    /// CFL condition for the 2D explicit scheme: `c * dt / dx <= 1/sqrt(2)`.
    pub fn is_stable(&self) -> bool {
        self.courant_number() <= std::f32::consts::FRAC_1_SQRT_2
    }

    fn validate(&self) -> WaveResult<()> {
        if !(self.wave_speed > 0.0 && self.time_step > 0.0 && self.cell_size > 0.0) {
            return Err(WaveError::Config(format!(
                "physical parameters must be positive (c={}, dt={}, dx={})",
                self.wave_speed, self.time_step, self.cell_size
            )));
        }
        if let Some(pd) = self.pd {
            if !(pd > 0.0 && pd.is_finite()) {
                return Err(WaveError::Config(format!("pd must be positive, got {}", pd)));
            }
        }
        Ok(())
    }
}

/// Which stepper executes the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// One std::thread per worker.
    #[default]
    Threads,
    /// A dedicated rayon pool sized to the worker count.
    Rayon,
    /// Single-thread oracle; ignores the thread count for execution.
    Sequential,
}

/// Initial displacement of one interior cell at step 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    pub row: usize,
    pub col: usize,
    pub value: f32,
}

impl std::str::FromStr for Impulse {
    type Err = String;

    /// Parses `row,col,value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected row,col,value, got '{}'", s));
        }
        let row = parts[0]
            .parse::<usize>()
            .map_err(|e| format!("invalid row '{}': {}", parts[0], e))?;
        let col = parts[1]
            .parse::<usize>()
            .map_err(|e| format!("invalid column '{}': {}", parts[1], e))?;
        let value = parts[2]
            .parse::<f32>()
            .map_err(|e| format!("invalid value '{}': {}", parts[2], e))?;
        Ok(Impulse { row, col, value })
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid edge length `N`; the grid is `N x N`.
    pub size: usize,
    /// Number of time steps `T`, including the initial step 0.
    pub steps: usize,
    /// Number of worker threads `H`.
    pub threads: usize,
    /// File receiving the persisted step.
    pub output: PathBuf,
    /// Step `S` to persist; nothing is written when `S > T`.
    pub output_step: usize,
    #[serde(default)]
    pub physics: Physics,
    #[serde(default)]
    pub stencil: Stencil,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub impulses: Vec<Impulse>,
}

impl SimulationConfig {
    pub fn new(size: usize, steps: usize, threads: usize, output: PathBuf, output_step: usize) -> Self {
        SimulationConfig {
            size,
            steps,
            threads,
            output,
            output_step,
            physics: Physics::default(),
            stencil: Stencil::default(),
            storage: Storage::default(),
            backend: Backend::default(),
            impulses: Vec::new(),
        }
    }

    /// Loads and validates a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> WaveResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: SimulationConfig = toml::from_str(&content).map_err(|e| {
            WaveError::Config(format!("failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WaveResult<()> {
        if self.size < 3 {
            return Err(WaveError::GridTooSmall {
                rows: self.size,
                cols: self.size,
            });
        }
        if self.steps == 0 {
            return Err(WaveError::NoSteps);
        }
        if self.threads == 0 {
            return Err(WaveError::NoThreads);
        }
        self.physics.validate()?;

        for impulse in &self.impulses {
            if impulse.row >= self.size || impulse.col >= self.size {
                return Err(WaveError::OutOfBounds {
                    step: 0,
                    row: impulse.row,
                    col: impulse.col,
                    rows: self.size,
                    cols: self.size,
                    steps: self.steps,
                });
            }
            if impulse.row == 0
                || impulse.col == 0
                || impulse.row == self.size - 1
                || impulse.col == self.size - 1
            {
                return Err(WaveError::BorderCell {
                    row: impulse.row,
                    col: impulse.col,
                });
            }
        }

        if self.storage == Storage::Rolling && self.output_step < self.steps {
            let oldest = self.steps.saturating_sub(ROLLING_SLOTS);
            if self.output_step < oldest {
                return Err(WaveError::StepNotRetained {
                    step: self.output_step,
                    oldest,
                });
            }
        }

        if !self.physics.is_stable() {
            warn!(
                courant = self.physics.courant_number(),
                "parameters violate the CFL condition, the scheme may diverge"
            );
        }
        Ok(())
    }
}
