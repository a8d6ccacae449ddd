//! 2D wave equation solver using an explicit leapfrog scheme.
//!
//! Interior cells are statically partitioned across a fixed pool of
//! workers which meet at one barrier per time step.

pub mod config;
pub mod error;
pub mod grid;
pub mod implementations;
pub mod io;
pub mod partition;
pub mod simulation;
pub mod stencil;

pub use config::{Backend, Impulse, Physics, SimulationConfig};
pub use error::{WaveError, WaveResult};
pub use grid::{Storage, WaveGrid};
pub use partition::{Cell, WorkAssignment};
pub use simulation::{Outcome, Simulation};
pub use stencil::{Stencil, UpdateRule};
