//! Raw persistence of a single step.
//!
//! A slice is stored as `rows * cols` little-endian `f32` values in
//! row-major order with no header; the dimensions travel out of band.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{WaveError, WaveResult};
use crate::grid::WaveGrid;

/// Writes `field[step]` of `grid` to `path`.
pub fn save_step(grid: &WaveGrid, path: impl AsRef<Path>, step: usize) -> WaveResult<()> {
    let path = path.as_ref();
    let values = grid.slice(step)?;

    let mut writer = BufWriter::new(File::create(path)?);
    for value in &values {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;

    info!(step, path = %path.display(), bytes = values.len() * 4, "saved step");
    Ok(())
}

/// Reads a slice written by [`save_step`].
pub fn load_slice(path: impl AsRef<Path>, rows: usize, cols: usize) -> WaveResult<Vec<f32>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 || bytes.len() / 4 != rows * cols {
        return Err(WaveError::SliceSize {
            found: bytes.len() / 4,
            rows,
            cols,
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_saved_step_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("step0.raw");

        let mut grid = WaveGrid::new(4, 5, 1, 1).unwrap();
        grid.set_initial(1, 3, 42.5).unwrap();
        grid.set_initial(2, 1, -1.25).unwrap();
        save_step(&grid, &path, 0).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 4 * 5 * 4);
        let values = load_slice(&path, 4, 5).unwrap();
        assert_eq!(values, grid.slice(0).unwrap());
        assert_eq!(values[5 + 3], 42.5);
    }

    #[test]
    fn test_load_rejects_wrong_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("step.raw");
        let grid = WaveGrid::new(3, 3, 1, 1).unwrap();
        save_step(&grid, &path, 0).unwrap();

        assert!(matches!(
            load_slice(&path, 4, 4),
            Err(WaveError::SliceSize { found: 9, rows: 4, cols: 4 })
        ));
    }

    #[test]
    fn test_save_rejects_missing_step() {
        let dir = TempDir::new().unwrap();
        let grid = WaveGrid::new(3, 3, 2, 1).unwrap();
        assert!(matches!(
            save_step(&grid, dir.path().join("x.raw"), 2),
            Err(WaveError::OutOfBounds { .. })
        ));
    }
}
