use tempfile::TempDir;

use wave_rust::io::load_slice;
use wave_rust::{
    Backend, Impulse, Simulation, SimulationConfig, Stencil, UpdateRule, WaveError, WaveGrid,
    WorkAssignment,
};

const PD: f32 = 0.0025;

fn config(size: usize, steps: usize, threads: usize, backend: Backend) -> SimulationConfig {
    let mut config = SimulationConfig::new(size, steps, threads, "unused.raw".into(), steps - 1);
    config.backend = backend;
    config
}

fn assert_border_untouched(grid: &WaveGrid) {
    let (rows, cols) = (grid.rows(), grid.cols());
    for step in grid.retained_steps() {
        for col in 0..cols {
            assert_eq!(grid.read_cell(step, 0, col).unwrap(), 0.0, "top ({}, {})", step, col);
            assert_eq!(grid.read_cell(step, rows - 1, col).unwrap(), 0.0, "bottom ({}, {})", step, col);
        }
        for row in 0..rows {
            assert_eq!(grid.read_cell(step, row, 0).unwrap(), 0.0, "left ({}, {})", step, row);
            assert_eq!(grid.read_cell(step, row, cols - 1).unwrap(), 0.0, "right ({}, {})", step, row);
        }
    }
}

#[test]
fn test_degenerate_run_stays_zero() {
    let simulation = Simulation::new(&config(5, 3, 2, Backend::Threads)).unwrap();
    let outcome = simulation.run().unwrap();

    for step in 0..3 {
        assert!(
            outcome.grid().slice(step).unwrap().iter().all(|&v| v == 0.0),
            "step {} should be all zero",
            step
        );
    }
    println!("✓ Degenerate run: every cell stays 0.0!");
}

#[test]
fn test_single_impulse_first_step() {
    let mut cfg = config(5, 2, 1, Backend::Threads);
    cfg.impulses.push(Impulse {
        row: 2,
        col: 2,
        value: 100.0,
    });
    let simulation = Simulation::new(&cfg).unwrap();
    assert_eq!(simulation.rule().pd.to_bits(), PD.to_bits());
    let outcome = simulation.run().unwrap();
    let grid = outcome.grid();

    let center = (PD / 2.0) * (0.0 + 0.0 + 0.0 + 0.0 - 4.0 * 100.0) + 100.0;
    assert_eq!(grid.read_cell(1, 2, 2).unwrap(), center);
    for (row, col) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
        assert_eq!(
            grid.read_cell(1, row, col).unwrap(),
            (PD / 2.0) * 100.0,
            "neighbor ({}, {})",
            row,
            col
        );
    }
    for (row, col) in [(1, 1), (1, 3), (3, 1), (3, 3)] {
        assert_eq!(grid.read_cell(1, row, col).unwrap(), 0.0);
    }
    println!("✓ Single impulse: first step matches the starter formula!");
}

#[test]
fn test_default_config_matches_reference_constant_run() {
    let steps = 30;
    let mut cfg = config(9, steps, 2, Backend::Threads);
    cfg.impulses.push(Impulse {
        row: 4,
        col: 4,
        value: 100.0,
    });
    let from_config = Simulation::new(&cfg).unwrap().run().unwrap();

    let mut grid = WaveGrid::new(9, 9, steps, 2).unwrap();
    grid.set_initial(4, 4, 100.0).unwrap();
    let assignment = WorkAssignment::round_robin(9, 9, 2).unwrap();
    let rule = UpdateRule::new(PD, Stencil::Reference);
    let explicit = Simulation::from_parts(grid, assignment, rule, Backend::Threads)
        .unwrap()
        .run()
        .unwrap();

    for step in 0..steps {
        let a = from_config.grid().slice(step).unwrap();
        let b = explicit.grid().slice(step).unwrap();
        assert!(
            a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()),
            "step {} drifts from the 0.0025 run",
            step
        );
    }
}

#[test]
fn test_boundary_conditions() {
    for backend in [Backend::Threads, Backend::Rayon, Backend::Sequential] {
        let mut cfg = config(9, 20, 3, backend);
        cfg.impulses.push(Impulse {
            row: 1,
            col: 1,
            value: 250.0,
        });
        cfg.impulses.push(Impulse {
            row: 4,
            col: 7,
            value: -80.0,
        });
        let outcome = Simulation::new(&cfg).unwrap().run().unwrap();
        assert_border_untouched(outcome.grid());
    }
    println!("✓ Boundary conditions: All boundaries remain 0.0!");
}

#[test]
fn test_each_worker_waits_steps_minus_one_times() {
    for backend in [Backend::Threads, Backend::Rayon] {
        let steps = 9;
        let outcome = Simulation::new(&config(8, steps, 4, backend))
            .unwrap()
            .run()
            .unwrap();

        let reports = outcome.reports();
        assert_eq!(reports.len(), 4);
        for (index, report) in reports.iter().enumerate() {
            assert_eq!(report.worker, index);
            assert_eq!(report.barrier_waits, steps - 1, "{:?} worker {}", backend, index);
            assert_eq!(report.cells, outcome.assignment().worker(index).len());
        }
        assert_eq!(outcome.grid().latest_step(), steps - 1);
    }
}

#[test]
fn test_single_step_run_does_nothing() {
    let mut cfg = config(5, 1, 2, Backend::Threads);
    cfg.output_step = 0;
    cfg.impulses.push(Impulse {
        row: 2,
        col: 3,
        value: 7.0,
    });
    let outcome = Simulation::new(&cfg).unwrap().run().unwrap();

    assert!(outcome.reports().iter().all(|r| r.barrier_waits == 0));
    assert_eq!(outcome.grid().read_cell(0, 2, 3).unwrap(), 7.0);
}

#[test]
fn test_persist_selected_step() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("salida.raw");

    let mut cfg = config(6, 5, 2, Backend::Threads);
    cfg.impulses.push(Impulse {
        row: 3,
        col: 3,
        value: 100.0,
    });
    let outcome = Simulation::new(&cfg).unwrap().run().unwrap();

    assert!(outcome.persist(&path, 3).unwrap());
    let values = load_slice(&path, 6, 6).unwrap();
    assert_eq!(values, outcome.grid().slice(3).unwrap());
    assert!(values.iter().any(|&v| v != 0.0));
}

#[test]
fn test_persist_skips_step_beyond_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("never.raw");

    let outcome = Simulation::new(&config(5, 3, 1, Backend::Threads))
        .unwrap()
        .run()
        .unwrap();

    assert!(!outcome.persist(&path, 4).unwrap());
    assert!(!path.exists());
    // step == steps is past the last stored step
    assert!(matches!(
        outcome.persist(&path, 3),
        Err(WaveError::OutOfBounds { step: 3, .. })
    ));
}

#[test]
fn test_invalid_configuration_is_rejected_before_running() {
    assert!(matches!(
        Simulation::new(&config(2, 3, 1, Backend::Threads)),
        Err(WaveError::GridTooSmall { rows: 2, cols: 2 })
    ));
    assert!(matches!(
        Simulation::new(&config(5, 3, 0, Backend::Threads)),
        Err(WaveError::NoThreads)
    ));
}
