use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, error};

use crate::error::{WaveError, WaveResult};
use crate::implementations::worker::{RunContext, Worker, WorkerReport};

/*
  One std::thread per worker, synchronized by the per-step barriers of the grid.

  - Each thread owns a Worker value (index + shared context), no global state
  - Cells are disjoint between workers, so the grid needs no lock
  - Threads wait behind a start gate until every sibling has been spawned.
    A partially started pool would leave the started workers stuck at the
    first barrier, so on a spawn failure the gates are dropped and the
    started workers return without computing anything.
*/
pub fn barrier_parallel(context: &Arc<RunContext>) -> WaveResult<Vec<WorkerReport>> {
    let threads = context.assignment().worker_count();

    thread::scope(|scope| {
        let mut gates = Vec::with_capacity(threads);
        let mut handles = Vec::with_capacity(threads);

        for index in 0..threads {
            let (go, gate) = mpsc::channel::<()>();
            let worker = Worker::new(index, Arc::clone(context));

            let spawned = thread::Builder::new()
                .name(format!("wave-worker-{}", index))
                .spawn_scoped(scope, move || gate.recv().ok().map(|()| worker.run()));

            match spawned {
                Ok(handle) => {
                    gates.push(go);
                    handles.push(handle);
                }
                Err(source) => {
                    error!(worker = index, %source, "failed to start worker");
                    drop(gates);
                    return Err(WaveError::WorkerSpawn {
                        worker: index,
                        source,
                    });
                }
            }
        }

        debug!(threads, "all workers spawned, opening start gate");
        for go in &gates {
            // a closed gate means the worker already died; join reports it
            let _ = go.send(());
        }

        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| match handle.join() {
                Ok(Some(report)) => Ok(report),
                Ok(None) | Err(_) => Err(WaveError::WorkerPanicked(index)),
            })
            .collect()
    })
}
