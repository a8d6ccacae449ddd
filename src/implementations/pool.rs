use std::sync::Arc;

use rayon::ThreadPoolBuilder;

use crate::error::WaveResult;
use crate::implementations::worker::{RunContext, Worker, WorkerReport};

/*
  Fixed rayon pool variant.

  The pool is built with exactly one thread per worker and `broadcast` runs
  the worker loop once on each of them, so the static partition and the
  per-step barriers are kept as they are. Nothing is left for the pool to
  steal: every pool thread is busy with its own worker until the last barrier.
*/
pub fn rayon_parallel(context: &Arc<RunContext>) -> WaveResult<Vec<WorkerReport>> {
    let threads = context.assignment().worker_count();
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("wave-pool-{}", index))
        .build()?;

    Ok(pool.broadcast(|ctx| Worker::new(ctx.index(), Arc::clone(context)).run()))
}
