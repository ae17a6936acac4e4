//! Static division of receivers and disclosures across the worker pool.

use collision_core::SimulationError;

/// One worker's contiguous share of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTask {
    pub worker_id: usize,
    pub start_index: usize,
    pub end_index_exclusive: usize,
}

impl WorkerTask {
    pub fn len(&self) -> usize {
        self.end_index_exclusive - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Items each worker handles: `ceil(total / workers)`.
pub fn share_size(total: usize, workers: usize) -> usize {
    total.div_ceil(workers)
}

/// Items actually processed once `total` is spread over `workers`.
pub fn realized_total(total: usize, workers: usize) -> usize {
    share_size(total, workers) * workers
}

/// Give every worker an equal contiguous share, rounding the total up to a
/// multiple of `workers`.
pub fn plan_worker_shares(
    total: usize,
    workers: usize,
) -> Result<Vec<WorkerTask>, SimulationError> {
    if workers == 0 {
        return Err(SimulationError::InvalidConfig(
            "worker pool must contain at least one worker".to_string(),
        ));
    }

    let share = share_size(total, workers);
    Ok((0..workers)
        .map(|worker_id| WorkerTask {
            worker_id,
            start_index: worker_id * share,
            end_index_exclusive: (worker_id + 1) * share,
        })
        .collect())
}
