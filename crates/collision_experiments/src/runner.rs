//! Parallel Monte Carlo execution using rayon.
//!
//! A run has two phases on a fixed-size pool. Phase 1 builds the receiver
//! population, one contiguous share per worker. Phase 2 runs the disclosure
//! trials against the finished, read-only population. Each worker returns
//! its own traces or totals and the runner merges them after the phase; the
//! first worker error cancels its siblings and is returned to the caller.

use std::sync::atomic::{AtomicBool, Ordering};

use collision_core::codes::generate;
use collision_core::detector::count_population_collisions;
use collision_core::{CollisionCount, ReceptionTrace, SimulationConfig, SimulationError};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::metrics::SimulationReport;
use crate::partition::{plan_worker_shares, realized_total, WorkerTask};
use crate::progress::{ProgressObserver, TrialProgress};

/// Worker-pool size when none is configured.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub workers: usize,
    /// Fixed seed for a reproducible run; `None` seeds every worker from the OS.
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_POOL_SIZE,
            seed: None,
        }
    }
}

impl RunOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The phase a worker's random source is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Population,
    Disclosures,
}

impl Phase {
    fn seed_offset(self) -> u64 {
        match self {
            Phase::Population => 1 << 32,
            Phase::Disclosures => 2 << 32,
        }
    }
}

/// Hands each worker its own random source at the start of a phase.
pub trait WorkerRngSource: Sync {
    type Rng: RngCore;

    fn worker_rng(&self, phase: Phase, worker_id: usize) -> Result<Self::Rng, SimulationError>;
}

/// One `StdRng` per worker and phase, seeded from `seed` or from the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeededRngSource {
    pub seed: Option<u64>,
}

impl WorkerRngSource for SeededRngSource {
    type Rng = StdRng;

    fn worker_rng(&self, phase: Phase, worker_id: usize) -> Result<StdRng, SimulationError> {
        match self.seed {
            Some(seed) => Ok(StdRng::seed_from_u64(
                seed.wrapping_add(phase.seed_offset())
                    .wrapping_add(worker_id as u64),
            )),
            None => Ok(StdRng::from_rng(OsRng)?),
        }
    }
}

pub struct MonteCarloRunner<S = SeededRngSource> {
    pool: ThreadPool,
    workers: usize,
    rng_source: S,
}

impl MonteCarloRunner {
    pub fn new(options: RunOptions) -> Result<Self, SimulationError> {
        Self::with_rng_source(options.workers, SeededRngSource { seed: options.seed })
    }
}

impl<S: WorkerRngSource> MonteCarloRunner<S> {
    /// A runner on `workers` threads whose workers draw from `rng_source`.
    pub fn with_rng_source(workers: usize, rng_source: S) -> Result<Self, SimulationError> {
        if workers == 0 {
            return Err(SimulationError::InvalidConfig(
                "worker pool must contain at least one worker".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("collision-worker-{index}"))
            .build()
            .map_err(|error| SimulationError::WorkerPool(error.to_string()))?;

        Ok(Self {
            pool,
            workers,
            rng_source,
        })
    }

    /// Run both phases and report the aggregate totals.
    pub fn run(
        &self,
        config: &SimulationConfig,
        observer: &dyn ProgressObserver,
    ) -> Result<SimulationReport, SimulationError> {
        let population = self.build_population(config, observer)?;
        let (disclosures, totals) = self.run_disclosures(&population, config, observer)?;
        let report = SimulationReport::new(population.len(), disclosures, totals);

        info!(
            receivers = report.receivers,
            disclosures = report.disclosures,
            collisions = report.collisions,
            matches = report.matches,
            "simulation finished"
        );
        Ok(report)
    }

    /// Phase 1: build `ceil(receivers / workers) * workers` reception traces.
    pub fn build_population(
        &self,
        config: &SimulationConfig,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<ReceptionTrace>, SimulationError> {
        config.validate()?;
        let tasks = plan_worker_shares(config.number_of_receivers, self.workers)?;
        let total = realized_total(config.number_of_receivers, self.workers);

        info!(
            receivers = total,
            workers = self.workers,
            max_transmitters = config.max_transmitters(),
            "building receiver population"
        );
        observer.population_started(total);

        let cancelled = AtomicBool::new(false);
        let shares = self.pool.install(|| {
            tasks
                .par_iter()
                .map(|task| {
                    let share = self.build_population_share(config, *task, observer, &cancelled);
                    if share.is_err() {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    share
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(shares.into_iter().flatten().collect())
    }

    fn build_population_share(
        &self,
        config: &SimulationConfig,
        task: WorkerTask,
        observer: &dyn ProgressObserver,
        cancelled: &AtomicBool,
    ) -> Result<Vec<ReceptionTrace>, SimulationError> {
        let mut rng = self
            .rng_source
            .worker_rng(Phase::Population, task.worker_id)?;
        let model = config.reception_model();
        let mut traces = Vec::with_capacity(task.len());

        for built in 1..=task.len() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            traces.push(model.simulate(&mut rng)?);
            observer.receiver_built(task.worker_id, built, task.len());
        }

        debug!(
            worker_id = task.worker_id,
            built = traces.len(),
            "population share finished"
        );
        Ok(traces)
    }

    /// Phase 2: run `ceil(disclosures / workers) * workers` trials against
    /// `population`. Returns the trial count and the summed totals.
    pub fn run_disclosures(
        &self,
        population: &[ReceptionTrace],
        config: &SimulationConfig,
        observer: &dyn ProgressObserver,
    ) -> Result<(usize, CollisionCount), SimulationError> {
        let tasks = plan_worker_shares(config.number_of_disclosures, self.workers)?;
        let total = realized_total(config.number_of_disclosures, self.workers);

        info!(
            disclosures = total,
            receivers = population.len(),
            matches_needed = config.matches_needed,
            cluster_slices = config.cluster_slices,
            "starting disclosure simulation"
        );
        observer.trials_started(total);

        let cancelled = AtomicBool::new(false);
        let per_worker = self.pool.install(|| {
            tasks
                .par_iter()
                .map(|task| {
                    let totals =
                        self.run_disclosure_share(population, config, *task, observer, &cancelled);
                    if totals.is_err() {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    totals
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok((total, per_worker.into_iter().sum()))
    }

    fn run_disclosure_share(
        &self,
        population: &[ReceptionTrace],
        config: &SimulationConfig,
        task: WorkerTask,
        observer: &dyn ProgressObserver,
        cancelled: &AtomicBool,
    ) -> Result<CollisionCount, SimulationError> {
        let mut rng = self
            .rng_source
            .worker_rng(Phase::Disclosures, task.worker_id)?;
        let rule = config.cluster_rule();
        let mut running = CollisionCount::default();

        for trial in 1..=task.len() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let disclosure = generate(&mut rng, config.epoch_length)?;
            running += count_population_collisions(&disclosure, population, rule);

            observer.trial_completed(&TrialProgress {
                worker_id: task.worker_id,
                trial,
                share: task.len(),
                collisions: running.collisions,
                matches: running.matches,
            });
        }

        debug!(
            worker_id = task.worker_id,
            collisions = running.collisions,
            matches = running.matches,
            "disclosure share finished"
        );
        Ok(running)
    }
}

/// Build a runner for `options` and run `config` to completion.
pub fn run_simulation(
    config: &SimulationConfig,
    options: RunOptions,
    observer: &dyn ProgressObserver,
) -> Result<SimulationReport, SimulationError> {
    MonteCarloRunner::new(options)?.run(config, observer)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::{Duration, Instant};

    use collision_core::codes::SLICES_PER_FRAME;
    use collision_core::test_helpers::{single_slice_trace, ExhaustedRng};

    use super::*;
    use crate::progress::NoProgress;

    #[derive(Default)]
    struct CountingObserver {
        receivers: AtomicUsize,
        trials: AtomicUsize,
    }

    impl ProgressObserver for CountingObserver {
        fn receiver_built(&self, _worker_id: usize, _built: usize, _share: usize) {
            self.receivers.fetch_add(1, Ordering::Relaxed);
        }

        fn trial_completed(&self, _progress: &TrialProgress) {
            self.trials.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Worker 0 draws from an exhausted source during `failing_phase`. The
    /// other workers of that phase are held back until worker 0 has started,
    /// so they only begin after the failure has raised the cancel flag.
    struct FirstWorkerFails {
        failing_phase: Phase,
        seeded: SeededRngSource,
        first_worker_started: AtomicBool,
    }

    impl FirstWorkerFails {
        fn new(failing_phase: Phase) -> Self {
            Self {
                failing_phase,
                seeded: SeededRngSource { seed: Some(9) },
                first_worker_started: AtomicBool::new(false),
            }
        }
    }

    impl WorkerRngSource for FirstWorkerFails {
        type Rng = Box<dyn RngCore>;

        fn worker_rng(&self, phase: Phase, worker_id: usize) -> Result<Self::Rng, SimulationError> {
            if phase != self.failing_phase {
                return Ok(Box::new(self.seeded.worker_rng(phase, worker_id)?));
            }
            if worker_id == 0 {
                self.first_worker_started.store(true, Ordering::SeqCst);
                return Ok(Box::new(ExhaustedRng));
            }

            let deadline = Instant::now() + Duration::from_secs(5);
            while !self.first_worker_started.load(Ordering::SeqCst) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            thread::sleep(Duration::from_millis(100));
            Ok(Box::new(self.seeded.worker_rng(phase, worker_id)?))
        }
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_epoch_length(2)
            .with_receivers(10)
            .with_disclosures(5)
            .with_reception_profile(vec![0.5, 0.8, 1.0])
            .with_max_burst_period(4)
            .with_cluster_rule(1, 4)
    }

    #[test]
    fn population_is_rounded_up_to_pool_multiple() {
        let runner = MonteCarloRunner::new(RunOptions::default().with_seed(1)).unwrap();
        let population = runner.build_population(&small_config(), &NoProgress).unwrap();

        assert_eq!(population.len(), 16);
        assert!(population
            .iter()
            .all(|trace| trace.len() == 2 * SLICES_PER_FRAME));
    }

    #[test]
    fn observer_sees_every_receiver_and_trial() {
        let observer = CountingObserver::default();
        let options = RunOptions::default().with_workers(2).with_seed(3);
        let report = run_simulation(&small_config(), options, &observer).unwrap();

        assert_eq!(report.receivers, 10);
        assert_eq!(report.disclosures, 6);
        assert_eq!(observer.receivers.load(Ordering::Relaxed), 10);
        assert_eq!(observer.trials.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = small_config();
        let options = RunOptions::default().with_workers(4).with_seed(77);

        let runner = MonteCarloRunner::new(options).unwrap();
        let first = runner.build_population(&config, &NoProgress).unwrap();
        let second = runner.build_population(&config, &NoProgress).unwrap();
        assert_eq!(first, second);

        let a = run_simulation(&config, options, &NoProgress).unwrap();
        let b = run_simulation(&config, options, &NoProgress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn planted_disclosure_code_is_counted() {
        let config = small_config().with_disclosures(1).with_epoch_length(1);
        let options = RunOptions::default().with_workers(1).with_seed(5);

        // the single trial draws from worker 0's disclosure stream
        let source = SeededRngSource { seed: options.seed };
        let mut rng = source.worker_rng(Phase::Disclosures, 0).unwrap();
        let disclosure = generate(&mut rng, config.epoch_length).unwrap();
        let population = vec![
            single_slice_trace(SLICES_PER_FRAME, 2, vec![disclosure.codes()[2]]),
            single_slice_trace(SLICES_PER_FRAME, 5, vec![disclosure.codes()[5]]),
        ];

        let runner = MonteCarloRunner::new(options).unwrap();
        let (trials, totals) = runner
            .run_disclosures(&population, &config, &NoProgress)
            .unwrap();

        assert_eq!(trials, 1);
        assert_eq!(
            totals,
            CollisionCount {
                collisions: 2,
                matches: 2
            }
        );
    }

    #[test]
    fn silent_population_never_collides() {
        let config = small_config().with_reception_profile(vec![1.0]);
        let report = run_simulation(&config, RunOptions::default(), &NoProgress).unwrap();

        assert_eq!(report.receivers, 16);
        assert_eq!(report.collisions, 0);
        assert_eq!(report.matches, 0);
    }

    #[test]
    fn empty_profile_aborts_the_run() {
        let config = small_config().with_reception_profile(Vec::new());
        let error = run_simulation(&config, RunOptions::default(), &NoProgress).unwrap_err();
        assert!(matches!(error, SimulationError::InvalidProfile(_)));
    }

    #[test]
    fn empty_pool_is_rejected() {
        let error = MonteCarloRunner::new(RunOptions::default().with_workers(0))
            .err()
            .expect("runner should fail");
        assert!(matches!(error, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn zero_receivers_and_disclosures_finish_empty() {
        let config = small_config().with_receivers(0).with_disclosures(0);
        let report = run_simulation(&config, RunOptions::default(), &NoProgress).unwrap();
        assert_eq!(report.receivers, 0);
        assert_eq!(report.disclosures, 0);
        assert_eq!(report.collisions, 0);
    }

    #[test]
    fn failing_population_worker_cancels_its_siblings() {
        let config = small_config().with_receivers(2_000);
        let source = FirstWorkerFails::new(Phase::Population);
        let runner = MonteCarloRunner::with_rng_source(2, source).unwrap();
        let observer = CountingObserver::default();

        let error = runner.build_population(&config, &observer).unwrap_err();

        assert!(matches!(error, SimulationError::RandomSource(_)));
        // each share holds 1000 receivers; the sibling stops well short of its share
        assert!(observer.receivers.load(Ordering::Relaxed) < 1_000);
    }

    #[test]
    fn failing_disclosure_worker_cancels_its_siblings() {
        let config = small_config().with_disclosures(2_000);
        let source = FirstWorkerFails::new(Phase::Disclosures);
        let runner = MonteCarloRunner::with_rng_source(2, source).unwrap();
        let population = runner.build_population(&config, &NoProgress).unwrap();
        let observer = CountingObserver::default();

        let error = runner
            .run_disclosures(&population, &config, &observer)
            .unwrap_err();

        assert!(matches!(error, SimulationError::RandomSource(_)));
        assert!(observer.trials.load(Ordering::Relaxed) < 1_000);
    }

    #[test]
    fn failing_worker_aborts_the_whole_run() {
        let source = FirstWorkerFails::new(Phase::Disclosures);
        let runner = MonteCarloRunner::with_rng_source(2, source).unwrap();
        let error = runner.run(&small_config(), &NoProgress).unwrap_err();
        assert!(matches!(error, SimulationError::RandomSource(_)));
    }

    #[test]
    fn seeded_source_separates_phases_and_workers() {
        let source = SeededRngSource { seed: Some(1) };
        let mut population = source.worker_rng(Phase::Population, 0).unwrap();
        let mut disclosures = source.worker_rng(Phase::Disclosures, 0).unwrap();
        let mut sibling = source.worker_rng(Phase::Population, 1).unwrap();

        let first = population.next_u64();
        assert_ne!(first, disclosures.next_u64());
        assert_ne!(first, sibling.next_u64());
    }
}
