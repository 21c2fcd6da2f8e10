//! The annealing loop.

use std::io::Read;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::AnnealingConfig;
use crate::dataset::{ProblemInput, VertexDataset};
use crate::deadline::DeadlineMonitor;
use crate::error::Result;
use crate::moves::MoveGenerator;
use crate::tour::Tour;

// Offsets the seed of the acceptance stream from the move stream.
const ACCEPTANCE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The temperature reached the configured floor.
    CoolingFloorReached,
    /// The wall-clock budget ran out. The committed tour is still valid.
    DeadlineExceeded,
    /// Fewer than two vertices; there is nothing to swap.
    Trivial,
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Stopped(StopReason),
}

/// Summary of a finished (or interrupted) run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealReport {
    /// Why the run ended; `None` while the engine is still running.
    pub reason: Option<StopReason>,

    /// Length of the committed tour.
    pub best_length: f64,

    /// Total iterations (one swap each).
    pub iterations: usize,

    /// Accepted moves, including improvements.
    pub accepted_moves: usize,

    /// Accepted moves that strictly shortened the tour.
    pub improving_moves: usize,

    /// Moves undone after rejection.
    pub rejected_moves: usize,

    /// Times the stagnation counter ran out.
    pub restart_episodes: usize,

    /// Restart episodes that found a shuffle shorter than the committed tour.
    pub restarts_adopted: usize,

    /// Temperature when the report was taken.
    pub final_temperature: f64,

    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    iterations: usize,
    accepted: usize,
    improving: usize,
    rejected: usize,
    restart_episodes: usize,
    restarts_adopted: usize,
}

/// Simulated annealing over tours of a [`VertexDataset`].
///
/// The engine owns a *committed* tour (the result) and a *working* tour
/// that is perturbed every iteration. An accepted move copies the working
/// tour into the committed one; a rejected move is undone on the working
/// tour by swapping the same positions back.
///
/// # Examples
///
/// ```
/// use tsp_anneal::anneal::{AnnealingConfig, AnnealingEngine, StopReason};
/// use tsp_anneal::dataset::ProblemInput;
///
/// let input = ProblemInput::parse("4\n1 0 0\n2 0 1\n3 1 1\n4 1 0\n5").unwrap();
/// let config = AnnealingConfig::default().with_seed(7);
/// let mut engine = AnnealingEngine::new(input, config).unwrap();
/// let report = engine.run().unwrap();
///
/// assert_eq!(report.reason, Some(StopReason::CoolingFloorReached));
/// assert!(engine.best().length() >= 4.0 - 1e-9);
/// ```
#[derive(Debug)]
pub struct AnnealingEngine {
    dataset: VertexDataset,
    config: AnnealingConfig,
    committed: Tour,
    working: Tour,
    moves: MoveGenerator,
    rng: StdRng,
    deadline: DeadlineMonitor,
    temperature: f64,
    stagnation: usize,
    shuffle_swaps: usize,
    state: EngineState,
    counters: Counters,
}

impl AnnealingEngine {
    /// Builds the dataset and seeds the committed tour with `(2n)/3` random
    /// swaps of the canonical order.
    pub fn new(input: ProblemInput, config: AnnealingConfig) -> Result<Self> {
        config.validate()?;
        let dataset = VertexDataset::new(input, config.distance)?;
        let n = dataset.vertex_count();
        let deadline = DeadlineMonitor::from_secs(dataset.time_budget_secs())?;
        let mut moves = MoveGenerator::new(n, config.seed)?;

        let shuffle_swaps = (2 * n) / 3;
        let committed = if n < 2 {
            Tour::canonical(&dataset)
        } else {
            moves.random_shuffle(&dataset, shuffle_swaps)?
        };
        let working = committed.clone();

        let rng = StdRng::seed_from_u64(
            config
                .seed
                .map(|s| s ^ ACCEPTANCE_STREAM)
                .unwrap_or_else(rand::random),
        );

        log::debug!(
            "engine: n={n} budget_s={} initial_len={:.3} shuffle_swaps={shuffle_swaps}",
            dataset.time_budget_secs(),
            committed.length(),
        );

        Ok(Self {
            temperature: config.initial_temperature,
            stagnation: config.stagnation_reset,
            dataset,
            config,
            committed,
            working,
            moves,
            rng,
            deadline,
            shuffle_swaps,
            state: EngineState::Running,
            counters: Counters::default(),
        })
    }

    /// Parses problem text from `reader` and builds an engine.
    pub fn from_reader<R: Read>(reader: R, config: AnnealingConfig) -> Result<Self> {
        Self::new(ProblemInput::from_reader(reader)?, config)
    }

    /// Replaces the budget read from the input.
    pub fn with_time_budget(mut self, budget: Duration) -> Result<Self> {
        self.deadline = DeadlineMonitor::new(budget)?;
        Ok(self)
    }

    /// The committed tour: the best state accepted so far.
    pub fn best(&self) -> &Tour {
        &self.committed
    }

    pub fn into_best(self) -> Tour {
        self.committed
    }

    pub fn dataset(&self) -> &VertexDataset {
        &self.dataset
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Runs until the temperature floor or the deadline.
    ///
    /// Calling `run` on a stopped engine returns the same report again.
    pub fn run(&mut self) -> Result<AnnealReport> {
        if self.state != EngineState::Running {
            return Ok(self.report());
        }
        log::info!(
            "anneal: start n={} t0={:e} t_min={:e} factor={} budget_s={}",
            self.dataset.vertex_count(),
            self.temperature,
            self.config.min_temperature,
            self.config.cooling_factor,
            self.deadline.budget().as_secs_f64(),
        );

        while self.step()? == EngineState::Running {}

        let report = self.report();
        log::info!(
            "anneal: stop reason={:?} len={:.3} iters={} accepted={} improving={} restarts={}/{} elapsed_ms={}",
            report.reason,
            report.best_length,
            report.iterations,
            report.accepted_moves,
            report.improving_moves,
            report.restarts_adopted,
            report.restart_episodes,
            report.elapsed.as_millis(),
        );
        Ok(report)
    }

    /// Performs one iteration and returns the resulting state.
    ///
    /// The deadline is armed on the first call. A stopped engine is left
    /// untouched.
    pub fn step(&mut self) -> Result<EngineState> {
        if self.state != EngineState::Running {
            return Ok(self.state);
        }
        self.deadline.start();

        if self.dataset.vertex_count() < 2 {
            self.state = EngineState::Stopped(StopReason::Trivial);
            return Ok(self.state);
        }

        if self.stagnation == 0 {
            self.restart()?;
            self.stagnation = self.config.stagnation_reset;
        }

        let (a, b) = self.moves.random_swap(&self.dataset, &mut self.working)?;
        let new_len = self.working.length();
        let old_len = self.committed.length();
        self.counters.iterations += 1;

        let improving = new_len < old_len;
        let accept = improving
            || self.rng.random::<f64>()
                < (self.config.acceptance)(new_len, old_len, self.temperature);

        if accept {
            self.committed.clone_from(&self.working);
            self.counters.accepted += 1;
            if improving {
                self.counters.improving += 1;
            }
            let change = if old_len > 0.0 {
                ((old_len - new_len) / old_len).abs()
            } else {
                0.0
            };
            if change < self.config.stagnation_threshold {
                self.stagnation = self.stagnation.saturating_sub(1);
            }
        } else {
            self.working.swap(&self.dataset, a, b)?;
            self.counters.rejected += 1;
            self.stagnation = self.stagnation.saturating_sub(1);
        }

        self.temperature *= self.config.cooling_factor;
        log::trace!(
            "iter={} t={:e} new={new_len:.3} old={old_len:.3} accepted={accept}",
            self.counters.iterations,
            self.temperature,
        );

        if self.deadline.is_expired() {
            self.state = EngineState::Stopped(StopReason::DeadlineExceeded);
        } else if self.temperature <= self.config.min_temperature {
            self.state = EngineState::Stopped(StopReason::CoolingFloorReached);
        }
        Ok(self.state)
    }

    /// Tries fresh shuffles; the first one shorter than the committed tour
    /// becomes the working tour.
    fn restart(&mut self) -> Result<()> {
        self.counters.restart_episodes += 1;
        let best = self.committed.length();
        for attempt in 1..=self.config.restart_attempts {
            let candidate = self.moves.random_shuffle(&self.dataset, self.shuffle_swaps)?;
            if candidate.length() < best {
                log::debug!(
                    "restart: adopted shuffle {attempt} len={:.3} < {best:.3}",
                    candidate.length()
                );
                self.working = candidate;
                self.counters.restarts_adopted += 1;
                return Ok(());
            }
        }
        log::debug!(
            "restart: no shuffle beat {best:.3} in {} attempts",
            self.config.restart_attempts
        );
        Ok(())
    }

    /// Snapshot of the run so far.
    pub fn report(&self) -> AnnealReport {
        let reason = match self.state {
            EngineState::Running => None,
            EngineState::Stopped(reason) => Some(reason),
        };
        AnnealReport {
            reason,
            best_length: self.committed.length(),
            iterations: self.counters.iterations,
            accepted_moves: self.counters.accepted,
            improving_moves: self.counters.improving,
            rejected_moves: self.counters.rejected,
            restart_episodes: self.counters.restart_episodes,
            restarts_adopted: self.counters.restarts_adopted,
            final_temperature: self.temperature,
            elapsed: self.deadline.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anneal::cooling_steps;
    use crate::dataset::Point;
    use std::time::Instant;

    const SQUARE: &str = "4\n1 0 0\n2 0 1\n3 1 1\n4 1 0\n5\n";

    fn scattered(n: usize, seed: u64, budget_secs: u64) -> ProblemInput {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..n)
            .map(|_| Point::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)))
            .collect();
        ProblemInput::new(points, budget_secs).unwrap()
    }

    fn assert_valid(engine: &AnnealingEngine) {
        let tour = engine.best();
        let n = engine.dataset().vertex_count();
        let mut seen: Vec<usize> = tour.vertices().collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=n).collect::<Vec<_>>());
        let brute = tour.recompute_length(engine.dataset());
        assert!(
            (tour.length() - brute).abs() < 1e-6 * (1.0 + brute),
            "cached {} vs recomputed {}",
            tour.length(),
            brute
        );
    }

    #[test]
    fn test_construction_shuffles_committed_tour() {
        let engine = AnnealingEngine::new(scattered(30, 1, 5), AnnealingConfig::default().with_seed(3))
            .unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_ne!(
            engine.best().vertices().collect::<Vec<_>>(),
            (1..=30).collect::<Vec<_>>()
        );
        assert_valid(&engine);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let input = ProblemInput::parse(SQUARE).unwrap();
        let config = AnnealingConfig::default().with_cooling_factor(1.2);
        assert!(matches!(
            AnnealingEngine::new(input, config),
            Err(crate::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cooling_floor_step_count() {
        let config = AnnealingConfig::default()
            .with_initial_temperature(100.0)
            .with_min_temperature(1.0)
            .with_cooling_factor(0.9)
            .with_seed(42);
        let mut engine = AnnealingEngine::new(scattered(20, 2, 60), config).unwrap();

        let mut last = engine.temperature();
        while engine.step().unwrap() == EngineState::Running {
            assert!(engine.temperature() < last);
            last = engine.temperature();
        }
        let report = engine.report();
        assert_eq!(report.reason, Some(StopReason::CoolingFloorReached));
        assert_eq!(Some(report.iterations), cooling_steps(100.0, 1.0, 0.9));
        assert_eq!(report.iterations, 44);
        assert!(report.final_temperature <= 1.0);
        assert_eq!(
            report.accepted_moves + report.rejected_moves,
            report.iterations
        );
    }

    #[test]
    fn test_zero_acceptance_only_improves() {
        let config = AnnealingConfig::default()
            .with_acceptance(|_, _, _| 0.0)
            .with_seed(5);
        let mut engine = AnnealingEngine::new(scattered(40, 4, 60), config).unwrap();

        let mut last = engine.best().length();
        while engine.step().unwrap() == EngineState::Running {
            let current = engine.best().length();
            assert!(current <= last, "committed length rose from {last} to {current}");
            last = current;
        }
        let report = engine.report();
        assert_eq!(report.accepted_moves, report.improving_moves);
        assert_valid(&engine);
    }

    #[test]
    fn test_always_accept_commits_every_move() {
        let config = AnnealingConfig::default()
            .with_acceptance(|_, _, _| 1.0)
            .with_initial_temperature(10.0)
            .with_min_temperature(1.0)
            .with_cooling_factor(0.99)
            .with_seed(8);
        let mut engine = AnnealingEngine::new(scattered(25, 5, 60), config).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.rejected_moves, 0);
        assert_eq!(report.accepted_moves, report.iterations);
        assert_valid(&engine);
    }

    #[test]
    fn test_deadline_stops_run() {
        let config = AnnealingConfig::default()
            .with_cooling_factor(0.999_999_999)
            .with_seed(13);
        let mut engine = AnnealingEngine::new(scattered(300, 6, 60), config)
            .unwrap()
            .with_time_budget(Duration::from_millis(200))
            .unwrap();

        let started = Instant::now();
        let report = engine.run().unwrap();
        let wall = started.elapsed();

        assert_eq!(report.reason, Some(StopReason::DeadlineExceeded));
        assert!(wall < Duration::from_millis(1200), "run took {wall:?}");
        assert!(report.elapsed >= Duration::from_millis(200));
        assert_valid(&engine);
    }

    #[test]
    fn test_stopped_engine_is_terminal() {
        let config = AnnealingConfig::default()
            .with_initial_temperature(10.0)
            .with_min_temperature(1.0)
            .with_cooling_factor(0.5)
            .with_seed(1);
        let mut engine = AnnealingEngine::new(scattered(10, 7, 60), config).unwrap();
        let first = engine.run().unwrap();
        let order: Vec<usize> = engine.best().vertices().collect();

        assert_eq!(
            engine.step().unwrap(),
            EngineState::Stopped(StopReason::CoolingFloorReached)
        );
        let second = engine.run().unwrap();
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(engine.best().vertices().collect::<Vec<_>>(), order);
    }

    #[test]
    fn test_single_vertex_stops_immediately() {
        let input = ProblemInput::parse("1\n1 5 5\n3").unwrap();
        let mut engine = AnnealingEngine::new(input, AnnealingConfig::default()).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.reason, Some(StopReason::Trivial));
        assert_eq!(report.iterations, 0);
        assert_eq!(engine.best().length(), 0.0);
        assert_eq!(engine.best().starting_from(1).unwrap(), vec![1]);
    }

    #[test]
    fn test_two_vertices() {
        let input = ProblemInput::parse("2\n1 0 0\n2 3 4\n3").unwrap();
        let mut engine =
            AnnealingEngine::new(input, AnnealingConfig::default().with_seed(2)).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.reason, Some(StopReason::CoolingFloorReached));
        assert!((engine.best().length() - 10.0).abs() < 1e-9);
        assert_valid(&engine);
    }

    #[test]
    fn test_restart_episodes_happen() {
        let config = AnnealingConfig::default()
            .with_stagnation_reset(1)
            .with_restart_attempts(3)
            .with_seed(17);
        let mut engine = AnnealingEngine::new(scattered(15, 9, 60), config).unwrap();
        let report = engine.run().unwrap();
        assert!(report.restart_episodes > 0);
        assert!(report.restarts_adopted <= report.restart_episodes);
        assert_valid(&engine);
    }

    #[test]
    fn test_no_restart_attempts() {
        let config = AnnealingConfig::default()
            .with_stagnation_reset(1)
            .with_restart_attempts(0)
            .with_seed(19);
        let mut engine = AnnealingEngine::new(scattered(12, 10, 60), config).unwrap();
        let report = engine.run().unwrap();
        assert!(report.restart_episodes > 0);
        assert_eq!(report.restarts_adopted, 0);
    }

    #[test]
    fn test_zero_threshold_never_stagnates_on_accepted_moves() {
        let config = AnnealingConfig::default()
            .with_acceptance(|_, _, _| 1.0)
            .with_stagnation_threshold(0.0)
            .with_stagnation_reset(1)
            .with_initial_temperature(10.0)
            .with_min_temperature(1.0)
            .with_cooling_factor(0.99)
            .with_seed(31);
        let mut engine = AnnealingEngine::new(scattered(20, 12, 60), config).unwrap();
        let report = engine.run().unwrap();
        assert!(report.iterations > 100);
        assert_eq!(report.rejected_moves, 0);
        assert_eq!(report.restart_episodes, 0, "accepted moves counted as stagnation");
    }

    #[test]
    fn test_restart_fires_after_reset_iterations() {
        let reset = 5;
        let config = AnnealingConfig::default()
            .with_acceptance(|_, _, _| 1.0)
            .with_stagnation_threshold(1e9)
            .with_stagnation_reset(reset)
            .with_seed(37);
        let mut engine = AnnealingEngine::new(scattered(20, 13, 60), config).unwrap();

        // Every accepted move is below the threshold, so the counter runs out
        // after `reset` iterations and the next iteration restarts first.
        for i in 1..=6 * reset {
            assert_eq!(engine.step().unwrap(), EngineState::Running);
            assert_eq!(
                engine.report().restart_episodes,
                (i - 1) / reset,
                "wrong episode count after {i} iterations"
            );
        }
    }

    #[test]
    fn test_restart_adopts_only_shorter_shuffles() {
        let config = AnnealingConfig::default()
            .with_restart_attempts(20)
            .with_seed(41);
        let mut engine = AnnealingEngine::from_reader(SQUARE.as_bytes(), config).unwrap();

        // 1-3-2-4 crosses itself; only the perimeter (length 4) is shorter.
        let mut crossing = Tour::canonical(engine.dataset());
        crossing.swap(engine.dataset(), 1, 2).unwrap();
        assert!((crossing.length() - (2.0 + 2.0 * 2f64.sqrt())).abs() < 1e-9);
        engine.committed = crossing.clone();

        for _ in 0..10 {
            engine.working = crossing.clone();
            let adopted_before = engine.counters.restarts_adopted;
            engine.restart().unwrap();
            if engine.counters.restarts_adopted > adopted_before {
                assert!(
                    engine.working.length() < engine.committed.length(),
                    "adopted {} against committed {}",
                    engine.working.length(),
                    engine.committed.length()
                );
            } else {
                assert_eq!(
                    engine.working.vertices().collect::<Vec<_>>(),
                    crossing.vertices().collect::<Vec<_>>()
                );
            }
            assert_eq!(
                engine.committed.vertices().collect::<Vec<_>>(),
                crossing.vertices().collect::<Vec<_>>()
            );
        }
        assert_eq!(engine.counters.restart_episodes, 10);
        assert!(engine.counters.restarts_adopted > 0, "no shuffle found the perimeter");

        // Nothing beats the perimeter, so it is never replaced.
        let perimeter = Tour::canonical(engine.dataset());
        engine.committed = perimeter.clone();
        engine.working = perimeter.clone();
        let adopted_before = engine.counters.restarts_adopted;
        for _ in 0..10 {
            engine.restart().unwrap();
        }
        assert_eq!(engine.counters.restarts_adopted, adopted_before);
        assert_eq!(
            engine.working.vertices().collect::<Vec<_>>(),
            perimeter.vertices().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_cooling_floor_inexact_boundary() {
        let config = AnnealingConfig::default()
            .with_initial_temperature(1.0)
            .with_min_temperature(0.001)
            .with_cooling_factor(0.1)
            .with_seed(43);
        let mut engine = AnnealingEngine::new(scattered(10, 14, 60), config).unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.reason, Some(StopReason::CoolingFloorReached));
        assert_eq!(report.iterations, 4);
        assert_eq!(Some(report.iterations), cooling_steps(1.0, 0.001, 0.1));
    }

    #[test]
    fn test_rerun_of_stopped_engine_logs_nothing() {
        let config = AnnealingConfig::default()
            .with_initial_temperature(10.0)
            .with_min_temperature(1.0)
            .with_cooling_factor(0.5)
            .with_seed(47);
        let mut engine = AnnealingEngine::new(scattered(10, 15, 60), config).unwrap();

        let lines = capture::lines_on_this_thread(|| {
            engine.run().unwrap();
        });
        assert_eq!(lines.iter().filter(|l| l.starts_with("anneal: start")).count(), 1);
        assert_eq!(lines.iter().filter(|l| l.starts_with("anneal: stop")).count(), 1);

        let lines = capture::lines_on_this_thread(|| {
            engine.run().unwrap();
        });
        assert!(lines.is_empty(), "stopped engine logged {lines:?}");
    }

    mod capture {
        use std::sync::{Mutex, Once};
        use std::thread::{self, ThreadId};

        use log::{Level, LevelFilter, Log, Metadata, Record};

        static RECORDS: Mutex<Vec<(ThreadId, String)>> = Mutex::new(Vec::new());
        static INSTALL: Once = Once::new();

        struct Capture;

        impl Log for Capture {
            fn enabled(&self, metadata: &Metadata) -> bool {
                metadata.level() <= Level::Info
            }

            fn log(&self, record: &Record) {
                if self.enabled(record.metadata()) {
                    RECORDS
                        .lock()
                        .unwrap()
                        .push((thread::current().id(), record.args().to_string()));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: Capture = Capture;

        /// Info-level messages logged by the current thread while `f` runs.
        pub fn lines_on_this_thread(f: impl FnOnce()) -> Vec<String> {
            INSTALL.call_once(|| {
                log::set_logger(&LOGGER).unwrap();
                log::set_max_level(LevelFilter::Info);
            });
            let me = thread::current().id();
            RECORDS.lock().unwrap().retain(|(id, _)| *id != me);
            f();
            RECORDS
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| *id == me)
                .map(|(_, line)| line.clone())
                .collect()
        }
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let run = |seed| {
            let config = AnnealingConfig::default().with_seed(seed);
            let mut engine = AnnealingEngine::new(scattered(50, 11, 60), config).unwrap();
            let report = engine.run().unwrap();
            (report.iterations, engine.into_best().vertices().collect::<Vec<_>>())
        };
        assert_eq!(run(23), run(23));
    }

    #[test]
    fn test_report_while_running() {
        let engine = AnnealingEngine::from_reader(SQUARE.as_bytes(), AnnealingConfig::default())
            .unwrap();
        let report = engine.report();
        assert_eq!(report.reason, None);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.elapsed, Duration::ZERO);
    }
}
