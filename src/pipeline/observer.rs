//! Stage-boundary hooks for the pipeline runner.
//!
//! A [`PipelineObserver`] is told when the run starts, when each component
//! starts and finishes, and when the run ends. The runner always logs
//! through `tracing`; observers are for callers that want the same
//! information as values (progress bars, timing reports, tests).

use std::time::{Duration, Instant};

/// Identity of one scheduled component in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInfo {
    /// Position in the run (0-based).
    pub position: usize,
    /// Selection index in the registry.
    pub index: usize,
    pub name: &'static str,
    pub layer: &'static str,
}

/// Outcome of one component run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: StageInfo,
    pub elapsed: Duration,
    pub succeeded: bool,
}

/// Callbacks invoked by [`Pipeline::run_with_observer`](super::runner::Pipeline::run_with_observer).
///
/// Every method has an empty default body.
pub trait PipelineObserver {
    fn on_pipeline_start(&mut self, _stages: &[StageInfo]) {}

    fn on_stage_start(&mut self, _stage: &StageInfo) {}

    fn on_stage_end(&mut self, _report: &StageReport) {}

    /// Called only when every component succeeded.
    fn on_pipeline_end(&mut self, _completed: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that keeps every [`StageReport`].
#[derive(Debug, Clone, Default)]
pub struct TimingObserver {
    reports: Vec<StageReport>,
}

impl TimingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[StageReport] {
        &self.reports
    }

    /// Sum of all recorded stage durations.
    pub fn total(&self) -> Duration {
        self.reports.iter().map(|r| r.elapsed).sum()
    }
}

impl PipelineObserver for TimingObserver {
    fn on_stage_end(&mut self, report: &StageReport) {
        self.reports.push(report.clone());
    }
}

/// Wall-clock timer for a single stage.
#[derive(Debug, Clone, Copy)]
pub struct StageClock {
    started: Instant,
}

impl StageClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(position: usize) -> StageInfo {
        StageInfo {
            position,
            index: 0,
            name: "CultureRelevanceClassifier",
            layer: "0_culture_relevance_classifier",
        }
    }

    #[test]
    fn test_timing_observer_accumulates() {
        let mut obs = TimingObserver::new();
        for (i, ms) in [5u64, 7].into_iter().enumerate() {
            obs.on_stage_end(&StageReport {
                stage: info(i),
                elapsed: Duration::from_millis(ms),
                succeeded: true,
            });
        }
        assert_eq!(obs.reports().len(), 2);
        assert_eq!(obs.total(), Duration::from_millis(12));
    }

    #[test]
    fn test_stage_clock_is_monotonic() {
        let clock = StageClock::start();
        let first = clock.elapsed();
        assert!(clock.elapsed() >= first);
    }
}
