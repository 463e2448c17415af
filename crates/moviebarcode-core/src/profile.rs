//! Per-run timing of pipeline stages.
//!
//! A `Profiler` is created when a run starts, wraps each stage call, and is
//! turned into a `ProfileReport` when the run ends. Nothing is shared between
//! runs.

use std::time::{Duration, Instant};

use tracing::info;

/// Accumulated timings for one named stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageProfile {
    pub name: &'static str,
    pub calls: usize,
    pub total: Duration,
    pub max: Duration,
}

impl StageProfile {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

pub struct Profiler {
    started: Instant,
    stages: Vec<StageProfile>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stages: Vec::new(),
        }
    }

    /// Run `f`, charging its wall time to `name`.
    pub fn measure<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(name, start.elapsed());
        out
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let stage = match self.stages.iter_mut().position(|s| s.name == name) {
            Some(i) => &mut self.stages[i],
            None => {
                self.stages.push(StageProfile {
                    name,
                    calls: 0,
                    total: Duration::ZERO,
                    max: Duration::ZERO,
                });
                let last = self.stages.len() - 1;
                &mut self.stages[last]
            }
        };
        stage.calls += 1;
        stage.total += elapsed;
        stage.max = stage.max.max(elapsed);
    }

    pub fn finish(self) -> ProfileReport {
        ProfileReport {
            stages: self.stages,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Timings of a finished run, stages in first-call order.
#[derive(Clone, Debug)]
pub struct ProfileReport {
    pub stages: Vec<StageProfile>,
    pub elapsed: Duration,
}

impl ProfileReport {
    pub fn stage(&self, name: &str) -> Option<&StageProfile> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn log(&self) {
        for s in &self.stages {
            info!(
                stage = s.name,
                calls = s.calls,
                max_s = s.max.as_secs_f64(),
                avg_s = s.average().as_secs_f64(),
                "Stage timing"
            );
        }
        info!(elapsed_s = self.elapsed.as_secs_f64(), "Run finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut profiler = Profiler::new();
        profiler.record("cluster", Duration::from_millis(10));
        profiler.record("cluster", Duration::from_millis(30));
        profiler.record("write", Duration::from_millis(5));

        let report = profiler.finish();
        let cluster = report.stage("cluster").unwrap();
        assert_eq!(cluster.calls, 2);
        assert_eq!(cluster.max, Duration::from_millis(30));
        assert_eq!(cluster.average(), Duration::from_millis(20));
        assert_eq!(report.stages[1].name, "write");
    }

    #[test]
    fn test_measure_returns_value() {
        let mut profiler = Profiler::new();
        let v = profiler.measure("answer", || 42);
        assert_eq!(v, 42);
        assert_eq!(profiler.finish().stage("answer").unwrap().calls, 1);
    }
}
