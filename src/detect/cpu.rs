//! CPU core count, architecture, and a relative performance probe.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot::{self, error::TryRecvError};

use super::os::DETECTING;
use super::{DetectionResult, Detector, Meter, Status};
use crate::platform::{Deferred, HighEntropyValues, MonotonicClock, Navigator, WorkerPool};

/// Probe duration that maps to 0%. Anything at or above it bottoms out.
pub const REFERENCE_MS: f64 = 50.0;

pub const DEFAULT_PROBE_ITERATIONS: u64 = 2_000_000;

pub const ARCH_UNAVAILABLE: &str = "Architecture information is not available";
pub const CORES_UNAVAILABLE: &str = "Core count unavailable";

/// Maps probe time to [0, 100]; faster is higher.
pub fn performance_percent(elapsed: Duration) -> u8 {
    let ms = elapsed.as_secs_f64() * 1000.0;
    let percent = 100.0 * (1.0 - ms / REFERENCE_MS);
    percent.clamp(0.0, 100.0).round() as u8
}

/// Fixed CPU-bound workload.
fn probe_workload(iterations: u64) -> f64 {
    let mut acc = 0.0_f64;
    for i in 0..iterations {
        acc += (black_box(i) as f64).sqrt();
    }
    black_box(acc)
}

/// Formats architecture and bitness, whichever are present.
pub fn describe_architecture(values: &HighEntropyValues) -> Option<String> {
    let arch = values.architecture.as_deref().filter(|a| !a.is_empty());
    let bits = values.bitness.as_deref().filter(|b| !b.is_empty());
    match (arch, bits) {
        (Some(arch), Some(bits)) => Some(format!("{arch} ({bits}-bit)")),
        (Some(arch), None) => Some(arch.to_string()),
        (None, Some(bits)) => Some(format!("{bits}-bit")),
        (None, None) => None,
    }
}

enum Architecture {
    NotRequested,
    Pending(Deferred<HighEntropyValues>),
    Known(String),
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub elapsed: Duration,
    pub percent: u8,
}

/// Times the workload on whatever thread calls it.
fn run_probe(clock: &dyn MonotonicClock, iterations: u64) -> ProbeResult {
    let start = clock.now();
    probe_workload(iterations);
    let elapsed = clock.now().saturating_sub(start);
    ProbeResult {
        elapsed,
        percent: performance_percent(elapsed),
    }
}

pub struct CpuDetector {
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn MonotonicClock>,
    workers: Arc<dyn WorkerPool>,
    iterations: u64,
    cores: Option<usize>,
    cores_failed: bool,
    architecture: Architecture,
    probe: Option<ProbeResult>,
    running: Option<oneshot::Receiver<ProbeResult>>,
}

impl CpuDetector {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn MonotonicClock>,
        workers: Arc<dyn WorkerPool>,
    ) -> Self {
        Self {
            navigator,
            clock,
            workers,
            iterations: DEFAULT_PROBE_ITERATIONS,
            cores: None,
            cores_failed: false,
            architecture: Architecture::NotRequested,
            probe: None,
            running: None,
        }
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn cores(&self) -> Option<usize> {
        self.cores
    }

    pub fn probe(&self) -> Option<ProbeResult> {
        self.probe
    }

    pub fn probe_running(&self) -> bool {
        self.running.is_some()
    }

    /// Queues the timed workload on the worker pool. The result lands on the
    /// next [`Detector::poll`]. Returns false while a probe is already out.
    pub fn start_probe(&mut self) -> bool {
        if self.running.is_some() {
            return false;
        }
        let (tx, rx) = oneshot::channel();
        let clock = self.clock.clone();
        let iterations = self.iterations;
        self.workers.run(Box::new(move || {
            let _ = tx.send(run_probe(clock.as_ref(), iterations));
        }));
        self.running = Some(rx);
        true
    }

    fn poll_probe(&mut self) -> bool {
        let Some(rx) = &mut self.running else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                tracing::debug!(
                    elapsed_ms = result.elapsed.as_secs_f64() * 1000.0,
                    percent = result.percent,
                    "cpu probe finished"
                );
                self.probe = Some(result);
                self.running = None;
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                tracing::warn!("cpu probe worker went away without a result");
                self.running = None;
                true
            }
        }
    }

    fn poll_architecture(&mut self) -> bool {
        let Architecture::Pending(rx) = &mut self.architecture else {
            return false;
        };
        self.architecture = match rx.try_recv() {
            Ok(Ok(values)) => describe_architecture(&values)
                .map(Architecture::Known)
                .unwrap_or(Architecture::Unavailable),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "architecture read failed");
                Architecture::Unavailable
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Architecture::Unavailable,
        };
        true
    }

    fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.cores_failed {
            warnings.push(CORES_UNAVAILABLE);
        }
        if matches!(self.architecture, Architecture::Unavailable) {
            warnings.push(ARCH_UNAVAILABLE);
        }
        warnings
    }
}

impl Detector for CpuDetector {
    fn title(&self) -> &'static str {
        "CPU"
    }

    fn mount(&mut self) {
        match self.navigator.hardware_concurrency() {
            Ok(cores) => {
                self.cores = Some(cores);
                self.cores_failed = false;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read the logical core count");
                self.cores = None;
                self.cores_failed = true;
            }
        }

        self.architecture = match self.navigator.high_entropy_values() {
            Some(rx) => Architecture::Pending(rx),
            None => Architecture::Unavailable,
        };

        self.start_probe();
    }

    fn poll(&mut self) -> bool {
        let architecture = self.poll_architecture();
        let probe = self.poll_probe();
        architecture || probe
    }

    fn report(&self) -> DetectionResult {
        let warnings = self.warnings();
        let status = if matches!(self.architecture, Architecture::Pending(_)) {
            Status::Pending
        } else if !warnings.is_empty() {
            Status::Warning(warnings.join("; "))
        } else if self.probe().is_none() && self.probe_running() {
            Status::Pending
        } else {
            Status::Ready
        };

        let cores = self
            .cores()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let architecture = match &self.architecture {
            Architecture::NotRequested | Architecture::Pending(_) => DETECTING.to_string(),
            Architecture::Known(arch) => arch.clone(),
            Architecture::Unavailable => "Not available".to_string(),
        };

        let mut report = DetectionResult::new(self.title(), status)
            .field("Logical cores", cores)
            .field("Architecture", architecture);
        match self.probe() {
            Some(probe) => {
                report = report.field(
                    "Probe time",
                    format!("{:.1} ms", probe.elapsed.as_secs_f64() * 1000.0),
                );
                report.meter = Some(Meter {
                    label: "Performance".to_string(),
                    percent: probe.percent,
                });
            }
            None if self.probe_running() => report = report.field("Probe time", DETECTING),
            None => {}
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{EntropyMode, FakeClock, FakeNavigator, InlineWorkers};
    use crate::platform::Job;
    use std::sync::Mutex;

    fn detector(navigator: FakeNavigator, clock: FakeClock) -> CpuDetector {
        CpuDetector::new(
            Arc::new(navigator),
            Arc::new(clock),
            Arc::new(InlineWorkers),
        )
        .with_iterations(1_000)
    }

    /// Holds jobs until the test runs them.
    #[derive(Default)]
    struct QueuedWorkers {
        jobs: Mutex<Vec<Job>>,
    }

    impl QueuedWorkers {
        fn run_all(&self) {
            let jobs: Vec<Job> = self.jobs.lock().unwrap().drain(..).collect();
            for job in jobs {
                job();
            }
        }
    }

    impl WorkerPool for QueuedWorkers {
        fn run(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    fn x86() -> EntropyMode {
        EntropyMode::Resolved(HighEntropyValues {
            architecture: Some("x86".into()),
            bitness: Some("64".into()),
            platform: Some("Windows".into()),
            ..HighEntropyValues::default()
        })
    }

    #[test]
    fn percent_is_clamped_for_any_duration() {
        assert_eq!(performance_percent(Duration::ZERO), 100);
        assert_eq!(performance_percent(Duration::from_millis(25)), 50);
        assert_eq!(performance_percent(Duration::from_secs(3600)), 0);
        assert_eq!(performance_percent(Duration::MAX), 0);
        for ms in [0, 1, 10, 49, 50, 51, 500, 100_000] {
            assert!(performance_percent(Duration::from_millis(ms)) <= 100);
        }
    }

    #[test]
    fn shows_core_count() {
        let mut cpu = detector(
            FakeNavigator {
                cores: Some(8),
                ..FakeNavigator::default()
            },
            FakeClock::frozen(),
        );
        cpu.mount();
        cpu.poll();
        assert_eq!(cpu.cores(), Some(8));
        assert_eq!(cpu.report().value("Logical cores"), Some("8"));
    }

    #[test]
    fn shows_architecture_once_resolved() {
        let mut cpu = detector(
            FakeNavigator {
                cores: Some(8),
                entropy: x86(),
                ..FakeNavigator::default()
            },
            FakeClock::frozen(),
        );
        cpu.mount();
        assert!(cpu.report().status.is_pending());
        assert!(cpu.poll());
        let report = cpu.report();
        assert_eq!(report.value("Architecture"), Some("x86 (64-bit)"));
        assert_eq!(report.status, Status::Ready);
    }

    #[test]
    fn missing_structured_api_is_a_warning() {
        let mut cpu = detector(
            FakeNavigator {
                cores: Some(4),
                ..FakeNavigator::default()
            },
            FakeClock::frozen(),
        );
        cpu.mount();
        cpu.poll();
        assert_eq!(
            cpu.report().status,
            Status::Warning(ARCH_UNAVAILABLE.to_string())
        );
    }

    #[test]
    fn core_count_failure_is_a_warning_not_a_crash() {
        let mut cpu = detector(
            FakeNavigator {
                entropy: x86(),
                ..FakeNavigator::default()
            },
            FakeClock::frozen(),
        );
        cpu.mount();
        cpu.poll();
        let report = cpu.report();
        assert_eq!(report.status, Status::Warning(CORES_UNAVAILABLE.to_string()));
        assert_eq!(report.value("Logical cores"), Some("Unknown"));
    }

    #[test]
    fn rejected_architecture_read_is_a_warning() {
        let mut cpu = detector(
            FakeNavigator {
                cores: Some(2),
                entropy: EntropyMode::Rejected,
                ..FakeNavigator::default()
            },
            FakeClock::frozen(),
        );
        cpu.mount();
        cpu.poll();
        assert!(matches!(cpu.report().status, Status::Warning(_)));
    }

    #[test]
    fn meter_is_rendered_and_bounded() {
        let mut cpu = detector(FakeNavigator::default(), FakeClock::frozen());
        cpu.mount();
        cpu.poll();
        let meter = cpu.report().meter.expect("performance meter");
        assert_eq!(meter.percent, 100);

        let mut slow = detector(
            FakeNavigator::default(),
            FakeClock::stepping(Duration::from_secs(10)),
        );
        assert!(slow.start_probe());
        assert!(slow.poll());
        let probe = slow.probe().unwrap();
        assert_eq!(probe.elapsed, Duration::from_secs(10));
        assert_eq!(probe.percent, 0);
    }

    #[test]
    fn probe_runs_on_the_worker_pool() {
        let workers = Arc::new(QueuedWorkers::default());
        let mut cpu = CpuDetector::new(
            Arc::new(FakeNavigator {
                cores: Some(4),
                entropy: x86(),
                ..FakeNavigator::default()
            }),
            Arc::new(FakeClock::frozen()),
            workers.clone(),
        )
        .with_iterations(10);

        cpu.mount();
        cpu.poll();
        assert!(cpu.probe_running());
        let report = cpu.report();
        assert!(report.status.is_pending());
        assert_eq!(report.value("Probe time"), Some(DETECTING));
        assert!(report.meter.is_none());
        assert!(!cpu.start_probe());

        workers.run_all();
        assert!(cpu.poll());
        assert!(!cpu.probe_running());
        let report = cpu.report();
        assert_eq!(report.status, Status::Ready);
        assert_eq!(report.meter.map(|m| m.percent), Some(100));
    }

    #[test]
    fn rerun_keeps_the_previous_result_until_it_lands() {
        let workers = Arc::new(QueuedWorkers::default());
        let mut cpu = CpuDetector::new(
            Arc::new(FakeNavigator::default()),
            Arc::new(FakeClock::frozen()),
            workers.clone(),
        );
        cpu.mount();
        workers.run_all();
        cpu.poll();

        assert!(cpu.start_probe());
        assert!(!cpu.poll());
        assert!(cpu.report().meter.is_some());
        workers.run_all();
        assert!(cpu.poll());
    }

    #[test]
    fn dropped_job_does_not_leave_the_probe_pending() {
        let workers = Arc::new(QueuedWorkers::default());
        let mut cpu = CpuDetector::new(
            Arc::new(FakeNavigator::default()),
            Arc::new(FakeClock::frozen()),
            workers.clone(),
        );
        cpu.mount();
        workers.jobs.lock().unwrap().clear();
        assert!(cpu.poll());
        assert!(!cpu.probe_running());
        assert!(!cpu.report().status.is_pending());
    }

    #[test]
    fn architecture_description_variants() {
        let mut values = HighEntropyValues {
            architecture: Some("arm".into()),
            ..HighEntropyValues::default()
        };
        assert_eq!(describe_architecture(&values).as_deref(), Some("arm"));
        values.bitness = Some("64".into());
        assert_eq!(describe_architecture(&values).as_deref(), Some("arm (64-bit)"));
        assert_eq!(describe_architecture(&HighEntropyValues::default()), None);
    }
}
