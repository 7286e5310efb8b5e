//! Per-solve timing of Jacobian assembly and linear solves, compiled in with
//! the `timing` feature. Without it every recorder is a plain call.
#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct TimingStats {
    pub jacobian_times: Vec<Duration>,
    pub linear_solve_times: Vec<Duration>,
    pub total_time: Duration,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_jacobian(&self) -> Duration {
        self.jacobian_times.iter().sum()
    }

    pub fn total_linear_solve(&self) -> Duration {
        self.linear_solve_times.iter().sum()
    }

    pub fn log_summary(&self) {
        if self.jacobian_times.is_empty() {
            return;
        }
        let jacobian = self.total_jacobian();
        let linear = self.total_linear_solve();
        let overhead = self.total_time.saturating_sub(jacobian + linear);

        log::info!("{}", "=".repeat(60));
        log::info!("{:^60}", "SOLVER TIMING SUMMARY");
        log::info!("{}", "=".repeat(60));
        log::info!(
            "Total solver time:   {:>9.3}ms",
            self.total_time.as_secs_f64() * 1000.0
        );
        log::info!(
            "  Jacobian assembly: {:>9.3}ms  (avg: {:>7.3}ms)",
            jacobian.as_secs_f64() * 1000.0,
            jacobian.as_secs_f64() * 1000.0 / self.jacobian_times.len() as f64
        );
        if !self.linear_solve_times.is_empty() {
            log::info!(
                "  Linear solve:      {:>9.3}ms  (avg: {:>7.3}ms)",
                linear.as_secs_f64() * 1000.0,
                linear.as_secs_f64() * 1000.0 / self.linear_solve_times.len() as f64
            );
        }
        log::info!("  Overhead/Other:    {:>9.3}ms", overhead.as_secs_f64() * 1000.0);
        log::info!(
            "Iterations:          {} jacobian, {} lin.solve",
            self.jacobian_times.len(),
            self.linear_solve_times.len()
        );
    }
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
fn timed<F, R>(f: F, select: fn(&mut TimingStats) -> &mut Vec<Duration>) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| select(&mut stats.borrow_mut()).push(elapsed));
    result
}

#[cfg(feature = "timing")]
pub fn record_jacobian<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    timed(f, |s| &mut s.jacobian_times)
}

#[cfg(not(feature = "timing"))]
pub fn record_jacobian<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_linear_solve<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    timed(f, |s| &mut s.linear_solve_times)
}

#[cfg(not(feature = "timing"))]
pub fn record_linear_solve<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn finalize_timing(total_time: Duration) -> TimingStats {
    TIMING_STATS.with(|stats| {
        let mut s = stats.borrow_mut();
        s.total_time = total_time;
        s.clone()
    })
}

#[cfg(not(feature = "timing"))]
pub fn finalize_timing(_total_time: Duration) -> TimingStats {
    TimingStats::new()
}

pub fn finalize_and_print(total_time: Duration) {
    finalize_timing(total_time).log_summary();
}
