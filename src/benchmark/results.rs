//! Timing summary

use super::execute::ExecutionTimings;
use std::fmt;
use std::time::Duration;

/// Best and mean wall-clock time of a run and the rate they imply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinpackResults {
    /// Matrix order
    pub matrix_size: usize,
    /// Repetitions the summary covers
    pub repetitions: usize,
    /// Fastest factorization plus solve
    pub best: Duration,
    /// Mean factorization plus solve
    pub mean: Duration,
    /// GFLOP/s of the fastest repetition
    pub gflops: f64,
}

impl LinpackResults {
    /// LINPACK operation count `2/3 n³ + 2 n²`
    pub fn flop_count(n: usize) -> f64 {
        let n = n as f64;
        2.0 / 3.0 * n * n * n + 2.0 * n * n
    }

    /// Summarize the timings of a run on a matrix of order `matrix_size`
    pub fn from_timings(matrix_size: usize, timings: &ExecutionTimings) -> Self {
        let repetitions = timings.repetitions();
        let best = timings.totals().min().unwrap_or_default();
        let mean = match u32::try_from(repetitions) {
            Ok(reps) if reps > 0 => timings.totals().sum::<Duration>() / reps,
            _ => Duration::ZERO,
        };
        let secs = best.as_secs_f64();
        let gflops = if secs > 0.0 {
            Self::flop_count(matrix_size) / secs / 1e9
        } else {
            0.0
        };
        Self {
            matrix_size,
            repetitions,
            best,
            mean,
            gflops,
        }
    }
}

impl fmt::Display for LinpackResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>6} {:>14} {:>14} {:>12}", "n", "reps", "best [s]", "mean [s]", "GFLOP/s")?;
        write!(
            f,
            "{:>10} {:>6} {:>14.6e} {:>14.6e} {:>12.3}",
            self.matrix_size,
            self.repetitions,
            self.best.as_secs_f64(),
            self.mean.as_secs_f64(),
            self.gflops
        )
    }
}
