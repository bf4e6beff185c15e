use std::fmt;
use std::time::{Duration, Instant};

/// Completion counter for one model's batch. Purely observational:
/// nothing here feeds back into scheduling.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    completed: usize,
    started: Instant,
}

/// Point-in-time view handed to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub eta: Duration,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self::started_at(total, Instant::now())
    }

    pub fn started_at(total: usize, started: Instant) -> Self {
        Self {
            total,
            completed: 0,
            started,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count one completion and return the refreshed estimate.
    pub fn record(&mut self) -> ProgressSnapshot {
        self.record_at(Instant::now())
    }

    pub fn record_at(&mut self, now: Instant) -> ProgressSnapshot {
        self.completed = (self.completed + 1).min(self.total);
        let elapsed = now.saturating_duration_since(self.started);
        let remaining = self.total - self.completed;
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
            elapsed,
            eta: estimate_remaining(elapsed, self.completed, remaining),
        }
    }
}

/// `elapsed / completed * remaining`; zero before the first completion.
pub fn estimate_remaining(elapsed: Duration, completed: usize, remaining: usize) -> Duration {
    if completed == 0 {
        return Duration::ZERO;
    }
    let per_item = elapsed.as_secs_f64() / completed as f64;
    Duration::from_secs_f64(per_item * remaining as f64)
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} done, estimated time remaining: {}",
            self.completed,
            self.total,
            format_hms(self.eta)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_average_by_remaining() {
        let eta = estimate_remaining(Duration::from_secs(10), 2, 4);
        assert_eq!(eta, Duration::from_secs(20));
    }

    #[test]
    fn estimate_is_zero_before_first_completion() {
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 3), Duration::ZERO);
    }

    #[test]
    fn record_counts_monotonically() {
        let start = Instant::now();
        let mut p = Progress::started_at(3, start);
        let a = p.record_at(start + Duration::from_secs(3));
        let b = p.record_at(start + Duration::from_secs(6));
        assert_eq!(a.completed, 1);
        assert_eq!(b.completed, 2);
        assert_eq!(a.eta, Duration::from_secs(6));
        assert_eq!(b.eta, Duration::from_secs(3));
        let c = p.record_at(start + Duration::from_secs(9));
        assert_eq!(c.eta, Duration::ZERO);
        assert_eq!(p.completed(), p.total());
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3723)), "01:02:03");
        assert_eq!(format_hms(Duration::from_secs(100 * 3600)), "100:00:00");
    }
}
