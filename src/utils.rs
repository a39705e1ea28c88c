use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Running document count on stderr. Silent unless enabled.
pub struct ProgressCounter {
    label: &'static str,
    interval: u64,
    enabled: bool,
    started: Instant,
    count: AtomicU64,
}

impl ProgressCounter {
    pub fn new(label: &'static str, interval: u64, enabled: bool) -> Self {
        let counter = Self {
            label,
            interval: interval.max(1),
            enabled,
            started: Instant::now(),
            count: AtomicU64::new(0),
        };
        counter.print(0);
        counter
    }

    pub fn inc(&self, delta: u64) {
        let prev = self.count.fetch_add(delta, Ordering::SeqCst);
        let current = prev + delta;
        // Print if we crossed an interval boundary
        if prev / self.interval < current / self.interval {
            self.print(current);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let total = self.count();
        let secs = self.started.elapsed().as_secs_f64();
        self.print(total);
        if secs > 0.0 {
            eprint!(" ({:.0} docs/s)", total as f64 / secs);
        }
        eprintln!();
    }

    fn print(&self, current: u64) {
        if !self.enabled {
            return;
        }
        eprint!("\r{}: {}", self.label, current);
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_across_threads() {
        let counter = ProgressCounter::new("docs", 10, false);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        counter.inc(1);
                    }
                });
            }
        });
        assert_eq!(counter.count(), 100);
        counter.finish();
    }
}
