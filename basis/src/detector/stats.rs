use std::time::Duration;

/// Rolling window of recent scan durations kept in a fixed-size buffer.
///
/// Exceeding the scan budget logs a warning upstream but never aborts the scan.
#[derive(Debug)]
pub struct ScanStats {
    durations: Vec<Duration>,
    capacity: usize,
    next: usize,
    filled: bool,
}

impl ScanStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            durations: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.durations.len() < self.capacity {
            self.durations.push(duration);
            if self.durations.len() == self.capacity {
                self.filled = true;
            }
        } else {
            self.durations[self.next] = duration;
            self.next = (self.next + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.durations.is_empty() {
            return None;
        }
        let total: Duration = self.durations.iter().sum();
        Some(total / self.durations.len() as u32)
    }

    pub fn max(&self) -> Option<Duration> {
        self.durations.iter().max().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stats_rolls_over_at_capacity() {
        let mut stats = ScanStats::new(3);

        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.max(), Some(Duration::from_millis(30)));

        // Oldest entry (10ms) is replaced
        stats.record(Duration::from_millis(40));
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.mean(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_scan_stats_empty() {
        let stats = ScanStats::new(4);
        assert!(stats.is_empty());
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.max(), None);
    }
}
