use chrono::{DateTime, Duration, Utc};

/// Rolling time window used to decide whether a ride or an event counts
/// as "recent". One policy shared by both uses; "now" is always passed
/// in so behavior is reproducible under test.
#[derive(Debug, Clone, Copy)]
pub struct RecencyWindow {
    hours: i64,
}

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

impl RecencyWindow {
    pub fn new(hours: i64) -> Self {
        Self { hours }
    }

    /// Oldest instant still inside the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.hours)
    }

    /// Inclusive at the boundary: `timestamp == now - hours` is recent.
    pub fn is_recent(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp >= self.cutoff(now)
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundary_is_inclusive() {
        let window = RecencyWindow::default();
        let now = Utc::now();

        assert!(window.is_recent(now, now));
        assert!(window.is_recent(now - Duration::hours(23), now));
        assert!(window.is_recent(now - Duration::hours(24), now));
        assert!(!window.is_recent(now - Duration::hours(24) - Duration::seconds(1), now));
    }

    #[test]
    fn test_custom_window_length() {
        let window = RecencyWindow::new(1);
        let now = Utc::now();

        assert!(window.is_recent(now - Duration::minutes(59), now));
        assert!(!window.is_recent(now - Duration::minutes(61), now));
    }
}
