use std::time::{Duration, Instant};

/// A single pending deadline. Arming it again replaces the previous deadline,
/// so the timer always measures from the most recent trigger.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Cancels whatever is pending and arms a fresh deadline `delay` after `now`.
    pub fn reschedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.map(|deadline| now >= deadline).unwrap_or(false)
    }

    /// Disarms the timer if its deadline has passed.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reschedule_pushes_deadline_from_latest_trigger() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(100));
        timer.reschedule(start);
        timer.reschedule(start + Duration::from_millis(80));

        assert!(!timer.is_due(start + Duration::from_millis(150)));
        assert!(timer.is_due(start + Duration::from_millis(180)));
    }

    #[test]
    fn take_if_due_fires_once() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(10));
        timer.reschedule(start);

        assert!(!timer.take_if_due(start));
        assert!(timer.take_if_due(start + Duration::from_millis(10)));
        assert!(!timer.is_armed());
        assert!(!timer.take_if_due(start + Duration::from_millis(20)));
    }

    #[test]
    fn cancel_reports_pending_state() {
        let mut timer = DebounceTimer::new(Duration::ZERO);
        assert!(!timer.cancel());
        timer.reschedule(Instant::now());
        assert!(timer.cancel());
        assert_eq!(timer.deadline(), None);
    }
}
