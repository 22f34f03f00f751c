use std::time::Duration;

#[cfg(not(test))]
pub(crate) use std::time::Instant;

#[cfg(test)]
pub(crate) use mock_instant::Instant;

/// When the command gets run again on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Every `period`, measured from the previous start.
    Periodic(Duration),
    /// Only when the window is clicked.
    Manual,
    /// As soon as the previous run is reaped.
    Instant,
}

impl RestartPolicy {
    /// Seconds as given on the command line: positive is periodic, zero is manual and
    /// negative restarts instantly.
    pub fn from_period(seconds: i64) -> Self {
        match seconds {
            0 => Self::Manual,
            s if s < 0 => Self::Instant,
            s => Self::Periodic(Duration::from_secs(s.unsigned_abs())),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Periodic(period) => Some(*period),
            _ => None,
        }
    }
}

/// A one-shot deadline, re-armed on every start.
#[derive(Debug, Default)]
pub struct RestartTimer {
    deadline: Option<Instant>,
}

impl RestartTimer {
    pub fn arm(&mut self, period: Duration) {
        self.deadline = Some(Instant::now() + period);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until expiry; zero once due and `None` while disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.deadline?;
        let now = Instant::now();
        if now >= deadline {
            Some(Duration::ZERO)
        } else {
            Some(deadline.duration_since(now))
        }
    }

    /// Disarms and reports whether the deadline had passed.
    pub fn expire(&mut self) -> bool {
        let due = self.remaining() == Some(Duration::ZERO);
        if due {
            self.deadline = None;
        }
        due
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mock_instant::MockClock;

    #[test]
    fn period_signs() {
        assert_eq!(
            RestartPolicy::from_period(5),
            RestartPolicy::Periodic(Duration::from_secs(5))
        );
        assert_eq!(RestartPolicy::from_period(0), RestartPolicy::Manual);
        assert_eq!(RestartPolicy::from_period(-1), RestartPolicy::Instant);
    }

    #[test]
    fn counts_down_from_arming() {
        let mut timer = RestartTimer::default();
        assert_eq!(timer.remaining(), None);
        timer.arm(Duration::from_secs(5));
        MockClock::advance(Duration::from_secs(2));
        assert_eq!(timer.remaining(), Some(Duration::from_secs(3)));
        assert!(!timer.expire());
        MockClock::advance(Duration::from_secs(3));
        assert!(timer.expire());
        assert!(!timer.is_armed());
    }

    #[test]
    fn rearming_resets_the_deadline() {
        let mut timer = RestartTimer::default();
        timer.arm(Duration::from_secs(5));
        MockClock::advance(Duration::from_secs(4));
        timer.arm(Duration::from_secs(5));
        MockClock::advance(Duration::from_secs(4));
        assert_eq!(timer.remaining(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = RestartTimer::default();
        timer.arm(Duration::from_secs(1));
        timer.cancel();
        MockClock::advance(Duration::from_secs(2));
        assert!(!timer.expire());
    }
}
