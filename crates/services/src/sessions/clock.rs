/// What a single tick did to the section countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock is disarmed; nothing changed.
    Idle,
    /// One second elapsed; the payload is the time left.
    Running(u32),
    /// The countdown hit zero and the clock disarmed itself.
    Expired,
}

/// Per-section countdown.
///
/// Ticks are delivered from outside (the runner's interval); the clock only
/// counts them. A disarmed clock ignores ticks, so a late tick after a section
/// ended early cannot touch the next section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionClock {
    remaining_secs: u32,
    armed: bool,
}

impl SectionClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, duration_secs: u32) {
        self.remaining_secs = duration_secs;
        self.armed = true;
    }

    /// Stop counting without touching the remaining time.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.armed {
            return TickOutcome::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.armed = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_secs)
        }
    }

    pub(crate) fn reset(&mut self) {
        self.remaining_secs = 0;
        self.armed = false;
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry() {
        let mut clock = SectionClock::new();
        clock.arm(3);
        assert_eq!(clock.tick(), TickOutcome::Running(2));
        assert_eq!(clock.tick(), TickOutcome::Running(1));
        assert_eq!(clock.tick(), TickOutcome::Expired);
        assert_eq!(clock.remaining_secs(), 0);
        assert!(!clock.is_armed());
        assert_eq!(clock.tick(), TickOutcome::Idle);
        assert_eq!(clock.remaining_secs(), 0);
    }

    #[test]
    fn remaining_never_increases() {
        let mut clock = SectionClock::new();
        clock.arm(10);
        let mut last = clock.remaining_secs();
        for _ in 0..25 {
            clock.tick();
            assert!(clock.remaining_secs() <= last);
            last = clock.remaining_secs();
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn disarmed_clock_ignores_ticks() {
        let mut clock = SectionClock::new();
        clock.arm(5);
        clock.tick();
        clock.disarm();
        for _ in 0..10 {
            assert_eq!(clock.tick(), TickOutcome::Idle);
        }
        assert_eq!(clock.remaining_secs(), 4);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut clock = SectionClock::new();
        clock.arm(0);
        assert_eq!(clock.tick(), TickOutcome::Expired);
    }
}
