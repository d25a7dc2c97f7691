use anyhow::{bail, Result};

/// Pausable, speed-scaled simulation clock.
///
/// The host supplies the wall-clock reading (`now`, in seconds) to every call,
/// so the clock itself never samples ambient time. While running the reading
/// advances at `speed` times the wall rate; while paused it is frozen.
///
/// Pausing has two sources that are tracked separately: an explicit user
/// pause, and a soft pause applied while the page is hidden. Becoming visible
/// again only lifts the soft pause.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Wall time at which `anchor_time` was last taken.
    anchor_wall: f64,
    /// Simulation reading at `anchor_wall`.
    anchor_time: f64,
    speed: f64,
    paused: bool,
    user_paused: bool,
    soft_paused: bool,
    hidden: bool,
}

impl Clock {
    /// A running clock reading zero at `now`.
    pub fn new(now: f64) -> Self {
        Self {
            anchor_wall: now,
            anchor_time: 0.0,
            speed: 1.0,
            paused: false,
            user_paused: false,
            soft_paused: false,
            hidden: false,
        }
    }

    /// Simulation time at wall time `now`.
    pub fn time(&self, now: f64) -> f64 {
        if self.paused {
            self.anchor_time
        } else {
            self.anchor_time + self.speed * (now - self.anchor_wall)
        }
    }

    fn rebase(&mut self, now: f64) {
        self.anchor_time = self.time(now);
        self.anchor_wall = now;
    }

    /// Assigns the current reading without changing the rate.
    pub fn set_time(&mut self, now: f64, time: f64) {
        self.anchor_time = time;
        self.anchor_wall = now;
    }

    /// Zeroes the reading; running/paused state is unchanged.
    pub fn reset(&mut self, now: f64) {
        self.set_time(now, 0.0);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Changes the rate, keeping the current reading continuous.
    pub fn set_speed(&mut self, now: f64, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed < 0.0 {
            bail!("Clock speed must be finite and non-negative (got {}).", speed);
        }
        self.rebase(now);
        self.speed = speed;
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True if the user asked for the pause, as opposed to the page being hidden.
    pub fn is_user_paused(&self) -> bool {
        self.user_paused
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Resumes the clock. A no-op when already running.
    ///
    /// While the page is hidden this only clears the user pause; the clock
    /// stays frozen until `set_hidden(now, false)`.
    pub fn start(&mut self, now: f64) {
        self.user_paused = false;
        if self.hidden {
            self.soft_paused = self.paused;
            return;
        }
        self.soft_paused = false;
        if self.paused {
            self.anchor_wall = now;
            self.paused = false;
        }
    }

    /// Freezes the reading. A no-op when already paused, apart from
    /// recording the user's intent.
    pub fn pause(&mut self, now: f64) {
        self.user_paused = true;
        self.freeze(now);
    }

    fn freeze(&mut self, now: f64) {
        if !self.paused {
            self.rebase(now);
            self.paused = true;
        }
    }

    /// Reacts to the host page being hidden or shown.
    pub fn set_hidden(&mut self, now: f64, hidden: bool) {
        if hidden == self.hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            if !self.paused {
                self.freeze(now);
                self.soft_paused = true;
            }
        } else if self.soft_paused {
            self.soft_paused = false;
            if !self.user_paused && self.paused {
                self.anchor_wall = now;
                self.paused = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn runs_at_wall_rate_from_construction() {
        let clock = Clock::new(100.0);
        assert_close(clock.time(100.0), 0.0);
        assert_close(clock.time(102.5), 2.5);
        assert!(!clock.is_paused());
    }

    #[test]
    fn pause_freezes_and_start_resumes_without_jump() {
        let mut clock = Clock::new(0.0);
        clock.pause(1.0);
        assert!(clock.is_paused());
        assert_close(clock.time(5.0), 1.0);

        clock.pause(6.0);
        assert_close(clock.time(7.0), 1.0);

        clock.start(10.0);
        assert_close(clock.time(10.0), 1.0);
        assert_close(clock.time(11.0), 2.0);

        clock.start(12.0);
        assert_close(clock.time(13.0), 4.0);
    }

    #[test]
    fn speed_change_preserves_current_reading() {
        let mut clock = Clock::new(0.0);
        clock.set_speed(2.0, 0.5).unwrap();
        assert_close(clock.time(2.0), 2.0);
        assert_close(clock.time(4.0), 3.0);
        clock.set_speed(4.0, 3.0).unwrap();
        assert_close(clock.time(5.0), 6.0);
        assert_eq!(clock.speed(), 3.0);

        assert!(clock.set_speed(5.0, -1.0).is_err());
        assert!(clock.set_speed(5.0, f64::NAN).is_err());
    }

    #[test]
    fn speed_change_while_paused_applies_after_resume() {
        let mut clock = Clock::new(0.0);
        clock.pause(1.0);
        clock.set_speed(2.0, 2.0).unwrap();
        assert_close(clock.time(3.0), 1.0);
        clock.start(3.0);
        assert_close(clock.time(4.0), 3.0);
    }

    #[test]
    fn reset_keeps_run_state() {
        let mut clock = Clock::new(0.0);
        clock.reset(5.0);
        assert_close(clock.time(6.0), 1.0);

        clock.pause(7.0);
        clock.reset(8.0);
        assert!(clock.is_paused());
        assert_close(clock.time(20.0), 0.0);
    }

    #[test]
    fn set_time_shifts_offset_only() {
        let mut clock = Clock::new(0.0);
        clock.set_speed(0.0, 2.0).unwrap();
        clock.set_time(3.0, 10.0);
        assert_close(clock.time(3.0), 10.0);
        assert_close(clock.time(4.0), 12.0);
    }

    #[test]
    fn hiding_soft_pauses_and_showing_resumes() {
        let mut clock = Clock::new(0.0);
        clock.set_hidden(1.0, true);
        assert!(clock.is_paused());
        assert!(!clock.is_user_paused());
        assert_close(clock.time(50.0), 1.0);

        clock.set_hidden(50.0, false);
        assert!(!clock.is_paused());
        assert_close(clock.time(51.0), 2.0);
    }

    #[test]
    fn showing_does_not_override_user_pause() {
        let mut clock = Clock::new(0.0);
        clock.pause(1.0);
        clock.set_hidden(2.0, true);
        clock.set_hidden(3.0, false);
        assert!(clock.is_paused());
        assert_close(clock.time(10.0), 1.0);
    }

    #[test]
    fn user_pause_while_hidden_sticks_after_showing() {
        let mut clock = Clock::new(0.0);
        clock.set_hidden(1.0, true);
        clock.pause(2.0);
        clock.set_hidden(3.0, false);
        assert!(clock.is_paused());
        assert!(clock.is_user_paused());

        clock.start(4.0);
        assert_close(clock.time(5.0), 2.0);
    }

    #[test]
    fn start_while_hidden_waits_for_visibility() {
        let mut clock = Clock::new(0.0);
        clock.set_hidden(1.0, true);
        clock.start(2.0);
        assert!(clock.is_paused());
        assert_close(clock.time(10.0), 1.0);

        clock.set_hidden(10.0, false);
        assert!(!clock.is_paused());
        assert_close(clock.time(11.0), 2.0);
    }

    #[test]
    fn start_after_user_pause_while_hidden_resumes_on_show() {
        let mut clock = Clock::new(0.0);
        clock.pause(1.0);
        clock.set_hidden(2.0, true);
        clock.start(3.0);
        assert!(clock.is_paused());
        assert!(!clock.is_user_paused());

        clock.set_hidden(4.0, false);
        assert!(!clock.is_paused());
        assert_close(clock.time(5.0), 2.0);
    }
}
