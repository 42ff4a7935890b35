//! Playback Controller
//!
//! [`PlayState`] owns the play-time of one loaded model and advances it once
//! per rendered frame. There is no explicit state enum: the observable states
//! (stopped at a limit, playing forward, playing backward, paused) fall out of
//! `time`, `speed` and `paused`.
//!
//! Limit handling on each tick, in order:
//!
//! 1. Paused, pinned, zero-length range or a non-positive `dt`: hold (a zero
//!    range snaps to the lower limit).
//! 2. Integrate `time + speed * dt`.
//! 3. If a limit was crossed in the direction of travel:
//!    - `continue` without `reverse` wraps modulo the range;
//!    - otherwise clamp, bounce the speed if `reverse`, and for a one-shot
//!      play (neither flag) pause and reflect onto the opposite limit.

use crate::errors::{PoseError, Result};
use crate::settings::PlaybackDefaults;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayState {
    time: f32,
    speed: f32,
    paused: bool,
    pinned: bool,
    lower_limit: f32,
    /// Stored bound; the effective bound is `min(upper_limit, duration)`.
    upper_limit: f32,
    duration: f32,
    pub continue_flag: bool,
    pub reverse_flag: bool,
}

impl Default for PlayState {
    fn default() -> Self {
        Self::new(PlaybackDefaults::default())
    }
}

impl PlayState {
    #[must_use]
    pub fn new(defaults: PlaybackDefaults) -> Self {
        let speed = if defaults.speed.is_finite() && defaults.speed != 0.0 {
            defaults.speed
        } else {
            1.0
        };
        Self {
            time: 0.0,
            speed,
            paused: true,
            pinned: false,
            lower_limit: 0.0,
            upper_limit: f32::MAX,
            duration: 0.0,
            continue_flag: defaults.continue_flag,
            reverse_flag: defaults.reverse_flag,
        }
    }

    /// Applies configured speed and loop flags, keeping time and limits.
    pub fn apply_defaults(&mut self, defaults: PlaybackDefaults) {
        if defaults.speed.is_finite() && defaults.speed != 0.0 {
            self.speed = defaults.speed;
        } else {
            log::warn!("Ignoring unusable default speed {}", defaults.speed);
        }
        self.continue_flag = defaults.continue_flag;
        self.reverse_flag = defaults.reverse_flag;
    }

    // ========================================================================
    // Clip lifecycle
    // ========================================================================

    /// Resets for a newly loaded clip of length `duration`.
    ///
    /// Time restarts at 0 unless pinned, in which case the previous time is
    /// kept (clamped into the new clip). A zero-length clip starts paused.
    pub fn reset_for_clip(&mut self, duration: f32) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.duration = duration;
        self.lower_limit = 0.0;
        self.upper_limit = f32::MAX;

        if self.pinned {
            if self.time > duration {
                log::warn!(
                    "Pinned time {} is beyond the new clip's duration {duration}; clamping",
                    self.time
                );
            }
            self.time = self.time.clamp(0.0, duration);
        } else {
            self.time = 0.0;
        }
        self.paused = duration == 0.0;
    }

    /// Follows an edit that changed the loaded clip's length, keeping time and flags.
    pub fn sync_duration(&mut self, duration: f32) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.lower_limit = self.lower_limit.min(self.duration);
        self.time = self.time.clamp(self.lower_limit, self.effective_upper_limit());
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Advances play-time by `dt` seconds of wall-clock time. Never fails.
    pub fn advance(&mut self, dt: f32) {
        let lower = self.lower_limit;
        let upper = self.effective_upper_limit();
        let range = upper - lower;

        if range <= 0.0 {
            self.time = lower;
            return;
        }
        // Wall-clock time never runs backwards; a negative dt holds like zero.
        if self.paused || self.pinned || dt <= 0.0 || !dt.is_finite() {
            self.time = self.time.clamp(lower, upper);
            return;
        }

        let speed = self.speed;
        let mut time = self.time + speed * dt;

        let crossed = (time <= lower && speed < 0.0) || (time >= upper && speed > 0.0);
        if crossed {
            if self.continue_flag && !self.reverse_flag {
                time = lower + (time - lower).rem_euclid(range);
            } else {
                time = time.clamp(lower, upper);
                if self.reverse_flag {
                    self.speed = -speed;
                }
                if !self.continue_flag && !self.reverse_flag {
                    self.paused = true;
                    time = upper + lower - time;
                }
            }
        }

        self.time = time;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn lower_limit(&self) -> f32 {
        self.lower_limit
    }

    /// The upper limit as stored (may exceed the clip's duration).
    #[inline]
    #[must_use]
    pub fn stored_upper_limit(&self) -> f32 {
        self.upper_limit
    }

    #[inline]
    #[must_use]
    pub fn effective_upper_limit(&self) -> f32 {
        self.upper_limit.min(self.duration)
    }

    #[must_use]
    pub fn is_playing_forward(&self) -> bool {
        !self.paused && !self.pinned && self.speed > 0.0
    }

    #[must_use]
    pub fn is_playing_backward(&self) -> bool {
        !self.paused && !self.pinned && self.speed < 0.0
    }

    /// Paused at one of the limits.
    #[must_use]
    pub fn is_stopped_at_limit(&self) -> bool {
        self.paused
            && (self.time == self.lower_limit || self.time == self.effective_upper_limit())
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Jumps to `time`, clamped into `[0, duration]`.
    pub fn set_time(&mut self, time: f32) -> Result<()> {
        if !time.is_finite() {
            return Err(PoseError::InvalidArgument(format!(
                "play time must be finite, got {time}"
            )));
        }
        self.time = time.clamp(0.0, self.duration);
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() || speed == 0.0 {
            return Err(PoseError::InvalidArgument(format!(
                "speed must be finite and non-zero, got {speed}"
            )));
        }
        self.speed = speed;
        Ok(())
    }

    /// Sets the playback window. Requires `0 <= lower <= upper`.
    ///
    /// `upper` may exceed the clip duration; the duration then bounds play.
    pub fn set_limits(&mut self, lower: f32, upper: f32) -> Result<()> {
        if !lower.is_finite() || upper.is_nan() || lower < 0.0 || lower > upper {
            return Err(PoseError::InvalidArgument(format!(
                "invalid time limits [{lower}, {upper}]"
            )));
        }
        if lower > self.duration {
            return Err(PoseError::InvalidArgument(format!(
                "lower limit {lower} exceeds the clip duration {}",
                self.duration
            )));
        }
        self.lower_limit = lower;
        self.upper_limit = upper;
        self.time = self.time.clamp(lower, self.effective_upper_limit());
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    pub fn toggle_pin(&mut self) {
        self.pinned = !self.pinned;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(duration: f32) -> PlayState {
        let mut state = PlayState::default();
        state.reset_for_clip(duration);
        state
    }

    #[test]
    fn zero_duration_starts_paused() {
        assert!(playing(0.0).is_paused());
        assert!(!playing(2.0).is_paused());
    }

    #[test]
    fn set_limits_rejects_inverted_window() {
        let mut state = playing(10.0);
        assert!(state.set_limits(5.0, 4.0).is_err());
        assert!(state.set_limits(-1.0, 4.0).is_err());
        assert!(state.set_limits(11.0, 12.0).is_err());
        assert!(state.set_limits(2.0, 20.0).is_ok());
        assert_eq!(state.effective_upper_limit(), 10.0);
    }

    #[test]
    fn pinned_state_keeps_time_across_reload() {
        let mut state = playing(10.0);
        state.set_time(4.0).unwrap();
        state.set_pinned(true);
        state.reset_for_clip(3.0);
        assert_eq!(state.time(), 3.0);
    }
}
