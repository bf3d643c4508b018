//! Debounced mode button.
//!
//! ## Hardware
//!
//! Active-low momentary switch on GPIO 38 with the internal pull-up
//! enabled.  The hardware adapter inverts the level, so this module only
//! ever sees `pressed: bool`, sampled once per control tick.
//!
//! ## Edge detection
//!
//! | Raw sample | Edge state | Quiet interval elapsed | Result              |
//! |-----------|------------|------------------------|---------------------|
//! | pressed   | Released   | yes                    | `ToggleEvent`       |
//! | pressed   | Released   | no                     | swallowed, armed    |
//! | pressed   | Pressed    | -                      | nothing (held)      |
//! | released  | any        | -                      | re-armed, no event  |
//!
//! A press that starts inside the quiet interval is swallowed for its
//! whole duration; it does not fire late once the interval expires.

use crate::scheduler::Millis;

/// One accepted physical press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent {
    pub at_ms: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Released,
    Pressed,
}

pub struct DebouncedButton {
    quiet_ms: u32,
    state: EdgeState,
    last_accepted_ms: Option<Millis>,
}

impl DebouncedButton {
    pub fn new(quiet_ms: u32) -> Self {
        Self {
            quiet_ms,
            state: EdgeState::Released,
            last_accepted_ms: None,
        }
    }

    /// Feed one raw sample.  Returns an event on an accepted rising edge.
    pub fn on_sample(&mut self, raw_pressed: bool, now: Millis) -> Option<ToggleEvent> {
        match (self.state, raw_pressed) {
            (EdgeState::Released, true) => {
                self.state = EdgeState::Pressed;
                let quiet = self
                    .last_accepted_ms
                    .is_none_or(|last| now.saturating_sub(last) >= u64::from(self.quiet_ms));
                if quiet {
                    self.last_accepted_ms = Some(now);
                    Some(ToggleEvent { at_ms: now })
                } else {
                    None
                }
            }
            (EdgeState::Pressed, false) => {
                self.state = EdgeState::Released;
                None
            }
            _ => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state == EdgeState::Pressed
    }
}
