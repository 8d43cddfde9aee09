// SPDX-License-Identifier: MPL-2.0
//! Video lifecycle state machine.
//!
//! Drives when sampling happens for the one bound video:
//! - Idle: no video tracked
//! - Bound: a video is tracked, periodic ticks armed, playback state unknown
//! - Sampling: the video plays and ticks trigger sampling passes
//! - Paused: the video is paused or ended, ticks are suppressed
//!
//! `transition` is the only way to move between phases. Events that make no
//! sense in the current phase are rejected with [`InvalidTransition`].

use std::fmt;

/// Phase of the lifecycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Idle,
    Bound,
    Sampling,
    Paused,
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A video element was attached.
    Bind,
    /// Periodic tick; `playing` is false when the element reports paused or ended.
    Tick { playing: bool },
    Play,
    Pause,
    Seeked,
    Ended,
    /// Detection stopped for the bound video.
    Unbind,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Run a sampling pass now (dropped if one is outstanding).
    Sample,
}

/// An event that is not valid from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: LifecyclePhase,
    pub event: LifecycleEvent,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot apply {:?} while {:?}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

impl LifecyclePhase {
    /// Returns true while a video is tracked.
    #[must_use]
    pub fn is_bound(self) -> bool {
        !matches!(self, LifecyclePhase::Idle)
    }

    /// Applies an event and returns the next phase with its side effect.
    pub fn transition(self, event: LifecycleEvent) -> Result<(Self, Effect), InvalidTransition> {
        use LifecycleEvent as E;
        use LifecyclePhase as P;

        let next = match (self, event) {
            (P::Idle, E::Bind) => (P::Bound, Effect::None),
            (P::Idle, _) | (_, E::Bind) => {
                return Err(InvalidTransition { from: self, event });
            }
            (_, E::Unbind) => (P::Idle, Effect::None),
            (_, E::Play) => (P::Sampling, Effect::Sample),
            (_, E::Pause | E::Ended) => (P::Paused, Effect::None),
            (phase, E::Seeked) => (phase, Effect::Sample),
            (_, E::Tick { playing: true }) => (P::Sampling, Effect::Sample),
            (_, E::Tick { playing: false }) => (P::Paused, Effect::None),
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleEvent as E;
    use LifecyclePhase as P;

    #[test]
    fn bind_from_idle_arms_without_sampling() {
        assert_eq!(P::Idle.transition(E::Bind), Ok((P::Bound, Effect::None)));
    }

    #[test]
    fn idle_rejects_everything_but_bind() {
        for event in [E::Tick { playing: true }, E::Play, E::Pause, E::Seeked, E::Ended, E::Unbind] {
            assert_eq!(
                P::Idle.transition(event),
                Err(InvalidTransition {
                    from: P::Idle,
                    event
                })
            );
        }
    }

    #[test]
    fn bind_while_bound_is_rejected() {
        for phase in [P::Bound, P::Sampling, P::Paused] {
            assert!(phase.transition(E::Bind).is_err());
        }
    }

    #[test]
    fn play_and_seek_sample_immediately() {
        assert_eq!(P::Bound.transition(E::Play), Ok((P::Sampling, Effect::Sample)));
        assert_eq!(P::Paused.transition(E::Play), Ok((P::Sampling, Effect::Sample)));
        assert_eq!(P::Paused.transition(E::Seeked), Ok((P::Paused, Effect::Sample)));
        assert_eq!(P::Sampling.transition(E::Seeked), Ok((P::Sampling, Effect::Sample)));
    }

    #[test]
    fn pause_suppresses_ticks_until_playing_again() {
        let (phase, _) = P::Sampling.transition(E::Pause).unwrap();
        assert_eq!(phase, P::Paused);
        assert_eq!(
            phase.transition(E::Tick { playing: false }),
            Ok((P::Paused, Effect::None))
        );
        assert_eq!(
            phase.transition(E::Tick { playing: true }),
            Ok((P::Sampling, Effect::Sample))
        );
    }

    #[test]
    fn tick_on_stopped_video_pauses() {
        assert_eq!(
            P::Bound.transition(E::Tick { playing: false }),
            Ok((P::Paused, Effect::None))
        );
        assert_eq!(P::Sampling.transition(E::Ended), Ok((P::Paused, Effect::None)));
    }

    #[test]
    fn unbind_returns_to_idle_from_any_bound_phase() {
        for phase in [P::Bound, P::Sampling, P::Paused] {
            assert_eq!(phase.transition(E::Unbind), Ok((P::Idle, Effect::None)));
        }
    }

    #[test]
    fn invalid_transition_is_descriptive() {
        let err = P::Idle.transition(E::Pause).unwrap_err();
        assert_eq!(err.to_string(), "cannot apply Pause while Idle");
    }
}
