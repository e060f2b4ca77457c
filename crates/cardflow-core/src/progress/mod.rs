#![forbid(unsafe_code)]

//! Frame-driven progress indicator.
//!
//! A [`ProgressTracker`] interpolates a value in `[0, 100]` across visual
//! frames. The host calls [`ProgressTracker::frame`] once per frame with
//! the current instant; the tracker advances whichever session is active
//! and settles the session's completion handle when it finishes.
//!
//! Two session shapes exist:
//!
//! - **single goal** ([`ProgressTracker::progress_to`]): linear
//!   interpolation from the current value to a target (which may be lower —
//!   the value can shrink).
//! - **plan** ([`ProgressTracker::plan_to`]): N sequential goals separated
//!   by computed gaps so the whole plan spans a target elapsed time,
//!   approximating an unknown completion time.
//!
//! # Invariants
//!
//! 1. States move `Pending → Running → {Paused ⇄ Running} → Completed`;
//!    `stop()` forces any state back to `Pending`.
//! 2. At most one session is active; starting a new one discards the
//!    previous session (its handle stays unsettled).
//! 3. Pause time never counts toward a session's elapsed time.
//! 4. Completion snaps to the exact goal value — no floating drift, and a
//!    plan session that skips its final frame window still lands on the
//!    pre-computed final value.

mod plan;

pub use plan::{ProgressPlan, random_between};

use web_time::{Duration, Instant};

use crate::error::ProgressError;
use crate::pending::Pending;

/// Default per-goal animation duration.
pub const DEFAULT_GOAL_DURATION: Duration = Duration::from_millis(500);
/// Default cap on plan steps.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Lifecycle state of the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressState {
    /// Nothing running; the resting state.
    #[default]
    Pending,
    /// A session is advancing.
    Running,
    /// A session exists but frames are ignored.
    Paused,
    /// The value reached the ceiling via [`ProgressTracker::complete`].
    Completed,
}

/// What happens when the active session's goal is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionGoal {
    /// Return to `Pending`.
    Plain,
    /// Mark the tracker `Completed`.
    Complete,
    /// Return to `Pending` (visual undo of a cancelled request).
    Revert,
}

#[derive(Debug)]
enum SessionMode {
    Single {
        init: f64,
        target: f64,
        duration: Duration,
    },
    Plan {
        steps: Vec<u32>,
        step_duration: Duration,
        timeout: Duration,
        /// Number of steps actually driven (the plan may be truncated when
        /// the timeout cannot fit every step).
        count: usize,
        final_value: f64,
    },
}

#[derive(Debug)]
struct Session {
    mode: SessionMode,
    goal: SessionGoal,
    /// Set lazily on the first frame.
    started: Option<Instant>,
    paused_at: Option<Instant>,
    pause_len: Duration,
    done: Pending<(), ProgressError>,
}

enum Step {
    Value(f64),
    Hold,
    Done(f64),
}

/// Frame-driven value interpolator with single-goal and plan modes.
#[derive(Debug)]
pub struct ProgressTracker {
    value: f64,
    state: ProgressState,
    times_completed: u32,
    session: Option<Session>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: 0.0,
            state: ProgressState::Pending,
            times_completed: 0,
            session: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// How many times the tracker reached the ceiling via `complete`.
    #[inline]
    #[must_use]
    pub fn times_completed(&self) -> u32 {
        self.times_completed
    }

    /// A session exists (running or paused).
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ProgressState::Running
    }

    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == ProgressState::Paused
    }

    /// Set the displayed value directly, clamped to `[0, 100]`.
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(0.0, 100.0);
    }

    /// Animate linearly from the current value to `target` over
    /// `duration`. The target may be lower than the current value.
    pub fn progress_to(&mut self, target: f64, duration: Duration) -> Pending<(), ProgressError> {
        self.start_single(target, duration, SessionGoal::Plain)
    }

    /// Animate to `current + delta` over the default goal duration.
    ///
    /// Fails with [`ProgressError::OutOfRange`] — without mutating any
    /// state — when the sum exceeds 100.
    pub fn accumulate(&mut self, delta: f64) -> Result<Pending<(), ProgressError>, ProgressError> {
        let next = self.value + delta;
        if next > 100.0 {
            return Err(ProgressError::OutOfRange {
                current: self.value,
                delta,
            });
        }
        Ok(self.progress_to(next, DEFAULT_GOAL_DURATION))
    }

    /// Animate to 100 and mark the tracker `Completed`.
    ///
    /// Fails with [`ProgressError::AlreadyComplete`] when the value is
    /// already at the ceiling.
    pub fn complete(
        &mut self,
        duration: Duration,
    ) -> Result<Pending<(), ProgressError>, ProgressError> {
        if self.value >= 100.0 {
            return Err(ProgressError::AlreadyComplete { value: self.value });
        }
        Ok(self.start_single(100.0, duration, SessionGoal::Complete))
    }

    /// Animate back to 0 and return to `Pending` (visual undo of a
    /// cancelled or failed request).
    pub fn revert(&mut self) -> Pending<(), ProgressError> {
        self.start_single(0.0, DEFAULT_GOAL_DURATION, SessionGoal::Revert)
    }

    /// Run `plan` spread over `timeout` with the default step duration and
    /// step cap.
    pub fn plan_to(&mut self, plan: &ProgressPlan, timeout: Duration) -> Pending<(), ProgressError> {
        self.plan_to_with(plan, timeout, DEFAULT_GOAL_DURATION, DEFAULT_MAX_STEPS)
    }

    /// Run `plan`: each step animates over `step_duration`, separated by a
    /// computed gap so active + gap time totals `timeout`. The displayed
    /// value holds at the cumulative sum during gaps. After the final
    /// step's active window the session completes immediately and snaps to
    /// the plan's ceiling.
    pub fn plan_to_with(
        &mut self,
        plan: &ProgressPlan,
        timeout: Duration,
        step_duration: Duration,
        max_steps: usize,
    ) -> Pending<(), ProgressError> {
        if self.is_active() {
            self.stop();
        }
        self.set_value(0.0);

        let fit = if step_duration.is_zero() {
            plan.len()
        } else {
            (timeout.as_millis() / step_duration.as_millis().max(1)) as usize
        };
        let count = plan.len().min(max_steps).min(fit).max(1);

        let done = Pending::new();
        self.session = Some(Session {
            mode: SessionMode::Plan {
                steps: plan.numbers().to_vec(),
                step_duration,
                timeout,
                count,
                final_value: f64::from(plan.max()),
            },
            goal: SessionGoal::Plain,
            started: None,
            paused_at: None,
            pause_len: Duration::ZERO,
            done: done.clone(),
        });
        self.state = ProgressState::Running;
        done
    }

    /// Advance the active session. Call once per visual frame.
    pub fn frame(&mut self, now: Instant) {
        if self.state != ProgressState::Running {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let started = *session.started.get_or_insert(now);
        let elapsed = now
            .saturating_duration_since(started)
            .saturating_sub(session.pause_len);

        match session.mode.step(elapsed) {
            Step::Value(v) => self.set_value(v),
            Step::Hold => {}
            Step::Done(final_value) => self.finish_session(final_value),
        }
    }

    /// Pause the running session. Frames are ignored and elapsed time
    /// stops accumulating until [`ProgressTracker::resume`].
    pub fn pause(&mut self, now: Instant) {
        if self.state != ProgressState::Running {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.paused_at = Some(now);
            self.state = ProgressState::Paused;
        }
    }

    /// Resume the paused session from where it left off. The same session
    /// continues — same mode, same remaining goal structure.
    pub fn resume(&mut self, now: Instant) {
        if self.state != ProgressState::Paused {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            if let Some(paused_at) = session.paused_at.take() {
                session.pause_len += now.saturating_duration_since(paused_at);
            }
            self.state = ProgressState::Running;
        }
    }

    /// Discard the active session and return to `Pending`. The session's
    /// completion handle stays unsettled. No-op when nothing is active.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            self.state = ProgressState::Pending;
        }
    }

    /// Stop and zero the displayed value.
    pub fn reset(&mut self) {
        self.stop();
        self.value = 0.0;
        self.state = ProgressState::Pending;
    }

    fn start_single(
        &mut self,
        target: f64,
        duration: Duration,
        goal: SessionGoal,
    ) -> Pending<(), ProgressError> {
        if self.is_active() {
            self.stop();
        }
        let done = Pending::new();
        self.session = Some(Session {
            mode: SessionMode::Single {
                init: self.value,
                target: target.clamp(0.0, 100.0),
                duration,
            },
            goal,
            started: None,
            paused_at: None,
            pause_len: Duration::ZERO,
            done: done.clone(),
        });
        self.state = ProgressState::Running;
        done
    }

    fn finish_session(&mut self, final_value: f64) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.set_value(final_value);
        self.state = match session.goal {
            SessionGoal::Plain | SessionGoal::Revert => ProgressState::Pending,
            SessionGoal::Complete => {
                self.times_completed += 1;
                ProgressState::Completed
            }
        };
        session.done.resolve(());
    }
}

impl SessionMode {
    fn step(&self, elapsed: Duration) -> Step {
        match self {
            Self::Single {
                init,
                target,
                duration,
            } => {
                let dur_ms = ms(*duration);
                if dur_ms <= 0.0 {
                    return Step::Done(*target);
                }
                let el_ms = ms(elapsed);
                if el_ms <= dur_ms {
                    let fraction = el_ms / dur_ms;
                    Step::Value(init + fraction * (target - init))
                } else {
                    Step::Done(*target)
                }
            }
            Self::Plan {
                steps,
                step_duration,
                timeout,
                count,
                final_value,
            } => {
                let count = *count;
                let step_ms = ms(*step_duration);
                if step_ms <= 0.0 {
                    return Step::Done(*final_value);
                }
                let wait = if count > 1 {
                    let w = (ms(*timeout) - step_ms * count as f64) / (count as f64 - 1.0);
                    w.round().max(0.0)
                } else {
                    0.0
                };
                let cycle = step_ms + wait;
                let el_ms = ms(elapsed);

                let gap = (el_ms / cycle).floor() as usize;
                if gap >= count {
                    // A large frame jump skipped the final window entirely.
                    return Step::Done(*final_value);
                }

                let active_end = (gap as f64 + 1.0) * cycle - wait;
                if el_ms <= active_end {
                    let travelled: f64 = steps[..gap].iter().map(|&n| f64::from(n)).sum();
                    let local = if gap == 0 {
                        el_ms / step_ms
                    } else {
                        (el_ms - (active_end - step_ms)) / step_ms
                    };
                    Step::Value(travelled + local * f64::from(steps[gap]))
                } else if gap >= count - 1 {
                    Step::Done(*final_value)
                } else {
                    Step::Hold
                }
            }
        }
    }
}

#[inline]
fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
