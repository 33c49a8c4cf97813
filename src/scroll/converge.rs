//! Bounded-retry convergence stepped at frame boundaries.
//!
//! Layout measurements are only trustworthy after a render pass, so a
//! measure-then-correct job cannot run to completion in one call. Instead the
//! owner calls [`Convergence::on_frame`] once per frame; the loop waits out the
//! initial deferral, then runs one attempt per frame until the residual error
//! is within tolerance or the attempt budget is spent.

/// Tunables for a convergence loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceOptions {
    /// Hard cap on attempts. The loop gives up silently afterwards.
    pub max_attempts: u32,
    /// Residual error at or below which the loop stops.
    pub tolerance: f64,
    /// Frame boundaries to wait before the first attempt.
    pub defer_frames: u32,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            tolerance: 6.0,
            defer_frames: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergenceStatus {
    /// Waiting for another frame.
    Pending,
    /// Residual error within tolerance.
    Converged { attempts: u32 },
    /// Budget spent with the error still above tolerance.
    GaveUp { attempts: u32, error: f64 },
}

impl ConvergenceStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, ConvergenceStatus::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct Convergence {
    options: ConvergenceOptions,
    frames_waited: u32,
    attempts: u32,
    status: ConvergenceStatus,
}

impl Convergence {
    pub fn new(options: ConvergenceOptions) -> Self {
        Self {
            options,
            frames_waited: 0,
            attempts: 0,
            status: ConvergenceStatus::Pending,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }

    /// Advance by one frame. `attempt` performs a single measure-and-correct
    /// pass and returns the residual error measured afterwards.
    pub fn on_frame<F>(&mut self, attempt: F) -> ConvergenceStatus
    where
        F: FnOnce() -> f64,
    {
        if self.status.is_finished() {
            return self.status;
        }

        // At least one frame always passes before the first attempt.
        let defer = self.options.defer_frames.max(1);
        if self.frames_waited < defer {
            self.frames_waited += 1;
            if self.frames_waited < defer {
                return ConvergenceStatus::Pending;
            }
        }

        self.attempts += 1;
        let error = attempt();

        self.status = if error <= self.options.tolerance {
            ConvergenceStatus::Converged {
                attempts: self.attempts,
            }
        } else if self.attempts >= self.options.max_attempts.max(1) {
            ConvergenceStatus::GaveUp {
                attempts: self.attempts,
                error,
            }
        } else {
            ConvergenceStatus::Pending
        };
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_waits_two_frames() {
        let mut conv = Convergence::new(ConvergenceOptions::default());
        let mut calls = 0;

        assert_eq!(
            conv.on_frame(|| {
                calls += 1;
                0.0
            }),
            ConvergenceStatus::Pending
        );
        assert_eq!(calls, 0);

        let status = conv.on_frame(|| {
            calls += 1;
            0.0
        });
        assert_eq!(calls, 1);
        assert_eq!(status, ConvergenceStatus::Converged { attempts: 1 });
    }

    #[test]
    fn test_retries_once_per_frame_until_within_tolerance() {
        let mut conv = Convergence::new(ConvergenceOptions::default());
        let errors = [40.0, 12.0, 5.0];
        let mut next = 0;

        let mut status = ConvergenceStatus::Pending;
        for _ in 0..10 {
            status = conv.on_frame(|| {
                let e = errors[next];
                next += 1;
                e
            });
            if status.is_finished() {
                break;
            }
        }
        assert_eq!(status, ConvergenceStatus::Converged { attempts: 3 });
        assert_eq!(next, 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut conv = Convergence::new(ConvergenceOptions::default());
        let mut calls = 0;
        for _ in 0..50 {
            conv.on_frame(|| {
                calls += 1;
                100.0
            });
        }
        assert_eq!(calls, 6);
        assert_eq!(
            conv.status(),
            ConvergenceStatus::GaveUp {
                attempts: 6,
                error: 100.0
            }
        );
    }

    #[test]
    fn test_finished_loop_does_not_attempt_again() {
        let mut conv = Convergence::new(ConvergenceOptions {
            defer_frames: 0,
            ..Default::default()
        });
        assert!(conv.on_frame(|| 0.0).is_finished());
        let mut called = false;
        conv.on_frame(|| {
            called = true;
            0.0
        });
        assert!(!called);
        assert_eq!(conv.attempts(), 1);
    }

    #[test]
    fn test_error_exactly_at_tolerance_converges() {
        let mut conv = Convergence::new(ConvergenceOptions {
            defer_frames: 1,
            ..Default::default()
        });
        assert_eq!(
            conv.on_frame(|| 6.0),
            ConvergenceStatus::Converged { attempts: 1 }
        );
    }
}
