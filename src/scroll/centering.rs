//! Centering a pane's anchor in the pane's visible area.

use std::time::Duration;
use tracing::debug;

use super::converge::{Convergence, ConvergenceOptions, ConvergenceStatus};
use super::origin::ScrollOrigin;

/// Vertical extent in a shared coordinate space (screen rows in the TUI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub top: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn mid(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// A scrollable container whose layout can be measured.
///
/// Measurements reflect the last completed layout pass; `None` means the
/// surface has not been laid out since its content changed.
pub trait ScrollSurface {
    /// Outer box of the pane.
    fn pane_extent(&self) -> Option<Extent>;
    /// Current box of the anchor, in the same space as `pane_extent`.
    fn anchor_extent(&self) -> Option<Extent>;
    fn has_anchor(&self) -> bool;
    fn scroll_top(&self) -> f64;
    fn scroll_height(&self) -> f64;
    fn client_height(&self) -> f64;
    fn scroll_to(&mut self, top: f64, origin: ScrollOrigin);
    /// Make the anchor focusable without putting it into the tab order.
    fn ensure_anchor_focusable(&mut self);
    /// Focus the anchor without scrolling.
    fn focus_anchor(&mut self);
    fn suspend_smooth_scroll(&mut self);
    fn restore_smooth_scroll_after(&mut self, delay: Duration);
}

/// Scroll offset that puts the anchor's midpoint on the pane's midpoint,
/// clamped to the scrollable range.
pub fn center_scroll_top(
    pane: Extent,
    anchor: Extent,
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
) -> f64 {
    let delta = anchor.mid() - pane.mid();
    let max = (scroll_height - client_height).max(0.0);
    (scroll_top + delta).clamp(0.0, max)
}

/// Distance between the anchor midpoint and the visible midpoint.
pub fn misalignment(pane_top: f64, client_height: f64, anchor: Extent) -> f64 {
    (anchor.mid() - (pane_top + client_height / 2.0)).abs()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteringOptions {
    pub convergence: ConvergenceOptions,
    /// Delay before smooth scrolling is re-enabled after an attempt.
    pub smooth_restore: Duration,
}

impl Default for CenteringOptions {
    fn default() -> Self {
        Self {
            convergence: ConvergenceOptions::default(),
            smooth_restore: Duration::from_millis(60),
        }
    }
}

/// One in-progress centering of a pane's anchor.
#[derive(Debug, Clone)]
pub struct CenteringJob {
    convergence: Convergence,
    smooth_restore: Duration,
}

impl CenteringJob {
    /// Start centering. Returns `None` when the surface has no anchor.
    pub fn start<S: ScrollSurface + ?Sized>(surface: &mut S, options: &CenteringOptions) -> Option<Self> {
        if !surface.has_anchor() {
            return None;
        }
        surface.ensure_anchor_focusable();
        Some(Self {
            convergence: Convergence::new(options.convergence),
            smooth_restore: options.smooth_restore,
        })
    }

    pub fn attempts(&self) -> u32 {
        self.convergence.attempts()
    }

    /// Advance by one frame. On termination the anchor is focused.
    pub fn on_frame<S: ScrollSurface + ?Sized>(&mut self, surface: &mut S) -> ConvergenceStatus {
        let restore = self.smooth_restore;
        let status = self.convergence.on_frame(|| attempt(surface, restore));
        match status {
            ConvergenceStatus::Pending => {}
            ConvergenceStatus::Converged { attempts } => {
                debug!(attempts, "anchor centered");
                surface.focus_anchor();
            }
            ConvergenceStatus::GaveUp { attempts, error } => {
                debug!(attempts, error, "anchor centering gave up");
                surface.focus_anchor();
            }
        }
        status
    }

    /// Stop early, e.g. because the user started scrolling. Focus still lands.
    pub fn cancel<S: ScrollSurface + ?Sized>(self, surface: &mut S) {
        debug!(attempts = self.attempts(), "anchor centering cancelled");
        surface.focus_anchor();
    }
}

fn attempt<S: ScrollSurface + ?Sized>(surface: &mut S, restore: Duration) -> f64 {
    let (Some(pane), Some(anchor)) = (surface.pane_extent(), surface.anchor_extent()) else {
        // Not laid out yet; spend the attempt and look again next frame.
        return f64::INFINITY;
    };

    surface.suspend_smooth_scroll();
    let target = center_scroll_top(
        pane,
        anchor,
        surface.scroll_top(),
        surface.scroll_height(),
        surface.client_height(),
    );
    surface.scroll_to(target, ScrollOrigin::Programmatic);
    surface.restore_smooth_scroll_after(restore);

    match (surface.pane_extent(), surface.anchor_extent()) {
        (Some(pane), Some(anchor)) => misalignment(pane.top, surface.client_height(), anchor),
        _ => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surface whose anchor sits at a fixed content offset, optionally
    /// drifting after each scroll to mimic late layout changes.
    struct FakeSurface {
        top: f64,
        client_height: f64,
        content_height: f64,
        anchor_offset: Option<f64>,
        anchor_height: f64,
        drift_per_scroll: f64,
        scroll_top: f64,
        laid_out: bool,
        focusable: bool,
        focused: bool,
        smooth_suspended: bool,
        writes: Vec<(f64, ScrollOrigin)>,
    }

    impl FakeSurface {
        fn new(anchor_offset: Option<f64>) -> Self {
            Self {
                top: 10.0,
                client_height: 100.0,
                content_height: 1000.0,
                anchor_offset,
                anchor_height: 4.0,
                drift_per_scroll: 0.0,
                scroll_top: 0.0,
                laid_out: true,
                focusable: false,
                focused: false,
                smooth_suspended: false,
                writes: Vec::new(),
            }
        }
    }

    impl ScrollSurface for FakeSurface {
        fn pane_extent(&self) -> Option<Extent> {
            self.laid_out.then(|| Extent::new(self.top, self.client_height))
        }
        fn anchor_extent(&self) -> Option<Extent> {
            if !self.laid_out {
                return None;
            }
            self.anchor_offset
                .map(|off| Extent::new(self.top + off - self.scroll_top, self.anchor_height))
        }
        fn has_anchor(&self) -> bool {
            self.anchor_offset.is_some()
        }
        fn scroll_top(&self) -> f64 {
            self.scroll_top
        }
        fn scroll_height(&self) -> f64 {
            self.content_height
        }
        fn client_height(&self) -> f64 {
            self.client_height
        }
        fn scroll_to(&mut self, top: f64, origin: ScrollOrigin) {
            assert!(self.smooth_suspended, "scroll must not be animated");
            self.scroll_top = top;
            self.writes.push((top, origin));
            if let Some(off) = self.anchor_offset.as_mut() {
                *off += self.drift_per_scroll;
            }
        }
        fn ensure_anchor_focusable(&mut self) {
            self.focusable = true;
        }
        fn focus_anchor(&mut self) {
            assert!(self.focusable);
            self.focused = true;
        }
        fn suspend_smooth_scroll(&mut self) {
            self.smooth_suspended = true;
        }
        fn restore_smooth_scroll_after(&mut self, _delay: Duration) {}
    }

    fn run_to_end(job: &mut CenteringJob, surface: &mut FakeSurface) -> (ConvergenceStatus, u32) {
        let mut frames = 0;
        loop {
            frames += 1;
            let status = job.on_frame(surface);
            if status.is_finished() || frames > 100 {
                return (status, frames);
            }
        }
    }

    #[test]
    fn test_center_scroll_top_centers_anchor() {
        let pane = Extent::new(0.0, 100.0);
        let anchor = Extent::new(300.0, 10.0);
        // anchor mid 305, pane mid 50 -> +255
        assert_eq!(center_scroll_top(pane, anchor, 0.0, 1000.0, 100.0), 255.0);
    }

    #[test]
    fn test_center_scroll_top_clamps() {
        let pane = Extent::new(0.0, 100.0);
        assert_eq!(
            center_scroll_top(pane, Extent::new(5.0, 2.0), 0.0, 1000.0, 100.0),
            0.0
        );
        assert_eq!(
            center_scroll_top(pane, Extent::new(990.0, 2.0), 0.0, 1000.0, 100.0),
            900.0
        );
        // content shorter than the pane: nothing to scroll
        assert_eq!(
            center_scroll_top(pane, Extent::new(80.0, 2.0), 0.0, 60.0, 100.0),
            0.0
        );
    }

    #[test]
    fn test_misalignment() {
        assert_eq!(misalignment(10.0, 100.0, Extent::new(58.0, 4.0)), 0.0);
        assert_eq!(misalignment(10.0, 100.0, Extent::new(68.0, 4.0)), 10.0);
    }

    #[test]
    fn test_no_anchor_is_noop() {
        let mut surface = FakeSurface::new(None);
        assert!(CenteringJob::start(&mut surface, &CenteringOptions::default()).is_none());
        assert!(surface.writes.is_empty());
        assert!(!surface.focused);
    }

    #[test]
    fn test_centers_and_focuses() {
        let mut surface = FakeSurface::new(Some(500.0));
        let mut job = CenteringJob::start(&mut surface, &CenteringOptions::default()).unwrap();
        assert!(surface.focusable);

        let (status, frames) = run_to_end(&mut job, &mut surface);
        assert_eq!(status, ConvergenceStatus::Converged { attempts: 1 });
        assert_eq!(frames, 2);
        assert!(surface.focused);
        assert_eq!(surface.writes, vec![(452.0, ScrollOrigin::Programmatic)]);
        let anchor = surface.anchor_extent().unwrap();
        assert!(misalignment(surface.top, surface.client_height, anchor) <= 6.0);
    }

    #[test]
    fn test_gives_up_after_six_attempts_and_still_focuses() {
        let mut surface = FakeSurface::new(Some(500.0));
        surface.drift_per_scroll = 50.0;
        let mut job = CenteringJob::start(&mut surface, &CenteringOptions::default()).unwrap();

        let (status, _) = run_to_end(&mut job, &mut surface);
        assert!(matches!(status, ConvergenceStatus::GaveUp { attempts: 6, .. }));
        assert_eq!(surface.writes.len(), 6);
        assert!(surface.focused);
    }

    #[test]
    fn test_waits_for_layout() {
        let mut surface = FakeSurface::new(Some(300.0));
        surface.laid_out = false;
        let mut job = CenteringJob::start(&mut surface, &CenteringOptions::default()).unwrap();

        assert_eq!(job.on_frame(&mut surface), ConvergenceStatus::Pending);
        assert_eq!(job.on_frame(&mut surface), ConvergenceStatus::Pending);
        assert!(surface.writes.is_empty());

        surface.laid_out = true;
        let status = job.on_frame(&mut surface);
        assert_eq!(status, ConvergenceStatus::Converged { attempts: 2 });
        assert_eq!(surface.writes.len(), 1);
    }

    #[test]
    fn test_cancel_focuses_anchor() {
        let mut surface = FakeSurface::new(Some(300.0));
        let job = CenteringJob::start(&mut surface, &CenteringOptions::default()).unwrap();
        job.cancel(&mut surface);
        assert!(surface.focused);
        assert!(surface.writes.is_empty());
    }
}
