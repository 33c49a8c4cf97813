pub mod markup;

use ratatui::layout::Rect;
use std::ops::Range;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthChar;

pub use markup::{Document, Mark, Segment, TextPos};

use crate::scroll::{
    any_user_scroll, CenteringJob, CenteringOptions, ConvergenceStatus, Extent, ScrollEvent,
    ScrollOrigin, ScrollSurface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Original",
            Side::Right => "Modified",
        }
    }
}

/// What the pane is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneSource {
    Empty,
    /// Raw text of a locally chosen file.
    Preview,
    /// Server-rendered issue fragment.
    Issue,
}

/// Wrapped rows for one width. Only valid until the content or width changes.
struct PaneLayout {
    area: Rect,
    rows: Vec<Vec<Segment>>,
    line_first_row: Vec<usize>,
    /// Display column at which each row of a logical line starts.
    row_starts: Vec<Vec<usize>>,
}

impl PaneLayout {
    fn build(document: &Document, area: Rect) -> Self {
        let width = usize::from(area.width).max(1);
        let mut rows = Vec::new();
        let mut line_first_row = Vec::with_capacity(document.lines.len());
        let mut row_starts = Vec::with_capacity(document.lines.len());

        for line in &document.lines {
            line_first_row.push(rows.len());
            let mut starts = vec![0];
            let mut row: Vec<Segment> = Vec::new();
            let mut row_width = 0;
            let mut col = 0;

            for seg in line {
                for ch in seg.text.chars() {
                    let w = ch.width().unwrap_or(0);
                    if row_width + w > width && row_width > 0 {
                        rows.push(std::mem::take(&mut row));
                        starts.push(col);
                        row_width = 0;
                    }
                    match row.last_mut() {
                        Some(last) if last.mark == seg.mark => last.text.push(ch),
                        _ => row.push(Segment {
                            text: ch.to_string(),
                            mark: seg.mark,
                        }),
                    }
                    row_width += w;
                    col += w;
                }
            }
            rows.push(row);
            row_starts.push(starts);
        }

        Self {
            area,
            rows,
            line_first_row,
            row_starts,
        }
    }

    fn row_of(&self, pos: TextPos) -> usize {
        let Some(last_line) = self.line_first_row.len().checked_sub(1) else {
            return 0;
        };
        let line = pos.line.min(last_line);
        let starts = &self.row_starts[line];
        let within = starts.partition_point(|&s| s <= pos.col).saturating_sub(1);
        self.line_first_row[line] + within
    }

    fn last_row_of_line(&self, line: usize) -> usize {
        let line = line.min(self.line_first_row.len().saturating_sub(1));
        self.line_first_row[line] + self.row_starts[line].len().saturating_sub(1)
    }
}

/// One side of the review screen.
pub struct Pane {
    side: Side,
    source: PaneSource,
    document: Document,
    layout: Option<PaneLayout>,
    scroll_top: f64,
    /// Destination of an in-flight smooth scroll.
    scroll_target: Option<f64>,
    smooth_enabled: bool,
    smooth_suspended: bool,
    smooth_restore_at: Option<Instant>,
    anchor_focused: bool,
    events: Vec<ScrollEvent>,
    centering: Option<CenteringJob>,
}

impl Pane {
    pub fn new(side: Side, smooth_enabled: bool) -> Self {
        Self {
            side,
            source: PaneSource::Empty,
            document: Document::empty(),
            layout: None,
            scroll_top: 0.0,
            scroll_target: None,
            smooth_enabled,
            smooth_suspended: false,
            smooth_restore_at: None,
            anchor_focused: false,
            events: Vec::new(),
            centering: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn source(&self) -> PaneSource {
        self.source
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_anchor_focused(&self) -> bool {
        self.anchor_focused
    }

    pub fn anchor_tabindex(&self) -> Option<i32> {
        self.document.anchor.and_then(|a| a.tabindex)
    }

    pub fn is_centering(&self) -> bool {
        self.centering.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.centering.is_some() || self.scroll_target.is_some() || self.smooth_restore_at.is_some()
    }

    pub fn show_issue(&mut self, html: &str) {
        self.replace(Document::from_fragment(html), PaneSource::Issue);
    }

    pub fn show_preview(&mut self, text: &str) {
        self.replace(Document::plain(text), PaneSource::Preview);
        self.scroll_top = 0.0;
    }

    pub fn clear(&mut self) {
        self.replace(Document::empty(), PaneSource::Empty);
        self.scroll_top = 0.0;
    }

    fn replace(&mut self, document: Document, source: PaneSource) {
        self.document = document;
        self.source = source;
        self.layout = None;
        self.scroll_target = None;
        self.anchor_focused = false;
        // A fresh content swap starts over; any running job is dropped.
        self.centering = None;
    }

    /// Lay the content out for `area`. Called from the render pass.
    pub fn measure(&mut self, area: Rect) {
        let same_width = self
            .layout
            .as_ref()
            .is_some_and(|l| l.area.width == area.width);
        if same_width {
            if let Some(layout) = self.layout.as_mut() {
                layout.area = area;
            }
        } else {
            self.layout = Some(PaneLayout::build(&self.document, area));
        }
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll());
    }

    fn max_scroll(&self) -> f64 {
        (self.scroll_height() - self.client_height()).max(0.0)
    }

    pub fn first_visible_row(&self) -> usize {
        self.scroll_top.max(0.0).round() as usize
    }

    /// Rows currently in view, starting at `first_visible_row`.
    pub fn visible_rows(&self) -> &[Vec<Segment>] {
        let Some(layout) = self.layout.as_ref() else {
            return &[];
        };
        let start = self.first_visible_row().min(layout.rows.len());
        let end = (start + usize::from(layout.area.height)).min(layout.rows.len());
        &layout.rows[start..end]
    }

    /// Rows (absolute) covered by the anchor in the current layout.
    pub fn anchor_rows(&self) -> Option<Range<usize>> {
        let anchor = self.document.anchor?;
        let layout = self.layout.as_ref()?;
        let start = layout.row_of(anchor.start);
        let last = if anchor.end <= anchor.start {
            start
        } else if anchor.end.col == 0 {
            layout.last_row_of_line(anchor.end.line.saturating_sub(1))
        } else {
            layout.row_of(TextPos {
                line: anchor.end.line,
                col: anchor.end.col - 1,
            })
        };
        Some(start..last.max(start) + 1)
    }

    /// Scroll on behalf of the user.
    pub fn scroll_by(&mut self, delta: f64) {
        let base = self.scroll_target.unwrap_or(self.scroll_top);
        self.scroll_to(base + delta, ScrollOrigin::User);
    }

    pub fn start_centering(&mut self, options: &CenteringOptions) -> bool {
        self.centering = CenteringJob::start(self, options);
        self.centering.is_some()
    }

    /// Per-frame housekeeping: scroll-event listeners, smooth scrolling and
    /// one step of any running centering job.
    pub fn on_frame(&mut self, now: Instant) -> Option<ConvergenceStatus> {
        let events = std::mem::take(&mut self.events);
        if any_user_scroll(&events) {
            if let Some(job) = self.centering.take() {
                job.cancel(self);
            }
        }

        if self.smooth_restore_at.is_some_and(|at| now >= at) {
            self.smooth_suspended = false;
            self.smooth_restore_at = None;
        }
        self.animate();

        let mut job = self.centering.take()?;
        let status = job.on_frame(self);
        if !status.is_finished() {
            self.centering = Some(job);
        }
        Some(status)
    }

    fn smooth_active(&self) -> bool {
        self.smooth_enabled && !self.smooth_suspended
    }

    fn animate(&mut self) {
        let Some(target) = self.scroll_target else {
            return;
        };
        let remaining = target - self.scroll_top;
        if remaining.abs() <= 1.0 {
            self.scroll_top = target;
            self.scroll_target = None;
        } else {
            self.scroll_top += remaining / 2.0;
        }
    }
}

impl ScrollSurface for Pane {
    fn pane_extent(&self) -> Option<Extent> {
        let layout = self.layout.as_ref()?;
        Some(Extent::new(
            f64::from(layout.area.y),
            f64::from(layout.area.height),
        ))
    }

    fn anchor_extent(&self) -> Option<Extent> {
        let rows = self.anchor_rows()?;
        let layout = self.layout.as_ref()?;
        Some(Extent::new(
            f64::from(layout.area.y) + rows.start as f64 - self.scroll_top,
            rows.len() as f64,
        ))
    }

    fn has_anchor(&self) -> bool {
        self.document.anchor.is_some()
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_height(&self) -> f64 {
        self.layout.as_ref().map_or(0.0, |l| l.rows.len() as f64)
    }

    fn client_height(&self) -> f64 {
        self.layout
            .as_ref()
            .map_or(0.0, |l| f64::from(l.area.height))
    }

    fn scroll_to(&mut self, top: f64, origin: ScrollOrigin) {
        let top = if self.layout.is_some() {
            top.clamp(0.0, self.max_scroll())
        } else {
            top.max(0.0)
        };
        self.events.push(ScrollEvent {
            origin,
            from: self.scroll_top,
            to: top,
        });
        if self.smooth_active() {
            self.scroll_target = Some(top);
        } else {
            self.scroll_top = top;
            self.scroll_target = None;
        }
    }

    fn ensure_anchor_focusable(&mut self) {
        if let Some(anchor) = self.document.anchor.as_mut() {
            anchor.tabindex.get_or_insert(-1);
        }
    }

    fn focus_anchor(&mut self) {
        self.anchor_focused = self.document.anchor.is_some();
    }

    fn suspend_smooth_scroll(&mut self) {
        self.smooth_suspended = true;
        self.smooth_restore_at = None;
    }

    fn restore_smooth_scroll_after(&mut self, delay: Duration) {
        self.smooth_restore_at = Some(Instant::now() + delay);
    }
}
