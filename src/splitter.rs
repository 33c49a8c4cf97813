/// Smallest share either pane may be squeezed to, in percent.
pub const MIN_PERCENT: f64 = 20.0;
pub const MAX_PERCENT: f64 = 100.0 - MIN_PERCENT;

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 50.0;
    }
    percent.clamp(MIN_PERCENT, MAX_PERCENT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterKey {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    start_x: f64,
    start_left_width: f64,
}

/// Divider between the two panes.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    left_percent: f64,
    key_step: f64,
    drag: Option<DragOrigin>,
}

impl Splitter {
    pub fn new(initial_left_percent: f64, key_step: f64) -> Self {
        Self {
            left_percent: clamp_percent(initial_left_percent),
            key_step,
            drag: None,
        }
    }

    pub fn left_percent(&self) -> f64 {
        self.left_percent
    }

    pub fn right_percent(&self) -> f64 {
        100.0 - self.left_percent
    }

    /// Accessible "current value" of the divider.
    pub fn aria_value_now(&self) -> u8 {
        self.left_percent.round() as u8
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, x: f64, left_width: f64) {
        self.drag = Some(DragOrigin {
            start_x: x,
            start_left_width: left_width,
        });
    }

    /// Returns true if the split changed.
    pub fn pointer_move(&mut self, x: f64, total_width: f64) -> bool {
        let Some(origin) = self.drag else {
            return false;
        };
        if total_width <= 0.0 {
            return false;
        }
        let dx = x - origin.start_x;
        self.set_left_percent((origin.start_left_width + dx) / total_width * 100.0)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn key(&mut self, key: SplitterKey) -> bool {
        let step = match key {
            SplitterKey::Left => -self.key_step,
            SplitterKey::Right => self.key_step,
        };
        self.set_left_percent(self.left_percent + step)
    }

    fn set_left_percent(&mut self, percent: f64) -> bool {
        let next = clamp_percent(percent);
        let changed = next != self.left_percent;
        self.left_percent = next;
        changed
    }

    /// Column widths `(left, right)` for a row of `total` cells with a
    /// `divider`-wide strip in between.
    pub fn split_width(&self, total: u16, divider: u16) -> (u16, u16) {
        let usable = total.saturating_sub(divider);
        let left = ((f64::from(usable) * self.left_percent / 100.0).round() as u16).min(usable);
        (left, usable - left)
    }
}
