/// Who moved a pane's scroll position.
///
/// Every scroll write is tagged so listeners can filter out motion the
/// controller caused itself, instead of ignoring all events for a fixed time
/// window after a programmatic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
    Programmatic,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub origin: ScrollOrigin,
    pub from: f64,
    pub to: f64,
}

impl ScrollEvent {
    pub fn is_user(&self) -> bool {
        self.origin == ScrollOrigin::User
    }
}

/// True if any event in the batch came from the user.
pub fn any_user_scroll(events: &[ScrollEvent]) -> bool {
    events.iter().any(ScrollEvent::is_user)
}
