mod centering;
mod converge;
mod origin;

#[cfg(test)]
pub use centering::misalignment;
pub use centering::{CenteringJob, CenteringOptions, Extent, ScrollSurface};
pub use converge::{ConvergenceOptions, ConvergenceStatus};
pub use origin::{any_user_scroll, ScrollEvent, ScrollOrigin};
