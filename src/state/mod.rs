/// Crop session state
///
/// This module holds everything the cropper decides on its own:
/// - Which images are still waiting (queue.rs)
/// - Shared data structures (data.rs)
/// - Display ↔ source coordinate transform (geometry.rs)
/// - The session state machine itself (session.rs)

pub mod data;
pub mod geometry;
pub mod queue;
pub mod session;

pub use data::CropJob;
pub use geometry::{DisplayGeometry, OverlayRect};
pub use session::{AdvanceReport, CropSession, Release, SessionState};
