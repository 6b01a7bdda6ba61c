/// Interactive box-editor core
///
/// This module is the heart of the application, shared by the garment
/// editor and the try-on overlay stage:
/// - Drag sessions and the gesture state machine (session.rs)
/// - The box entity collection (collection.rs)
/// - Projection of logical geometry to on-screen rectangles (project.rs)
pub mod collection;
pub mod project;
pub mod session;

pub use collection::{BoxCollection, BoxEntity};
pub use session::{Commit, DragSession, GestureContext, Handle};
