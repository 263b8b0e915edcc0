pub use self::{collaborator::*, config::*, core::*, engine::*};

pub mod collaborator;
pub mod config;
pub mod core;
pub mod engine;

/// Error returned when the caller refers to an image that does not belong to
/// the current level.
///
/// This indicates a bug in the caller (the UI only offers images of the
/// current level), so it is reported instead of being treated as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AnnotateError {
    #[display("image {image_id} is not part of level {level}")]
    UnknownImage { image_id: ImageId, level: u32 },
}
