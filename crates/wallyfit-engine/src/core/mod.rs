//! Plain data types shared by the engine and its collaborators.
//!
//! - [`BoundingBox`] - Rectangle in percent-of-image units
//! - [`Annotation`] / [`AnnotationRecord`] - One labeled training example
//! - [`ImageId`], [`ImageSource`], [`TestImage`] - Image identity and content
//! - [`Category`] - Target object and image pools for a level

pub use self::{annotation::*, bounding_box::*, category::*, image::*};

pub(crate) mod annotation;
pub(crate) mod bounding_box;
pub(crate) mod category;
pub(crate) mod image;
