use serde::{Deserialize, Serialize};

use super::{
    bounding_box::BoundingBox,
    image::{ImageContent, ImageId, ImageSource},
};

/// The player's verdict on one training image.
///
/// An image without an annotation is represented by `None` in
/// [`AnnotationRecord::user_annotation`]; there is no way to construct an
/// "unset" annotation, so the engine can never revert a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// The player marked the image as not containing the target object.
    Rejected,
    /// The player drew a rectangle around the target object.
    Boxed(BoundingBox),
}

impl Annotation {
    /// Returns whether the player claims the image contains the object.
    #[must_use]
    pub fn says_has_object(&self) -> bool {
        self.is_boxed()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match self {
            Self::Rejected => None,
            Self::Boxed(bbox) => Some(bbox),
        }
    }
}

/// One labeled training example: an image, its ground truth and the player's
/// annotation (if any).
///
/// # Example
///
/// ```
/// use wallyfit_engine::{Annotation, AnnotationRecord, ImageId};
///
/// let mut record = AnnotationRecord::new(ImageId::training(0), "crowd.png".into(), true);
/// assert!(!record.is_annotated());
/// assert_eq!(record.is_correct(), None);
///
/// record.annotate(Annotation::Rejected);
/// assert_eq!(record.user_says_has_object(), Some(false));
/// assert_eq!(record.is_correct(), Some(false));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    image_id: ImageId,
    source: ImageSource,
    has_object: bool,
    user_annotation: Option<Annotation>,
}

impl AnnotationRecord {
    #[must_use]
    pub fn new(image_id: ImageId, source: ImageSource, has_object: bool) -> Self {
        Self {
            image_id,
            source,
            has_object,
            user_annotation: None,
        }
    }

    #[must_use]
    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    #[must_use]
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Ground truth, fixed when the image set is generated.
    #[must_use]
    pub fn has_object(&self) -> bool {
        self.has_object
    }

    #[must_use]
    pub fn user_annotation(&self) -> Option<&Annotation> {
        self.user_annotation.as_ref()
    }

    #[must_use]
    pub fn is_annotated(&self) -> bool {
        self.user_annotation.is_some()
    }

    /// `None` while the image is unannotated.
    #[must_use]
    pub fn user_says_has_object(&self) -> Option<bool> {
        self.user_annotation.as_ref().map(Annotation::says_has_object)
    }

    /// `None` while the image is unannotated.
    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.user_says_has_object().map(|says| says == self.has_object)
    }

    #[must_use]
    pub fn content(&self) -> ImageContent<'_> {
        ImageContent {
            source: &self.source,
            contains_object: self.has_object,
        }
    }

    /// Sets or overwrites the player's annotation and returns the previous one.
    pub fn annotate(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.user_annotation.replace(annotation)
    }
}
