use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Annotation, BoundingBox, ImageContent, ImageId};

/// What a classifier says about an image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Object,
    NoObject,
}

impl Label {
    #[must_use]
    pub fn from_presence(has_object: bool) -> Self {
        if has_object { Self::Object } else { Self::NoObject }
    }

    #[must_use]
    pub fn has_object(self) -> bool {
        self.is_object()
    }
}

impl From<&Annotation> for Label {
    fn from(annotation: &Annotation) -> Self {
        Self::from_presence(annotation.says_has_object())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// In `0.0..=1.0`.
    pub confidence: f32,
}

impl Prediction {
    #[must_use]
    pub fn is_correct_for(&self, image: ImageContent<'_>) -> bool {
        self.label.has_object() == image.contains_object
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ClassifierError {
    #[display("classifier is not loaded")]
    NotLoaded,
    #[display("classifier failed: {reason}")]
    Failed { reason: String },
}

/// Few-shot image classifier trained from the player's annotations.
///
/// Implementations are shared between the game thread and background
/// prediction jobs, so every method takes `&self`.
pub trait FeatureClassifier: fmt::Debug + Send + Sync {
    /// Prepares the classifier; called once before any other method.
    fn load(&self) -> Result<(), ClassifierError>;

    /// Adds one labeled training example, optionally with the boxed region.
    ///
    /// An example for an image that was added before replaces the earlier
    /// one, so re-annotating an image never counts it twice.
    fn add_example(
        &self,
        image_id: &ImageId,
        image: ImageContent<'_>,
        region: Option<&BoundingBox>,
        label: Label,
    ) -> Result<(), ClassifierError>;

    /// Predicts the label of an image, `None` while there is nothing to
    /// predict from.
    fn predict(&self, image: ImageContent<'_>) -> Result<Option<Prediction>, ClassifierError>;

    fn example_count(&self) -> usize;

    /// Forgets every example.
    fn reset(&self);

    /// Releases the classifier's resources.
    fn dispose(&self);
}
