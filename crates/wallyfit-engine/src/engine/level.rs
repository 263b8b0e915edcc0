use serde::Serialize;

use crate::{
    AnnotateError,
    collaborator::Prediction,
    config::GameConfig,
    core::{Annotation, AnnotationRecord, Category, ImageId, TestImage},
};

use super::{
    analysis::Difficulty, fit_state::FitState, image_deck::ImageDeck, scoring::AnnotationTally,
};

/// Accuracy and fit state recomputed after every annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiveEstimate {
    pub annotated_count: usize,
    pub accuracy: u8,
    pub fit_state: FitState,
}

impl LiveEstimate {
    fn compute(images: &[AnnotationRecord], config: &GameConfig) -> Self {
        let tally = AnnotationTally::from_records(images);
        let accuracy = config.scoring.accuracy_from_tally(tally);
        Self {
            annotated_count: tally.annotated,
            accuracy,
            fit_state: config.fit.classify(tally.annotated, accuracy),
        }
    }
}

/// Snapshot of the live estimate taken by the last training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainedModel {
    pub accuracy: u8,
    pub fit_state: FitState,
    pub annotated_count: usize,
}

/// Where the shown test-image prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// Rolled from the trained accuracy when the model was trained.
    Simulated,
    /// Returned by the attached feature classifier.
    Classifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrediction {
    pub prediction: Prediction,
    pub source: PredictionSource,
}

/// Everything that belongs to one level.
///
/// Created fresh when the level starts and replaced as a whole when the player
/// advances; nothing carries over except what the controller keeps itself.
#[derive(Debug, Clone)]
pub struct GameLevelState {
    level: u32,
    category: Category,
    images: Vec<AnnotationRecord>,
    test_image: TestImage,
    /// Set once the test image has been chosen by difficulty.
    test_difficulty: Option<Difficulty>,
    live: LiveEstimate,
    trained: Option<TrainedModel>,
    prediction: Option<ModelPrediction>,
}

impl GameLevelState {
    /// Deals level `level` (1-based): the category and test image rotate with
    /// the level, the training images come from the deck.
    pub(crate) fn start(level: u32, config: &GameConfig, deck: &mut ImageDeck) -> Self {
        let index = usize::try_from(level.saturating_sub(1)).unwrap_or(usize::MAX);
        let category = config.categories[index % config.categories.len()].clone();
        let images = deck.deal_training_set(&category, config.images_per_level);
        let test_images = ImageDeck::test_set(&category);
        let test_image = test_images[index % test_images.len()].clone();
        Self::new(level, category, images, test_image, config)
    }

    #[must_use]
    pub fn new(
        level: u32,
        category: Category,
        images: Vec<AnnotationRecord>,
        test_image: TestImage,
        config: &GameConfig,
    ) -> Self {
        let live = LiveEstimate::compute(&images, config);
        Self {
            level,
            category,
            images,
            test_image,
            test_difficulty: None,
            live,
            trained: None,
            prediction: None,
        }
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn images(&self) -> &[AnnotationRecord] {
        &self.images
    }

    #[must_use]
    pub fn image(&self, id: &ImageId) -> Option<&AnnotationRecord> {
        self.images.iter().find(|r| r.image_id() == id)
    }

    #[must_use]
    pub fn test_image(&self) -> &TestImage {
        &self.test_image
    }

    /// Difficulty the test image was chosen for, `None` while the level
    /// still shows the image it started with.
    #[must_use]
    pub fn test_difficulty(&self) -> Option<Difficulty> {
        self.test_difficulty
    }

    #[must_use]
    pub fn live(&self) -> LiveEstimate {
        self.live
    }

    #[must_use]
    pub fn annotated_count(&self) -> usize {
        self.live.annotated_count
    }

    #[must_use]
    pub fn trained(&self) -> Option<&TrainedModel> {
        self.trained.as_ref()
    }

    #[must_use]
    pub fn has_trained_model(&self) -> bool {
        self.trained.is_some()
    }

    /// Accuracy shown to the player: the trained snapshot once there is one,
    /// the live estimate before that.
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        self.trained.map_or(self.live.accuracy, |t| t.accuracy)
    }

    /// Fit state shown to the player, following the same rule as
    /// [`Self::accuracy`].
    #[must_use]
    pub fn fit_state(&self) -> FitState {
        self.trained.map_or(self.live.fit_state, |t| t.fit_state)
    }

    #[must_use]
    pub fn prediction(&self) -> Option<&ModelPrediction> {
        self.prediction.as_ref()
    }

    /// Stores the player's answer for one image and refreshes the live
    /// estimate.
    pub(crate) fn annotate(
        &mut self,
        image_id: &ImageId,
        annotation: Annotation,
        config: &GameConfig,
    ) -> Result<&AnnotationRecord, AnnotateError> {
        let index = self
            .images
            .iter()
            .position(|r| r.image_id() == image_id)
            .ok_or_else(|| AnnotateError::UnknownImage {
                image_id: image_id.clone(),
                level: self.level,
            })?;
        self.images[index].annotate(annotation);
        self.live = LiveEstimate::compute(&self.images, config);
        Ok(&self.images[index])
    }

    /// Freezes the live estimate as the trained model. `None` without any
    /// annotation.
    pub(crate) fn train(&mut self) -> Option<TrainedModel> {
        if self.live.annotated_count == 0 {
            return None;
        }
        let model = TrainedModel {
            accuracy: self.live.accuracy,
            fit_state: self.live.fit_state,
            annotated_count: self.live.annotated_count,
        };
        self.trained = Some(model);
        Some(model)
    }

    pub(crate) fn set_test_image(&mut self, image: TestImage, difficulty: Difficulty) {
        self.test_image = image;
        self.test_difficulty = Some(difficulty);
    }

    pub(crate) fn set_prediction(&mut self, prediction: Prediction, source: PredictionSource) {
        self.prediction = Some(ModelPrediction { prediction, source });
    }
}
