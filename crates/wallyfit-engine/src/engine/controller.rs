use std::sync::Arc;

use chrono::Utc;
use rand::Rng as _;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    AnnotateError,
    collaborator::{
        AnnotationStore, FeatureClassifier, Label, Prediction, PredictionRequest,
        PredictionTicket, SessionContext,
    },
    config::{ConfigError, GameConfig},
    core::{Annotation, AnnotationRecord, ImageId, TestImage},
};

use super::{
    analysis::{Difficulty, TrainingSummary},
    feedback::{Feedback, OVERFIT_WARNING, confidence_message, select_feedback},
    fit_state::FitState,
    image_deck::{GameSeed, ImageDeck},
    level::{GameLevelState, ModelPrediction, PredictionSource},
    scoring::score_for_training,
};

/// Where the current level is in its lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No model trained yet in this level.
    Annotating,
    /// A model is trained; the player may keep annotating and retrain.
    Trained,
    /// The player asked to advance an overfitting model and has to confirm.
    AdvancePending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AdvanceRejection {
    #[display("train the model before moving on")]
    NotTrained,
    #[display("model accuracy {accuracy}% is below the required {required}%")]
    AccuracyTooLow { accuracy: u8, required: u8 },
    #[display("an advance request is already waiting for confirmation")]
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The next level has started.
    Advanced { level: u32 },
    /// The model is overfitting; call [`GameController::confirm`] or
    /// [`GameController::cancel`].
    NeedsConfirmation,
    Rejected(AdvanceRejection),
}

/// Result of a successful [`GameController::train`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingReport {
    pub level: u32,
    pub accuracy: u8,
    pub fit_state: FitState,
    pub annotated_count: usize,
    /// Points added to the score by this training.
    pub points: usize,
    pub score: usize,
    /// Simulated prediction for the level's test image.
    pub prediction: Prediction,
}

/// Everything the UI shows, taken in one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    pub level: u32,
    pub category: String,
    pub target_object: String,
    pub annotated_count: usize,
    pub total_images: usize,
    pub accuracy: u8,
    pub fit_state: FitState,
    pub feedback: Feedback,
    pub can_advance_level: bool,
    pub score: usize,
    pub phase: Phase,
    pub pending_warning: Option<&'static str>,
    pub test_image: TestImage,
    /// Difficulty the test image was chosen for; `None` before enough
    /// annotations were trained.
    pub test_difficulty: Option<Difficulty>,
    pub prediction: Option<ModelPrediction>,
    pub confidence_message: Option<&'static str>,
}

/// Builder for [`GameController`].
#[derive(Debug, Default)]
pub struct GameControllerBuilder {
    config: GameConfig,
    seed: Option<GameSeed>,
    store: Option<Box<dyn AnnotationStore>>,
    classifier: Option<Arc<dyn FeatureClassifier>>,
}

impl GameControllerBuilder {
    #[must_use]
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixes the seed; a random one is drawn otherwise.
    #[must_use]
    pub fn seed(mut self, seed: GameSeed) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn store<S>(mut self, store: S) -> Self
    where
        S: AnnotationStore + 'static,
    {
        self.store = Some(Box::new(store));
        self
    }

    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn FeatureClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Validates the config, loads the classifier and deals level 1.
    ///
    /// A classifier that fails to load is dropped with a warning; the game
    /// then runs on simulated predictions only.
    pub fn build(self) -> Result<GameController, ConfigError> {
        self.config.validate()?;
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let classifier = self
            .classifier
            .filter(|classifier| match classifier.load() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "feature classifier unavailable, using simulated predictions");
                    false
                }
            });
        let mut deck = ImageDeck::with_seed(seed);
        let state = GameLevelState::start(1, &self.config, &mut deck);
        debug!(%seed, category = %state.category().name, "game started");
        Ok(GameController {
            config: self.config,
            seed,
            deck,
            state,
            score: 0,
            phase: Phase::Annotating,
            generation: 0,
            store: self.store,
            classifier,
        })
    }
}

/// Drives a game from level to level.
///
/// Owns the current [`GameLevelState`], the cumulative score and the optional
/// collaborators. Every method is one complete state transition: a caller
/// never observes an annotation without its updated accuracy, or a training
/// without its score.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{AdvanceOutcome, Annotation, BoundingBox, GameController, GameSeed};
///
/// let mut game = GameController::builder()
///     .seed(GameSeed::from_bytes([0; 16]))
///     .build()
///     .unwrap();
///
/// // Answer every image correctly
/// let answers: Vec<_> = game
///     .state()
///     .images()
///     .iter()
///     .map(|record| {
///         let annotation = if record.has_object() {
///             Annotation::Boxed(BoundingBox::new(20.0, 20.0, 30.0, 50.0).unwrap())
///         } else {
///             Annotation::Rejected
///         };
///         (record.image_id().clone(), annotation)
///     })
///     .collect();
/// for (id, annotation) in answers {
///     assert!(game.annotate(&id, annotation).unwrap());
/// }
///
/// let report = game.train().unwrap();
/// assert_eq!(report.accuracy, 80);
/// assert_eq!(game.request_next_level(), AdvanceOutcome::Advanced { level: 2 });
/// assert_eq!(game.score(), 40);
/// ```
#[derive(Debug)]
pub struct GameController {
    config: GameConfig,
    seed: GameSeed,
    deck: ImageDeck,
    state: GameLevelState,
    score: usize,
    phase: Phase,
    generation: u64,
    store: Option<Box<dyn AnnotationStore>>,
    classifier: Option<Arc<dyn FeatureClassifier>>,
}

impl GameController {
    #[must_use]
    pub fn builder() -> GameControllerBuilder {
        GameControllerBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn seed(&self) -> GameSeed {
        self.seed
    }

    #[must_use]
    pub fn state(&self) -> &GameLevelState {
        &self.state
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    #[must_use]
    pub fn can_advance_level(&self) -> bool {
        self.state
            .trained()
            .is_some_and(|t| t.accuracy >= self.config.advance_threshold)
    }

    /// Records the player's answer for one image of the current level.
    ///
    /// Returns `Ok(false)` without changing anything while an advance request
    /// waits for confirmation. After training, the live estimate keeps
    /// updating but the shown accuracy stays at the trained value until the
    /// next [`Self::train`].
    ///
    /// # Errors
    ///
    /// [`AnnotateError::UnknownImage`] if `image_id` is not part of the
    /// current level.
    pub fn annotate(
        &mut self,
        image_id: &ImageId,
        annotation: Annotation,
    ) -> Result<bool, AnnotateError> {
        if self.phase.is_advance_pending() {
            if self.state.image(image_id).is_none() {
                return Err(self.unknown_image(image_id));
            }
            debug!(%image_id, "annotation ignored while advance is pending");
            return Ok(false);
        }

        let record = self
            .state
            .annotate(image_id, annotation, &self.config)?
            .clone();
        let live = self.state.live();
        debug!(
            %image_id,
            annotated = live.annotated_count,
            accuracy = live.accuracy,
            fit_state = %live.fit_state,
            "image annotated"
        );

        self.forward_example(&record, &annotation);
        self.record(&record);
        Ok(true)
    }

    /// Trains the model on the current annotations.
    ///
    /// Freezes the live estimate, adds `round(accuracy * score_ratio)` to the
    /// score (again on every retraining) and rolls a simulated prediction for
    /// the test image. From
    /// [`MIN_EXAMPLES_FOR_TEST_SELECTION`](crate::MIN_EXAMPLES_FOR_TEST_SELECTION) annotations
    /// on, the test image is first chosen to match the model's progress (see
    /// [`ImageDeck::pick_test_image`]). Returns `None` without any annotation
    /// or while an advance request is pending.
    pub fn train(&mut self) -> Option<TrainingReport> {
        if self.phase.is_advance_pending() {
            debug!("training ignored while advance is pending");
            return None;
        }
        let Some(model) = self.state.train() else {
            debug!("training ignored without annotations");
            return None;
        };

        let points = score_for_training(model.accuracy, self.config.score_ratio);
        self.score += points;
        self.phase = Phase::Trained;
        self.generation += 1;

        let pick = self.deck.pick_test_image(
            self.state.category(),
            model.annotated_count,
            model.accuracy,
        );
        let prediction = match pick {
            Some(pick) => {
                debug!(
                    test_image = %pick.image.id(),
                    difficulty = %pick.difficulty,
                    "test image chosen"
                );
                self.state.set_test_image(pick.image, pick.difficulty);
                pick.prediction
            }
            None => self
                .deck
                .roll_prediction(self.state.test_image().content(), model.accuracy),
        };
        self.state
            .set_prediction(prediction, PredictionSource::Simulated);

        info!(
            level = self.state.level(),
            accuracy = model.accuracy,
            fit_state = %model.fit_state,
            points,
            score = self.score,
            "model trained"
        );
        Some(TrainingReport {
            level: self.state.level(),
            accuracy: model.accuracy,
            fit_state: model.fit_state,
            annotated_count: model.annotated_count,
            points,
            score: self.score,
            prediction,
        })
    }

    /// Asks to move on to the next level.
    ///
    /// A trained model that meets the advance threshold moves on at once,
    /// unless it is overfitting: then the request waits for [`Self::confirm`]
    /// or [`Self::cancel`].
    pub fn request_next_level(&mut self) -> AdvanceOutcome {
        let rejection = match (self.phase, self.state.trained()) {
            (Phase::AdvancePending, _) => Some(AdvanceRejection::AlreadyPending),
            (_, None) => Some(AdvanceRejection::NotTrained),
            (_, Some(model)) if model.accuracy < self.config.advance_threshold => {
                Some(AdvanceRejection::AccuracyTooLow {
                    accuracy: model.accuracy,
                    required: self.config.advance_threshold,
                })
            }
            (_, Some(_)) => None,
        };
        if let Some(reason) = rejection {
            debug!(%reason, "advance rejected");
            return AdvanceOutcome::Rejected(reason);
        }

        self.phase = Phase::AdvancePending;
        if self.state.fit_state().is_overfitting() {
            debug!(level = self.state.level(), "advance waits for confirmation");
            return AdvanceOutcome::NeedsConfirmation;
        }
        self.advance();
        AdvanceOutcome::Advanced {
            level: self.state.level(),
        }
    }

    /// Accepts a pending advance request. `false` if none is pending.
    pub fn confirm(&mut self) -> bool {
        if !self.phase.is_advance_pending() {
            return false;
        }
        self.advance();
        true
    }

    /// Withdraws a pending advance request, keeping the trained model.
    /// `false` if none is pending.
    pub fn cancel(&mut self) -> bool {
        if !self.phase.is_advance_pending() {
            return false;
        }
        self.phase = Phase::Trained;
        debug!(level = self.state.level(), "advance cancelled");
        true
    }

    #[must_use]
    pub fn view(&self) -> GameView {
        let has_trained_model = self.state.has_trained_model();
        let accuracy = self.state.accuracy();
        let fit_state = self.state.fit_state();
        let category = self.state.category();
        let prediction = self.state.prediction().copied();
        let examples = match (prediction.map(|p| p.source), &self.classifier) {
            (Some(PredictionSource::Classifier), Some(classifier)) => classifier.example_count(),
            _ => self
                .state
                .trained()
                .map_or(self.state.annotated_count(), |t| t.annotated_count),
        };
        GameView {
            level: self.state.level(),
            category: category.name.clone(),
            target_object: category.target_object.clone(),
            annotated_count: self.state.annotated_count(),
            total_images: self.state.images().len(),
            accuracy,
            fit_state,
            feedback: select_feedback(
                fit_state,
                accuracy,
                self.state.annotated_count(),
                has_trained_model,
                self.state.level(),
                self.config.advance_threshold,
            ),
            can_advance_level: self.can_advance_level(),
            score: self.score,
            phase: self.phase,
            pending_warning: self.phase.is_advance_pending().then_some(OVERFIT_WARNING),
            test_image: self.state.test_image().clone(),
            test_difficulty: self.state.test_difficulty(),
            prediction,
            confidence_message: prediction
                .map(|p| confidence_message(p.prediction.confidence, examples)),
        }
    }

    #[must_use]
    pub fn training_summary(&self) -> TrainingSummary {
        TrainingSummary::from_records(self.state.images())
    }

    #[must_use]
    pub fn prediction_ticket(&self) -> PredictionTicket {
        PredictionTicket {
            level: self.state.level(),
            generation: self.generation,
        }
    }

    /// Classifier job for the current test image, available once a model is
    /// trained and a classifier is attached.
    #[must_use]
    pub fn prediction_request(&self) -> Option<PredictionRequest> {
        if !self.state.has_trained_model() {
            return None;
        }
        let classifier = self.classifier.clone()?;
        Some(PredictionRequest::new(
            self.prediction_ticket(),
            classifier,
            self.state.test_image().clone(),
        ))
    }

    /// Applies the result of a [`PredictionRequest`].
    ///
    /// Results for an older level or model are discarded, and `None` keeps
    /// the simulated prediction. Returns whether the shown prediction
    /// changed.
    pub fn merge_prediction(
        &mut self,
        ticket: PredictionTicket,
        prediction: Option<Prediction>,
    ) -> bool {
        if ticket != self.prediction_ticket() {
            debug!(?ticket, current = ?self.prediction_ticket(), "stale prediction discarded");
            return false;
        }
        let Some(prediction) = prediction else {
            return false;
        };
        self.state
            .set_prediction(prediction, PredictionSource::Classifier);
        true
    }

    fn advance(&mut self) {
        let level = self.state.level() + 1;
        self.state = GameLevelState::start(level, &self.config, &mut self.deck);
        self.phase = Phase::Annotating;
        self.generation += 1;
        if let Some(classifier) = &self.classifier {
            classifier.reset();
        }
        info!(
            level,
            category = %self.state.category().name,
            score = self.score,
            "level started"
        );
    }

    fn unknown_image(&self, image_id: &ImageId) -> AnnotateError {
        AnnotateError::UnknownImage {
            image_id: image_id.clone(),
            level: self.state.level(),
        }
    }

    fn forward_example(&self, record: &AnnotationRecord, annotation: &Annotation) {
        let Some(classifier) = &self.classifier else {
            return;
        };
        if let Err(e) = classifier.add_example(
            record.image_id(),
            record.content(),
            annotation.bounding_box(),
            Label::from(annotation),
        ) {
            warn!(error = %e, image_id = %record.image_id(), "classifier rejected example");
        }
    }

    fn record(&mut self, record: &AnnotationRecord) {
        let context = SessionContext {
            session_id: self.seed.to_string(),
            level: self.state.level(),
            category: self.state.category().name.clone(),
            recorded_at: Utc::now(),
        };
        let Some(store) = &mut self.store else {
            return;
        };
        if let Err(e) = store.record(record, &context) {
            warn!(error = %e, image_id = %record.image_id(), "failed to store annotation");
        }
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        if let Some(classifier) = self.classifier.take() {
            classifier.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collaborator::{ClassifierError, MemoryStore, SimulatedClassifier, StoreError},
        config::FitRules,
        core::{BoundingBox, ImageContent},
    };

    const SEED: GameSeed = GameSeed::from_bytes([
        0x5e, 0xed, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c,
        0x0d,
    ]);

    fn game() -> GameController {
        GameController::builder().seed(SEED).build().unwrap()
    }

    fn answer(record: &AnnotationRecord, correct: bool) -> Annotation {
        if record.has_object() == correct {
            Annotation::Boxed(BoundingBox::new(25.0, 25.0, 20.0, 30.0).unwrap())
        } else {
            Annotation::Rejected
        }
    }

    /// Annotates the first `correct` unannotated images correctly and the next
    /// `wrong` ones incorrectly.
    fn annotate(game: &mut GameController, correct: usize, wrong: usize) {
        let targets: Vec<_> = game
            .state()
            .images()
            .iter()
            .filter(|r| !r.is_annotated())
            .take(correct + wrong)
            .enumerate()
            .map(|(i, r)| (r.image_id().clone(), answer(r, i < correct)))
            .collect();
        assert_eq!(targets.len(), correct + wrong);
        for (id, annotation) in targets {
            assert!(game.annotate(&id, annotation).unwrap());
        }
    }

    fn overfitting_config() -> GameConfig {
        GameConfig {
            fit: FitRules {
                correct_max: 75,
                ..FitRules::default()
            },
            ..GameConfig::default()
        }
    }

    mod progression {
        use super::*;

        #[test]
        fn test_first_training_scenario() {
            let mut game = game();
            annotate(&mut game, 5, 0);

            let view = game.view();
            assert_eq!(view.annotated_count, 5);
            assert_eq!(view.accuracy, 45);
            assert_eq!(view.fit_state, FitState::Underfitting);
            assert!(view.feedback.is_train_prompt());

            let report = game.train().unwrap();
            assert_eq!(report.accuracy, 45);
            assert_eq!(report.points, 23);
            assert_eq!(game.score(), 23);
            assert_eq!(game.phase(), Phase::Trained);

            let view = game.view();
            assert_eq!(view.feedback, Feedback::NeedsAccuracy { shortfall: 25 });
            assert!(!view.can_advance_level);
            assert!(view.prediction.unwrap().source.is_simulated());
            assert_eq!(
                game.request_next_level(),
                AdvanceOutcome::Rejected(AdvanceRejection::AccuracyTooLow {
                    accuracy: 45,
                    required: 70
                })
            );
            assert_eq!(game.state().level(), 1);
        }

        #[test]
        fn test_advance_gate_is_inclusive() {
            let mut game = game();
            annotate(&mut game, 13, 0);
            assert_eq!(game.train().unwrap().accuracy, 69);
            assert!(game.request_next_level().is_rejected());

            annotate(&mut game, 0, 1);
            // trained snapshot is still shown
            assert_eq!(game.view().accuracy, 69);
            assert_eq!(game.state().live().accuracy, 70);

            let report = game.train().unwrap();
            assert_eq!(report.accuracy, 70);
            assert_eq!(report.fit_state, FitState::Correct);
            assert!(game.can_advance_level());
            assert_eq!(
                game.view().feedback,
                Feedback::ReadyToProceed { next_level: 2 }
            );
            assert_eq!(
                game.request_next_level(),
                AdvanceOutcome::Advanced { level: 2 }
            );
            // round(34.5) + 35
            assert_eq!(game.score(), 70);
        }

        #[test]
        fn test_untrained_model_cannot_advance() {
            let mut game = game();
            assert!(game.train().is_none());
            assert_eq!(game.score(), 0);
            assert_eq!(
                game.request_next_level(),
                AdvanceOutcome::Rejected(AdvanceRejection::NotTrained)
            );
            assert_eq!(game.phase(), Phase::Annotating);
        }

        #[test]
        fn test_new_level_starts_fresh() {
            let mut game = game();
            annotate(&mut game, 20, 0);
            game.train().unwrap();
            assert!(game.request_next_level().is_advanced());

            let view = game.view();
            assert_eq!(view.level, 2);
            assert_eq!(view.category, "advanced_wally");
            assert_eq!(view.annotated_count, 0);
            assert_eq!(view.accuracy, 30);
            assert_eq!(view.fit_state, FitState::Underfitting);
            assert_eq!(view.phase, Phase::Annotating);
            assert!(view.prediction.is_none());
            assert_eq!(view.score, 40);
            assert!(!game.state().has_trained_model());
        }

        #[test]
        fn test_score_accumulates_over_trainings_and_levels() {
            let mut game = game();
            annotate(&mut game, 5, 0);
            game.train().unwrap();
            game.train().unwrap();
            assert_eq!(game.score(), 46);

            annotate(&mut game, 15, 0);
            game.train().unwrap();
            game.request_next_level();
            annotate(&mut game, 20, 0);
            game.train().unwrap();
            assert_eq!(game.score(), 46 + 40 + 40);
        }

        #[test]
        fn test_every_level_is_balanced() {
            let mut game = game();
            for level in 1..=4 {
                let images = game.state().images();
                assert_eq!(game.state().level(), level);
                assert_eq!(images.len(), 20);
                assert_eq!(images.iter().filter(|r| r.has_object()).count(), 10);
                annotate(&mut game, 20, 0);
                game.train().unwrap();
                assert!(game.request_next_level().is_advanced());
            }
        }

        #[test]
        fn test_same_seed_same_game() {
            let a = game();
            let b = game();
            assert_eq!(a.state().images(), b.state().images());
            assert_eq!(a.seed(), SEED);
        }

        #[test]
        fn test_unknown_image() {
            let mut game = game();
            let result = game.annotate(&ImageId::from("image-99"), Annotation::Rejected);
            assert!(matches!(
                result,
                Err(AnnotateError::UnknownImage { level: 1, .. })
            ));
            assert_eq!(game.state().annotated_count(), 0);
        }

        #[test]
        fn test_invalid_config_is_rejected() {
            let result = GameController::builder()
                .config(GameConfig {
                    images_per_level: 3,
                    ..GameConfig::default()
                })
                .build();
            assert!(matches!(result, Err(ConfigError::ImagesPerLevel { .. })));
        }
    }

    mod test_image_selection {
        use std::collections::HashSet;

        use super::*;

        #[test]
        fn test_few_annotations_keep_the_level_image() {
            let mut game = game();
            annotate(&mut game, 2, 0);
            game.train().unwrap();
            let view = game.view();
            assert_eq!(view.test_image.id().as_str(), "test-0");
            assert_eq!(view.test_difficulty, None);
        }

        #[test]
        fn test_image_follows_training_progress() {
            let test_set = ImageDeck::test_set(game().state().category());
            for (annotations, allowed) in [
                (3, [Difficulty::Easy, Difficulty::Medium]),
                (10, [Difficulty::Hard, Difficulty::Medium]),
                (20, [Difficulty::Hard, Difficulty::Medium]),
            ] {
                let mut game = game();
                annotate(&mut game, annotations, 0);
                game.train().unwrap();
                let view = game.view();
                let difficulty = view.test_difficulty.unwrap();
                assert!(allowed.contains(&difficulty), "{annotations}: {difficulty}");
                assert!(test_set.contains(&view.test_image));
                assert!(view.prediction.unwrap().source.is_simulated());
            }
        }

        #[test]
        fn test_chosen_images_vary_between_games() {
            let chosen: HashSet<_> = (0..16)
                .map(|i| {
                    let mut game = GameController::builder()
                        .seed(GameSeed::from_bytes([i; 16]))
                        .build()
                        .unwrap();
                    annotate(&mut game, 10, 0);
                    game.train().unwrap();
                    game.state().test_image().id().clone()
                })
                .collect();
            assert!(chosen.len() > 1, "{chosen:?}");
        }

        #[test]
        fn test_classifier_predicts_the_chosen_image() {
            let mut game = GameController::builder()
                .seed(SEED)
                .classifier(Arc::new(SimulatedClassifier::new(
                    crate::config::ScoringRules::default(),
                    SEED,
                )))
                .build()
                .unwrap();
            annotate(&mut game, 10, 0);
            game.train().unwrap();
            let request = game.prediction_request().unwrap();
            assert_eq!(request.image(), game.state().test_image());
        }
    }

    mod overfit_confirmation {
        use super::*;

        fn pending_game() -> GameController {
            let mut game = GameController::builder()
                .config(overfitting_config())
                .seed(SEED)
                .build()
                .unwrap();
            annotate(&mut game, 20, 0);
            let report = game.train().unwrap();
            assert_eq!(report.accuracy, 80);
            assert_eq!(report.fit_state, FitState::Overfitting);
            assert_eq!(game.view().feedback, Feedback::MayBeOverfitting);
            assert_eq!(game.request_next_level(), AdvanceOutcome::NeedsConfirmation);
            game
        }

        #[test]
        fn test_pending_request_freezes_the_level() {
            let mut game = pending_game();
            let view = game.view();
            assert_eq!(view.phase, Phase::AdvancePending);
            assert_eq!(view.pending_warning, Some(OVERFIT_WARNING));
            assert_eq!(view.level, 1);

            let id = game.state().images()[0].image_id().clone();
            assert!(!game.annotate(&id, Annotation::Rejected).unwrap());
            assert!(game.train().is_none());
            assert_eq!(
                game.request_next_level(),
                AdvanceOutcome::Rejected(AdvanceRejection::AlreadyPending)
            );
            assert!(game.annotate(&ImageId::from("x"), Annotation::Rejected).is_err());
            assert_eq!(game.score(), 40);
        }

        #[test]
        fn test_cancel_keeps_state() {
            let mut game = pending_game();
            let before = game.state().images().to_vec();
            assert!(game.cancel());
            assert_eq!(game.phase(), Phase::Trained);
            assert_eq!(game.state().level(), 1);
            assert_eq!(game.state().images(), before.as_slice());
            assert_eq!(game.view().accuracy, 80);
            assert!(!game.cancel());
            assert!(!game.confirm());
        }

        #[test]
        fn test_confirm_advances() {
            let mut game = pending_game();
            assert!(game.confirm());
            assert_eq!(game.state().level(), 2);
            assert_eq!(game.phase(), Phase::Annotating);
            assert_eq!(game.view().pending_warning, None);
            assert_eq!(game.score(), 40);
        }

        #[test]
        fn test_retrain_after_cancel() {
            let mut game = pending_game();
            assert!(game.cancel());
            // three wrong answers out of 20 bring the model down to 75
            let wrong: Vec<_> = game.state().images()[..3]
                .iter()
                .map(|r| (r.image_id().clone(), answer(r, false)))
                .collect();
            for (id, annotation) in wrong {
                assert!(game.annotate(&id, annotation).unwrap());
            }
            let report = game.train().unwrap();
            assert_eq!(report.accuracy, 75);
            assert_eq!(report.fit_state, FitState::Correct);
            assert!(game.request_next_level().is_advanced());
        }
    }

    mod collaborators {
        use super::*;

        #[derive(Debug)]
        struct FailingStore;

        impl AnnotationStore for FailingStore {
            fn record(&mut self, _: &AnnotationRecord, _: &SessionContext) -> Result<(), StoreError> {
                Err(StoreError::Rejected {
                    reason: "read-only".to_owned(),
                })
            }
        }

        #[derive(Debug)]
        struct BrokenClassifier {
            load_fails: bool,
        }

        impl FeatureClassifier for BrokenClassifier {
            fn load(&self) -> Result<(), ClassifierError> {
                if self.load_fails {
                    return Err(ClassifierError::Failed {
                        reason: "no model".to_owned(),
                    });
                }
                Ok(())
            }

            fn add_example(
                &self,
                _: &ImageId,
                _: ImageContent<'_>,
                _: Option<&BoundingBox>,
                _: Label,
            ) -> Result<(), ClassifierError> {
                Err(ClassifierError::Failed {
                    reason: "out of memory".to_owned(),
                })
            }

            fn predict(&self, _: ImageContent<'_>) -> Result<Option<Prediction>, ClassifierError> {
                Err(ClassifierError::NotLoaded)
            }

            fn example_count(&self) -> usize {
                0
            }

            fn reset(&self) {}

            fn dispose(&self) {}
        }

        fn simulated() -> Arc<SimulatedClassifier> {
            Arc::new(SimulatedClassifier::new(
                crate::config::ScoringRules::default(),
                SEED,
            ))
        }

        #[test]
        fn test_store_receives_every_annotation() {
            let store = MemoryStore::new();
            let mut game = GameController::builder()
                .seed(SEED)
                .store(store.clone())
                .build()
                .unwrap();
            annotate(&mut game, 3, 2);
            let entries = store.entries();
            assert_eq!(entries.len(), 5);
            assert!(entries.iter().all(|(_, context)| context.level == 1));
            assert!(entries.iter().all(|(record, _)| record.is_annotated()));

            // the level is reported with every record
            annotate(&mut game, 15, 0);
            game.train().unwrap();
            assert!(game.request_next_level().is_advanced());
            annotate(&mut game, 1, 0);
            let entries = store.entries();
            assert_eq!(entries.len(), 21);
            assert_eq!(entries[20].1.level, 2);
            assert_eq!(entries[20].1.category, "advanced_wally");
        }

        #[test]
        fn test_failures_do_not_change_outcomes() {
            let mut plain = game();
            let mut failing = GameController::builder()
                .seed(SEED)
                .store(FailingStore)
                .classifier(Arc::new(BrokenClassifier { load_fails: false }))
                .build()
                .unwrap();
            assert!(failing.has_classifier());

            annotate(&mut plain, 8, 2);
            annotate(&mut failing, 8, 2);
            let a = plain.train().unwrap();
            let b = failing.train().unwrap();
            assert_eq!(a, b);
            assert_eq!(plain.view(), failing.view());
        }

        #[test]
        fn test_classifier_that_fails_to_load_is_dropped() {
            let game = GameController::builder()
                .seed(SEED)
                .classifier(Arc::new(BrokenClassifier { load_fails: true }))
                .build()
                .unwrap();
            assert!(!game.has_classifier());
            assert!(game.prediction_request().is_none());
        }

        #[test]
        fn test_examples_are_forwarded_and_reset_per_level() {
            let classifier = simulated();
            let mut game = GameController::builder()
                .seed(SEED)
                .classifier(classifier.clone())
                .build()
                .unwrap();
            annotate(&mut game, 20, 0);
            assert_eq!(classifier.example_count(), 20);
            game.train().unwrap();
            game.request_next_level();
            assert_eq!(classifier.example_count(), 0);
        }

        #[test]
        fn test_reannotation_replaces_the_example() {
            let classifier = simulated();
            let mut game = GameController::builder()
                .seed(SEED)
                .classifier(classifier.clone())
                .build()
                .unwrap();
            annotate(&mut game, 4, 0);
            let annotated: Vec<_> = game
                .state()
                .images()
                .iter()
                .filter(|r| r.is_annotated())
                .map(|r| r.image_id().clone())
                .collect();
            for id in &annotated {
                assert!(game.annotate(id, Annotation::Rejected).unwrap());
                assert!(game.annotate(id, Annotation::Rejected).unwrap());
            }
            assert_eq!(game.state().annotated_count(), 4);
            assert_eq!(classifier.example_count(), 4);
        }

        #[test]
        fn test_prediction_merge() {
            let mut game = GameController::builder()
                .seed(SEED)
                .classifier(simulated())
                .build()
                .unwrap();
            assert!(game.prediction_request().is_none());

            annotate(&mut game, 10, 0);
            game.train().unwrap();
            let request = game.prediction_request().unwrap();
            let prediction = request.run().unwrap();
            assert!(prediction.is_some());

            // None keeps the simulated prediction
            assert!(!game.merge_prediction(request.ticket(), None));
            assert!(game.view().prediction.unwrap().source.is_simulated());

            assert!(game.merge_prediction(request.ticket(), prediction));
            let shown = game.view().prediction.unwrap();
            assert!(shown.source.is_classifier());
            assert_eq!(Some(shown.prediction), prediction);
        }

        #[test]
        fn test_stale_tickets_are_discarded() {
            let mut game = GameController::builder()
                .seed(SEED)
                .classifier(simulated())
                .build()
                .unwrap();
            annotate(&mut game, 10, 0);
            game.train().unwrap();
            let old = game.prediction_request().unwrap();

            game.train().unwrap();
            let stale = Prediction {
                label: Label::Object,
                confidence: 0.99,
            };
            assert!(!game.merge_prediction(old.ticket(), Some(stale)));
            assert!(game.view().prediction.unwrap().source.is_simulated());

            let current = game.prediction_request().unwrap();
            annotate(&mut game, 10, 0);
            game.train().unwrap();
            assert!(game.request_next_level().is_advanced());
            assert!(!game.merge_prediction(current.ticket(), Some(stale)));
            assert!(game.view().prediction.is_none());
        }
    }
}
