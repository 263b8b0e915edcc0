use serde::{Deserialize, Serialize};

use crate::config::FitRules;

/// How well the (simulated) model fits the training data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum FitState {
    /// Too little data, or the model has not picked up the pattern.
    Underfitting,
    /// The sweet spot.
    Correct,
    /// The model memorised noise instead of the pattern.
    Overfitting,
}

impl FitRules {
    /// Classifies a model from its annotation count and accuracy.
    ///
    /// Rules are evaluated top to bottom and the first match wins
    /// (thresholds shown with their default values):
    ///
    /// 1. fewer than 5 annotations: [`FitState::Underfitting`]
    /// 2. more than 15 annotations and accuracy below 70: [`FitState::Overfitting`]
    /// 3. accuracy in `70..=90`: [`FitState::Correct`]
    /// 4. accuracy below 60: [`FitState::Underfitting`]
    /// 5. anything else: [`FitState::Overfitting`]
    ///
    /// # Example
    ///
    /// ```
    /// use wallyfit_engine::{FitRules, FitState};
    ///
    /// let rules = FitRules::default();
    /// assert_eq!(rules.classify(4, 95), FitState::Underfitting);
    /// assert_eq!(rules.classify(16, 65), FitState::Overfitting);
    /// assert_eq!(rules.classify(10, 80), FitState::Correct);
    /// ```
    #[must_use]
    pub fn classify(&self, annotated_count: usize, accuracy: u8) -> FitState {
        if annotated_count < self.min_annotations {
            FitState::Underfitting
        } else if annotated_count > self.overfit_annotations && accuracy < self.correct_min {
            FitState::Overfitting
        } else if (self.correct_min..=self.correct_max).contains(&accuracy) {
            FitState::Correct
        } else if accuracy < self.underfit_below {
            FitState::Underfitting
        } else {
            FitState::Overfitting
        }
    }
}
