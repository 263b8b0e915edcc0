//! Tunable rules of the game.
//!
//! [`GameConfig::default`] is the canonical rule set. A JSON config file may
//! override any subset of fields; the rest keep their defaults.

use serde::{Deserialize, Serialize};

use crate::core::{Category, builtin_catalog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Training images dealt per level (half of them contain the object).
    pub images_per_level: usize,
    /// Minimum trained accuracy (percent) needed to advance a level.
    pub advance_threshold: u8,
    /// Fraction of the trained accuracy added to the score per training.
    pub score_ratio: f64,
    pub scoring: ScoringRules,
    pub fit: FitRules,
    pub categories: Vec<Category>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            images_per_level: 20,
            advance_threshold: 70,
            score_ratio: 0.5,
            scoring: ScoringRules::default(),
            fit: FitRules::default(),
            categories: builtin_catalog(),
        }
    }
}

/// Parameters of the synthetic accuracy formula; see
/// [`ScoringRules::accuracy_from_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringRules {
    pub base_accuracy: u8,
    pub bonus_per_annotation: f64,
    pub bonus_cap: f64,
    pub quality_floor: f64,
    pub quality_weight: f64,
    pub max_accuracy: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_accuracy: 30,
            bonus_per_annotation: 3.0,
            bonus_cap: 50.0,
            quality_floor: 0.3,
            quality_weight: 0.7,
            max_accuracy: 95,
        }
    }
}

/// Thresholds of the fit-state rule table; see [`FitRules::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitRules {
    /// Below this many annotations the model is always underfitting.
    pub min_annotations: usize,
    /// Above this many annotations a poor accuracy means overfitting.
    pub overfit_annotations: usize,
    pub correct_min: u8,
    pub correct_max: u8,
    /// Accuracies below this (outside the other rules) are underfitting.
    pub underfit_below: u8,
}

impl Default for FitRules {
    fn default() -> Self {
        Self {
            min_annotations: 5,
            overfit_annotations: 15,
            correct_min: 70,
            correct_max: 90,
            underfit_below: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("images_per_level must be an even number of at least 2, got {images_per_level}")]
    ImagesPerLevel { images_per_level: usize },
    #[display("{field} must be a percentage in 0..=100, got {value}")]
    Percentage { field: &'static str, value: u8 },
    #[display("{field} must be a finite non-negative number, got {value}")]
    NonNegative { field: &'static str, value: f64 },
    #[display("quality_floor + quality_weight must be in 0..=1, got {sum}")]
    QualityWeights { sum: f64 },
    #[display("base_accuracy {base} exceeds max_accuracy {max}")]
    AccuracyRange { base: u8, max: u8 },
    #[display("fit thresholds must satisfy underfit_below <= correct_min <= correct_max")]
    FitThresholds,
    #[display("at least one category is required")]
    NoCategories,
    #[display("category {name:?} needs at least one training and one test image")]
    EmptyCategory { name: String },
}

impl GameConfig {
    /// Checks that the rules are internally consistent.
    ///
    /// # Example
    ///
    /// ```
    /// use wallyfit_engine::{ConfigError, GameConfig};
    ///
    /// assert!(GameConfig::default().validate().is_ok());
    ///
    /// let config = GameConfig { images_per_level: 7, ..GameConfig::default() };
    /// assert!(matches!(config.validate(), Err(ConfigError::ImagesPerLevel { .. })));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images_per_level < 2 || self.images_per_level % 2 != 0 {
            return Err(ConfigError::ImagesPerLevel {
                images_per_level: self.images_per_level,
            });
        }
        check_percentage("advance_threshold", self.advance_threshold)?;
        check_non_negative("score_ratio", self.score_ratio)?;
        self.scoring.validate()?;
        self.fit.validate()?;
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        if let Some(category) = self
            .categories
            .iter()
            .find(|c| c.images.is_empty() || c.test_images.is_empty())
        {
            return Err(ConfigError::EmptyCategory {
                name: category.name.clone(),
            });
        }
        Ok(())
    }
}

impl ScoringRules {
    fn validate(&self) -> Result<(), ConfigError> {
        check_percentage("base_accuracy", self.base_accuracy)?;
        check_percentage("max_accuracy", self.max_accuracy)?;
        if self.base_accuracy > self.max_accuracy {
            return Err(ConfigError::AccuracyRange {
                base: self.base_accuracy,
                max: self.max_accuracy,
            });
        }
        check_non_negative("bonus_per_annotation", self.bonus_per_annotation)?;
        check_non_negative("bonus_cap", self.bonus_cap)?;
        check_non_negative("quality_floor", self.quality_floor)?;
        check_non_negative("quality_weight", self.quality_weight)?;
        let sum = self.quality_floor + self.quality_weight;
        if sum > 1.0 + f64::EPSILON {
            return Err(ConfigError::QualityWeights { sum });
        }
        Ok(())
    }
}

impl FitRules {
    fn validate(&self) -> Result<(), ConfigError> {
        check_percentage("correct_min", self.correct_min)?;
        check_percentage("correct_max", self.correct_max)?;
        check_percentage("underfit_below", self.underfit_below)?;
        if !(self.underfit_below <= self.correct_min && self.correct_min <= self.correct_max) {
            return Err(ConfigError::FitThresholds);
        }
        Ok(())
    }
}

fn check_percentage(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if value > 100 {
        return Err(ConfigError::Percentage { field, value });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::NonNegative { field, value });
    }
    Ok(())
}
