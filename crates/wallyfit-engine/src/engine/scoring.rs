use crate::{config::ScoringRules, core::AnnotationRecord};

/// Counts of annotated and correctly annotated images.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{Annotation, AnnotationRecord, AnnotationTally, ImageId};
///
/// let mut records = vec![
///     AnnotationRecord::new(ImageId::training(0), "a.png".into(), true),
///     AnnotationRecord::new(ImageId::training(1), "b.png".into(), false),
///     AnnotationRecord::new(ImageId::training(2), "c.png".into(), true),
/// ];
/// records[0].annotate(Annotation::Rejected);
/// records[1].annotate(Annotation::Rejected);
///
/// let tally = AnnotationTally::from_records(&records);
/// assert_eq!(tally, AnnotationTally { annotated: 2, correct: 1 });
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationTally {
    pub annotated: usize,
    pub correct: usize,
}

impl AnnotationTally {
    #[must_use]
    pub fn from_records(records: &[AnnotationRecord]) -> Self {
        records
            .iter()
            .filter_map(AnnotationRecord::is_correct)
            .fold(Self::default(), |tally, correct| Self {
                annotated: tally.annotated + 1,
                correct: tally.correct + usize::from(correct),
            })
    }
}

impl ScoringRules {
    /// Synthetic model accuracy (percent) for a set of annotation records.
    ///
    /// Only annotated records count; see [`Self::accuracy_from_counts`].
    #[must_use]
    pub fn compute_accuracy(&self, records: &[AnnotationRecord]) -> u8 {
        self.accuracy_from_tally(AnnotationTally::from_records(records))
    }

    #[must_use]
    pub fn accuracy_from_counts(&self, annotated: usize, correct: usize) -> u8 {
        self.accuracy_from_tally(AnnotationTally { annotated, correct })
    }

    /// Synthetic model accuracy (percent) for the given counts.
    ///
    /// With the default rules:
    ///
    /// - no annotations: 30 (chance level)
    /// - otherwise `30 + min(3 * annotated, 50) * (0.3 + 0.7 * correct / annotated)`,
    ///   capped at 95 and rounded to the nearest integer
    ///
    /// The result therefore always lies in `[base_accuracy, max_accuracy]`:
    /// poor annotations still earn 30% of the volume bonus and the engine never
    /// claims a perfect model.
    ///
    /// # Example
    ///
    /// ```
    /// use wallyfit_engine::ScoringRules;
    ///
    /// let rules = ScoringRules::default();
    /// assert_eq!(rules.accuracy_from_counts(0, 0), 30);
    /// assert_eq!(rules.accuracy_from_counts(5, 5), 45);
    /// assert_eq!(rules.accuracy_from_counts(20, 20), 80);
    /// ```
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn accuracy_from_tally(&self, tally: AnnotationTally) -> u8 {
        if tally.annotated == 0 {
            return self.base_accuracy;
        }
        let correct = tally.correct.min(tally.annotated);
        let quality = correct as f64 / tally.annotated as f64;
        let quantity_bonus = (tally.annotated as f64 * self.bonus_per_annotation).min(self.bonus_cap);
        let multiplier = self.quality_floor + quality * self.quality_weight;
        let accuracy = (f64::from(self.base_accuracy) + quantity_bonus * multiplier)
            .min(f64::from(self.max_accuracy));
        accuracy.round() as u8
    }
}

/// Points awarded for one training action: `round(accuracy * ratio)`.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_for_training(accuracy: u8, ratio: f64) -> usize {
    (f64::from(accuracy) * ratio).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_IMAGES: usize = 40;

    #[test]
    fn test_no_annotations_is_chance_level() {
        let rules = ScoringRules::default();
        assert_eq!(rules.compute_accuracy(&[]), 30);
        assert_eq!(rules.accuracy_from_counts(0, 0), 30);
    }

    #[test]
    fn test_accuracy_stays_within_bounds() {
        let rules = ScoringRules::default();
        for annotated in 1..=MAX_IMAGES {
            for correct in 0..=annotated {
                let accuracy = rules.accuracy_from_counts(annotated, correct);
                assert!(
                    (30..=95).contains(&accuracy),
                    "accuracy {accuracy} out of bounds for {correct}/{annotated}"
                );
            }
        }
    }

    #[test]
    fn test_accuracy_is_monotonic_in_quality() {
        let rules = ScoringRules::default();
        for annotated in 1..=MAX_IMAGES {
            let accuracies: Vec<u8> = (0..=annotated)
                .map(|correct| rules.accuracy_from_counts(annotated, correct))
                .collect();
            assert!(
                accuracies.windows(2).all(|w| w[0] <= w[1]),
                "not monotonic for {annotated} annotations: {accuracies:?}"
            );
        }
    }

    #[test]
    fn test_known_values() {
        let rules = ScoringRules::default();
        // 30 + 15 * 1.0
        assert_eq!(rules.accuracy_from_counts(5, 5), 45);
        // 30 + 15 * 0.3 = 34.5, rounded half up
        assert_eq!(rules.accuracy_from_counts(5, 0), 35);
        // 30 + 39 * 1.0
        assert_eq!(rules.accuracy_from_counts(13, 13), 69);
        // 30 + 42 * 0.95 = 69.9
        assert_eq!(rules.accuracy_from_counts(14, 13), 70);
        // bonus capped at 50
        assert_eq!(rules.accuracy_from_counts(20, 20), 80);
        assert_eq!(rules.accuracy_from_counts(20, 0), 45);
    }

    #[test]
    fn test_ceiling_applies_with_generous_rules() {
        let rules = ScoringRules {
            bonus_cap: 200.0,
            ..ScoringRules::default()
        };
        assert_eq!(rules.accuracy_from_counts(40, 40), 95);
    }

    #[test]
    fn test_score_for_training_rounds_half_up() {
        assert_eq!(score_for_training(45, 0.5), 23);
        assert_eq!(score_for_training(70, 0.5), 35);
        assert_eq!(score_for_training(30, 0.5), 15);
    }
}
