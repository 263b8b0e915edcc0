use rand::{Rng, seq::IndexedRandom as _};
use serde::Serialize;

use crate::core::{Annotation, AnnotationRecord};

/// How hard a test image (or the next challenge) should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[display("easy")]
    Easy,
    #[display("medium")]
    Medium,
    #[display("hard")]
    Hard,
}

impl Difficulty {
    /// Difficulty recommended after `examples` annotations.
    #[must_use]
    pub fn recommended(examples: usize) -> Self {
        match examples {
            0..4 => Self::Easy,
            4..7 => Self::Medium,
            _ => Self::Hard,
        }
    }

    /// Difficulty of a test image, judged by how sure the classifier is about
    /// it and how many examples it has seen.
    ///
    /// Confident answers (either way) make easy images; answers close to a
    /// coin flip make hard ones once the classifier has seen enough examples.
    #[must_use]
    pub fn from_confidence(confidence: f32, examples: usize) -> Self {
        let coin_flip = confidence > 0.4 && confidence < 0.6;
        if examples < 5 {
            if confidence > 0.7 || confidence < 0.3 {
                Self::Easy
            } else {
                Self::Medium
            }
        } else if examples < 8 {
            if confidence > 0.8 || confidence < 0.2 {
                Self::Easy
            } else if coin_flip {
                Self::Hard
            } else {
                Self::Medium
            }
        } else if coin_flip {
            Self::Hard
        } else {
            Self::Medium
        }
    }

    /// Difficulties to look for when `self` is wanted: `self` first, then
    /// the easier and harder neighbours, nearest first and easier before
    /// harder.
    #[must_use]
    pub fn search_order(self) -> [Self; 3] {
        match self {
            Self::Easy => [Self::Easy, Self::Medium, Self::Hard],
            Self::Medium => [Self::Medium, Self::Easy, Self::Hard],
            Self::Hard => [Self::Hard, Self::Medium, Self::Easy],
        }
    }
}

/// Picks a random candidate of the `target` difficulty, falling back to the
/// nearest difficulty that has any candidates (see
/// [`Difficulty::search_order`]). `None` without candidates.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{Difficulty, select_by_difficulty};
///
/// let candidates = [("a", Difficulty::Easy), ("b", Difficulty::Hard)];
/// let mut rng = rand::rng();
/// assert_eq!(select_by_difficulty(&candidates, Difficulty::Hard, &mut rng), Some(&"b"));
/// // no medium candidate: the easier neighbour wins
/// assert_eq!(select_by_difficulty(&candidates, Difficulty::Medium, &mut rng), Some(&"a"));
/// ```
#[must_use]
pub fn select_by_difficulty<'a, T, R>(
    candidates: &'a [(T, Difficulty)],
    target: Difficulty,
    rng: &mut R,
) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    target.search_order().into_iter().find_map(|difficulty| {
        let matching: Vec<_> = candidates
            .iter()
            .filter(|(_, d)| *d == difficulty)
            .map(|(candidate, _)| candidate)
            .collect();
        matching.choose(rng).copied()
    })
}

/// What the player has taught the model so far in the current level.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{Annotation, AnnotationRecord, BoundingBox, Difficulty, ImageId, TrainingSummary};
///
/// let mut records = vec![
///     AnnotationRecord::new(ImageId::training(0), "a.png".into(), true),
///     AnnotationRecord::new(ImageId::training(1), "b.png".into(), false),
/// ];
/// records[0].annotate(Annotation::Boxed(BoundingBox::new(0.0, 0.0, 10.0, 20.0).unwrap()));
/// records[1].annotate(Annotation::Rejected);
///
/// let summary = TrainingSummary::from_records(&records);
/// assert_eq!(summary.positive_examples, 1);
/// assert_eq!(summary.negative_examples, 1);
/// assert_eq!(summary.average_box_area, 200.0);
/// assert_eq!(summary.recommended_difficulty, Difficulty::Easy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub positive_examples: usize,
    pub negative_examples: usize,
    /// Mean area of the drawn boxes in percent², `0.0` without boxes.
    pub average_box_area: f32,
    pub recommended_difficulty: Difficulty,
}

impl TrainingSummary {
    #[must_use]
    pub fn from_records(records: &[AnnotationRecord]) -> Self {
        let mut negative_examples = 0;
        let mut areas = Vec::new();
        for annotation in records.iter().filter_map(AnnotationRecord::user_annotation) {
            match annotation {
                Annotation::Rejected => negative_examples += 1,
                Annotation::Boxed(bbox) => areas.push(bbox.area()),
            }
        }
        let positive_examples = areas.len();

        #[expect(clippy::cast_precision_loss)]
        let average_box_area = if areas.is_empty() {
            0.0
        } else {
            areas.iter().sum::<f32>() / areas.len() as f32
        };

        Self {
            positive_examples,
            negative_examples,
            average_box_area,
            recommended_difficulty: Difficulty::recommended(positive_examples + negative_examples),
        }
    }
}
