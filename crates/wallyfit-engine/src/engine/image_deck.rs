use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    collaborator::{Prediction, simulate_prediction},
    core::{AnnotationRecord, Category, ImageContent, ImageId, TestImage},
};

use super::analysis::{Difficulty, select_by_difficulty};

/// Annotations needed before the test image is chosen by difficulty. With
/// fewer, the level keeps the test image it started with.
pub const MIN_EXAMPLES_FOR_TEST_SELECTION: usize = 3;

/// Test image chosen by [`ImageDeck::pick_test_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestImagePick {
    pub image: TestImage,
    /// Simulated prediction the difficulty was judged from.
    pub prediction: Prediction,
    pub difficulty: Difficulty,
}

/// Deals the images of each level and rolls the simulated predictions.
///
/// # Balanced training sets
///
/// Each training set is built by:
///
/// 1. Shuffling the category's image pool and taking the first `size` entries
///    (cycling through the pool again if it is smaller than `size`)
/// 2. Marking the first half as containing the target object and the second
///    half as not containing it
/// 3. Shuffling the labeled set so positives and negatives are interleaved
///
/// The 50/50 balance is what matters; the shuffle only keeps the order
/// unpredictable for the player.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{GameSeed, ImageDeck, builtin_catalog};
///
/// let catalog = builtin_catalog();
/// let seed: GameSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
///
/// let images = ImageDeck::with_seed(seed).deal_training_set(&catalog[0], 20);
/// let positives = images.iter().filter(|r| r.has_object()).count();
/// assert_eq!(positives, 10);
///
/// // The same seed deals the same level again
/// let again = ImageDeck::with_seed(seed).deal_training_set(&catalog[0], 20);
/// assert_eq!(images, again);
/// ```
#[derive(Debug, Clone)]
pub struct ImageDeck {
    rng: Pcg32,
}

impl Default for ImageDeck {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic image dealing.
///
/// A 128-bit seed, written as 32 hexadecimal characters in config files,
/// records and on the command line. Replaying a game with the same seed deals
/// the same images in every level.
///
/// # Example
///
/// ```
/// use rand::Rng as _;
/// use wallyfit_engine::GameSeed;
///
/// let seed: GameSeed = rand::rng().random();
/// let parsed: GameSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSeed([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SeedParseError {
    #[display("invalid hex: expected 32 characters, got {len}")]
    Length { len: usize },
    #[display("invalid hex: {input}")]
    Digits { input: String },
}

impl GameSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for GameSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for GameSeed {
    type Err = SeedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(SeedParseError::Length { len: s.len() });
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| SeedParseError::Digits {
            input: s.to_owned(),
        })?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for GameSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `GameSeed` values with `rng.random()`.
impl Distribution<GameSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GameSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        GameSeed(seed)
    }
}

impl ImageDeck {
    /// Creates a deck with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: GameSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }

    /// Deals a balanced, shuffled training set of `size` images.
    ///
    /// # Panics
    ///
    /// Panics if the category has no training images (rejected by
    /// [`GameConfig::validate`](crate::GameConfig::validate)).
    pub fn deal_training_set(&mut self, category: &Category, size: usize) -> Vec<AnnotationRecord> {
        assert!(
            !category.images.is_empty(),
            "category {:?} has no training images",
            category.name
        );
        let mut pool: Vec<_> = category.images.iter().collect();
        pool.shuffle(&mut self.rng);

        let positives = size / 2;
        let mut records: Vec<_> = pool
            .into_iter()
            .cycle()
            .take(size)
            .enumerate()
            .map(|(index, source)| {
                AnnotationRecord::new(ImageId::training(index), source.clone(), index < positives)
            })
            .collect();
        records.shuffle(&mut self.rng);
        records
    }

    /// Returns the held-out test images of a category, first half positive.
    #[must_use]
    pub fn test_set(category: &Category) -> Vec<TestImage> {
        let positives = category.test_images.len().div_ceil(2);
        category
            .test_images
            .iter()
            .enumerate()
            .map(|(index, source)| {
                TestImage::new(ImageId::test(index), source.clone(), index < positives)
            })
            .collect()
    }

    /// Rolls a simulated prediction for a model of the given accuracy.
    pub fn roll_prediction(&mut self, image: ImageContent<'_>, accuracy: u8) -> Prediction {
        simulate_prediction(image, accuracy, &mut self.rng)
    }

    /// Chooses a test image that matches the progress of a model trained on
    /// `examples` annotations.
    ///
    /// Every test image of the category gets a simulated prediction at
    /// `accuracy` and is rated with [`Difficulty::from_confidence`]; one image
    /// of the [recommended](Difficulty::recommended) difficulty is then
    /// picked, or of the nearest difficulty available. Returns `None` below
    /// [`MIN_EXAMPLES_FOR_TEST_SELECTION`] examples or without test images.
    pub fn pick_test_image(
        &mut self,
        category: &Category,
        examples: usize,
        accuracy: u8,
    ) -> Option<TestImagePick> {
        if examples < MIN_EXAMPLES_FOR_TEST_SELECTION {
            return None;
        }
        let candidates: Vec<_> = Self::test_set(category)
            .into_iter()
            .map(|image| {
                let prediction = self.roll_prediction(image.content(), accuracy);
                let difficulty = Difficulty::from_confidence(prediction.confidence, examples);
                let pick = TestImagePick {
                    image,
                    prediction,
                    difficulty,
                };
                (pick, difficulty)
            })
            .collect();
        select_by_difficulty(&candidates, Difficulty::recommended(examples), &mut self.rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builtin_catalog;

    fn seed_from_bytes(bytes: [u8; 16]) -> GameSeed {
        GameSeed(bytes)
    }

    mod game_seed_serialization {
        use super::*;

        #[test]
        fn test_roundtrip_random_seed() {
            let seed: GameSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let deserialized: GameSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(seed, deserialized);
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = seed_from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();

            // Big-endian: bytes appear in order as hex pairs
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
        }

        #[test]
        fn test_parse_accepts_uppercase_hex() {
            let seed: GameSeed = "0123456789ABCDEFFEDCBA9876543210".parse().unwrap();
            assert_eq!(seed.to_bytes()[0], 0x01);
            assert_eq!(seed.to_bytes()[15], 0x10);
        }

        #[test]
        fn test_parse_errors() {
            assert_eq!(
                "0123".parse::<GameSeed>(),
                Err(SeedParseError::Length { len: 4 })
            );
            assert!(matches!(
                "ghijklmnopqrstuvwxyzghijklmnopqr".parse::<GameSeed>(),
                Err(SeedParseError::Digits { .. })
            ));

            let result: Result<GameSeed, _> = serde_json::from_str("\"\"");
            let err_msg = result.unwrap_err().to_string();
            assert!(err_msg.contains("invalid hex"));
        }
    }

    mod dealing {
        use super::*;

        #[test]
        fn test_training_set_is_balanced_with_unique_ids() {
            let catalog = builtin_catalog();
            let mut deck = ImageDeck::with_seed(seed_from_bytes([7; 16]));
            for size in [2, 8, 20] {
                let images = deck.deal_training_set(&catalog[0], size);
                assert_eq!(images.len(), size);
                assert_eq!(images.iter().filter(|r| r.has_object()).count(), size / 2);
                assert!(images.iter().all(|r| !r.is_annotated()));

                let mut ids: Vec<_> = images.iter().map(|r| r.image_id().clone()).collect();
                ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                ids.dedup();
                assert_eq!(ids.len(), size);
            }
        }

        #[test]
        fn test_small_pool_is_cycled() {
            let mut category = builtin_catalog().remove(0);
            category.images.truncate(3);
            let images = ImageDeck::with_seed(seed_from_bytes([1; 16])).deal_training_set(&category, 10);
            assert_eq!(images.len(), 10);
            assert_eq!(images.iter().filter(|r| r.has_object()).count(), 5);
        }

        #[test]
        fn test_deterministic_dealing() {
            let catalog = builtin_catalog();
            let seed = seed_from_bytes([
                0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
                0x77, 0x88,
            ]);
            let mut deck1 = ImageDeck::with_seed(seed);
            let mut deck2 = ImageDeck::with_seed(seed);
            for category in catalog.iter().cycle().take(4) {
                assert_eq!(
                    deck1.deal_training_set(category, 20),
                    deck2.deal_training_set(category, 20)
                );
            }
        }

        #[test]
        fn test_test_set_first_half_positive() {
            let catalog = builtin_catalog();
            let labels: Vec<bool> = ImageDeck::test_set(&catalog[1])
                .iter()
                .map(TestImage::has_object)
                .collect();
            assert_eq!(labels, [[true; 5], [false; 5]].concat());

            // odd-sized pools round the positive half up
            let labels: Vec<bool> = ImageDeck::test_set(&catalog[0])
                .iter()
                .map(TestImage::has_object)
                .collect();
            assert_eq!(labels, [true, true, true, false, false]);
        }
    }

    mod test_image_picking {
        use super::*;

        #[test]
        fn test_too_few_examples_keep_the_level_image() {
            let catalog = builtin_catalog();
            let mut deck = ImageDeck::with_seed(seed_from_bytes([4; 16]));
            assert_eq!(deck.pick_test_image(&catalog[0], 0, 30), None);
            assert_eq!(deck.pick_test_image(&catalog[0], 2, 36), None);
        }

        #[test]
        fn test_pick_comes_from_the_test_set_and_is_rated() {
            let catalog = builtin_catalog();
            let test_set = ImageDeck::test_set(&catalog[0]);
            let mut deck = ImageDeck::with_seed(seed_from_bytes([4; 16]));
            for examples in [3, 5, 10, 20] {
                let pick = deck.pick_test_image(&catalog[0], examples, 80).unwrap();
                assert!(test_set.contains(&pick.image));
                assert_eq!(
                    pick.difficulty,
                    Difficulty::from_confidence(pick.prediction.confidence, examples)
                );
            }
        }

        #[test]
        fn test_same_seed_same_pick() {
            let catalog = builtin_catalog();
            let pick = |seed| {
                ImageDeck::with_seed(seed_from_bytes(seed)).pick_test_image(&catalog[1], 10, 70)
            };
            assert_eq!(pick([8; 16]), pick([8; 16]));
        }

        #[test]
        fn test_many_examples_never_get_easy_images() {
            // with 8+ examples images rate as medium or hard only
            let catalog = builtin_catalog();
            let mut deck = ImageDeck::with_seed(seed_from_bytes([6; 16]));
            for _ in 0..50 {
                let pick = deck.pick_test_image(&catalog[0], 12, 66).unwrap();
                assert_ne!(pick.difficulty, Difficulty::Easy);
            }
        }
    }
}
