use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::debug;

use crate::{
    config::ScoringRules,
    core::{BoundingBox, ImageContent, ImageId},
    engine::GameSeed,
};

use super::classifier::{ClassifierError, FeatureClassifier, Label, Prediction};

/// Rolls a prediction for a model with the given accuracy (percent).
///
/// The prediction is right with probability `accuracy / 100`. Right answers
/// get a confidence in `0.7..1.0`, wrong ones in `0.4..0.7`.
///
/// # Example
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
/// use wallyfit_engine::{ImageContent, Label, simulate_prediction};
///
/// let source = "crowd.png".into();
/// let image = ImageContent { source: &source, contains_object: true };
/// let mut rng = Pcg32::seed_from_u64(0);
///
/// // A perfect model is always right and confident
/// let prediction = simulate_prediction(image, 100, &mut rng);
/// assert_eq!(prediction.label, Label::Object);
/// assert!(prediction.confidence >= 0.7);
/// ```
pub fn simulate_prediction<R>(image: ImageContent<'_>, accuracy: u8, rng: &mut R) -> Prediction
where
    R: Rng + ?Sized,
{
    let probability = f64::from(accuracy.min(100)) / 100.0;
    let correct = rng.random_bool(probability);
    let (label, confidence) = if correct {
        (image.contains_object, rng.random_range(0.7..1.0))
    } else {
        (!image.contains_object, rng.random_range(0.4..0.7))
    };
    Prediction {
        label: Label::from_presence(label),
        confidence,
    }
}

/// Offline [`FeatureClassifier`].
///
/// Remembers whether each image's latest label matched it and predicts as
/// well as the scoring rules say a model trained on those examples would.
#[derive(Debug)]
pub struct SimulatedClassifier {
    rules: ScoringRules,
    latency: Option<Duration>,
    state: Mutex<SimulatedState>,
}

#[derive(Debug)]
struct SimulatedState {
    loaded: bool,
    examples: HashMap<ImageId, bool>,
    rng: Pcg32,
}

impl SimulatedClassifier {
    #[must_use]
    pub fn new(rules: ScoringRules, seed: GameSeed) -> Self {
        Self {
            rules,
            latency: None,
            state: Mutex::new(SimulatedState {
                loaded: false,
                examples: HashMap::new(),
                rng: Pcg32::from_seed(seed.to_bytes()),
            }),
        }
    }

    /// Makes every prediction block for `latency`, like a real model would.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accuracy(&self, examples: &HashMap<ImageId, bool>) -> u8 {
        let correct = examples.values().filter(|matched| **matched).count();
        self.rules.accuracy_from_counts(examples.len(), correct)
    }
}

impl FeatureClassifier for SimulatedClassifier {
    fn load(&self) -> Result<(), ClassifierError> {
        self.state().loaded = true;
        debug!("simulated classifier loaded");
        Ok(())
    }

    fn add_example(
        &self,
        image_id: &ImageId,
        image: ImageContent<'_>,
        _region: Option<&BoundingBox>,
        label: Label,
    ) -> Result<(), ClassifierError> {
        let mut state = self.state();
        if !state.loaded {
            return Err(ClassifierError::NotLoaded);
        }
        state
            .examples
            .insert(image_id.clone(), label.has_object() == image.contains_object);
        Ok(())
    }

    fn predict(&self, image: ImageContent<'_>) -> Result<Option<Prediction>, ClassifierError> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        let mut state = self.state();
        if !state.loaded {
            return Err(ClassifierError::NotLoaded);
        }
        if state.examples.is_empty() {
            return Ok(None);
        }
        let accuracy = self.accuracy(&state.examples);
        Ok(Some(simulate_prediction(image, accuracy, &mut state.rng)))
    }

    fn example_count(&self) -> usize {
        self.state().examples.len()
    }

    fn reset(&self) {
        self.state().examples.clear();
    }

    fn dispose(&self) {
        let mut state = self.state();
        state.loaded = false;
        state.examples.clear();
    }
}
