use std::sync::Arc;

use crate::core::TestImage;

use super::classifier::{ClassifierError, FeatureClassifier, Prediction};

/// Identifies the model a prediction was requested for.
///
/// The generation is bumped on every training and on every level change, so a
/// prediction that arrives after either is recognisably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredictionTicket {
    pub level: u32,
    pub generation: u64,
}

/// A classifier prediction for the current test image.
///
/// Owns everything it needs, so it can be moved to a worker thread and run
/// there while the game keeps going.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    ticket: PredictionTicket,
    classifier: Arc<dyn FeatureClassifier>,
    image: TestImage,
}

impl PredictionRequest {
    pub(crate) fn new(
        ticket: PredictionTicket,
        classifier: Arc<dyn FeatureClassifier>,
        image: TestImage,
    ) -> Self {
        Self {
            ticket,
            classifier,
            image,
        }
    }

    #[must_use]
    pub fn ticket(&self) -> PredictionTicket {
        self.ticket
    }

    #[must_use]
    pub fn image(&self) -> &TestImage {
        &self.image
    }

    /// Runs the prediction. May block for as long as the classifier takes.
    pub fn run(&self) -> Result<Option<Prediction>, ClassifierError> {
        self.classifier.predict(self.image.content())
    }
}
