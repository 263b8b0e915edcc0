//! Interfaces to the parts of the game that live outside the engine.
//!
//! - [`AnnotationStore`] - Persists every annotation the player makes
//! - [`FeatureClassifier`] - Learns from the annotations and predicts test images
//! - [`SimulatedClassifier`] - Offline stand-in for a real feature extractor
//! - [`PredictionRequest`] - A prediction job that may run off the game thread
//!
//! Collaborators are best effort: the controller logs their failures and keeps
//! playing with the deterministic fallback.

pub use self::{classifier::*, prediction::*, simulated::*, store::*};

mod classifier;
mod prediction;
mod simulated;
mod store;
