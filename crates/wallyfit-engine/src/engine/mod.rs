//! Game rules and state management.
//!
//! This module turns the player's annotations into a simulated model and
//! walks the player through the levels:
//!
//! - [`GameController`] - Level progression, scoring and collaborator calls
//! - [`GameLevelState`] - Images, annotations and model of the current level
//! - [`ScoringRules`](crate::ScoringRules) - Synthetic accuracy formula
//! - [`FitRules`](crate::FitRules) / [`FitState`] - Underfitting, correct or overfitting
//! - [`Feedback`] - Status message for the player
//! - [`ImageDeck`] / [`GameSeed`] - Deterministic, balanced image sets
//! - [`TrainingSummary`] - What the player has taught the model so far
//!
//! # Game Flow
//!
//! 1. The controller deals a balanced set of training images for level 1
//! 2. The player annotates images (box or "no object"); accuracy and fit state
//!    follow every annotation
//! 3. The player trains, freezing the accuracy and earning points
//! 4. With enough accuracy the player advances; an overfitting model needs an
//!    explicit confirmation first
//! 5. The next level starts from scratch, only the score carries over
//!
//! # Example
//!
//! ```
//! use wallyfit_engine::{AdvanceOutcome, AdvanceRejection, Annotation, GameController};
//!
//! let mut game = GameController::builder().build().unwrap();
//! assert_eq!(game.view().accuracy, 30);
//!
//! // Mark an image without the object as such
//! let id = game
//!     .state()
//!     .images()
//!     .iter()
//!     .find(|record| !record.has_object())
//!     .map(|record| record.image_id().clone())
//!     .unwrap();
//! game.annotate(&id, Annotation::Rejected).unwrap();
//! game.train().unwrap();
//!
//! assert_eq!(
//!     game.request_next_level(),
//!     AdvanceOutcome::Rejected(AdvanceRejection::AccuracyTooLow { accuracy: 33, required: 70 }),
//! );
//! ```

pub use self::{
    analysis::*, controller::*, feedback::*, fit_state::*, image_deck::*, level::*, scoring::*,
};

mod analysis;
mod controller;
mod feedback;
mod fit_state;
mod image_deck;
mod level;
mod scoring;
