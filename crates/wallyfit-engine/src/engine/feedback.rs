use serde::Serialize;

use super::fit_state::FitState;

/// Status line shown to the player under the model panel.
///
/// The variants mirror the decision structure; `Display` renders the copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    #[display("Complete annotations and train the model to proceed ({annotated} annotated so far)")]
    TrainPrompt { annotated: usize },
    #[display("Model accuracy needs {shortfall}% more to reach the next level")]
    NeedsAccuracy { shortfall: u8 },
    #[display("Excellent model performance! Ready to challenge level {next_level}?")]
    ReadyToProceed { next_level: u32 },
    #[display("Model may be overfitting. Proceed to the next level anyway?")]
    MayBeOverfitting,
}

/// Text of the confirmation dialog shown while an overfitting model waits for
/// the player to either continue or go back and retrain.
pub const OVERFIT_WARNING: &str = "Your model may have memorized the training data and might \
     perform poorly on new data. Consider reducing annotation quantity or improving annotation \
     quality.";

/// Picks the feedback message for the current model.
///
/// `level` is the level being played and `advance_threshold` the accuracy
/// required to leave it.
///
/// # Example
///
/// ```
/// use wallyfit_engine::{Feedback, FitState, select_feedback};
///
/// let feedback = select_feedback(FitState::Underfitting, 45, 5, true, 1, 70);
/// assert_eq!(feedback, Feedback::NeedsAccuracy { shortfall: 25 });
/// ```
#[must_use]
pub fn select_feedback(
    fit_state: FitState,
    accuracy: u8,
    annotated_count: usize,
    has_trained_model: bool,
    level: u32,
    advance_threshold: u8,
) -> Feedback {
    if !has_trained_model {
        return Feedback::TrainPrompt {
            annotated: annotated_count,
        };
    }
    if accuracy < advance_threshold {
        return Feedback::NeedsAccuracy {
            shortfall: advance_threshold - accuracy,
        };
    }
    match fit_state {
        FitState::Overfitting => Feedback::MayBeOverfitting,
        // Advancing is gated on accuracy alone, so an accurate model that is
        // still classified as underfitting is let through like a correct one.
        FitState::Correct | FitState::Underfitting => Feedback::ReadyToProceed {
            next_level: level + 1,
        },
    }
}

/// Commentary on a classifier prediction, hedged while the classifier has
/// seen only a handful of examples.
#[must_use]
pub fn confidence_message(confidence: f32, example_count: usize) -> &'static str {
    if example_count < 3 {
        return "Learning to spot Wally's red-white striped shirt and bobble hat...";
    }
    if example_count < 5 {
        return "Studying Wally's round glasses, blue jeans, and brown shoes...";
    }

    #[expect(clippy::cast_precision_loss)]
    let uncertainty = (8usize.saturating_sub(example_count) as f32 * 0.06).max(0.0);
    let adjusted = (confidence - uncertainty).max(0.0);

    match adjusted {
        c if c < 0.4 => {
            "Where's Wally? Having trouble spotting his distinctive red-white striped shirt..."
        }
        c if c < 0.6 => "Hmm... maybe I see a bobble hat and glasses? Not quite sure...",
        c if c < 0.75 => {
            "Getting better at recognizing horizontal red-white stripes and round glasses..."
        }
        c if c < 0.85 => "I can spot Wally's striped shirt, bobble hat, and round black glasses!",
        c if c < 0.92 => "Found the red-white horizontal stripes, blue jeans, and brown shoes!",
        _ => "Found Wally! Red-white striped shirt, bobble hat, round glasses, and blue jeans - \
              perfect match!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untrained_model_prompts_for_training() {
        for fit_state in [FitState::Underfitting, FitState::Correct, FitState::Overfitting] {
            let feedback = select_feedback(fit_state, 80, 12, false, 1, 70);
            assert_eq!(feedback, Feedback::TrainPrompt { annotated: 12 });
        }
    }

    #[test]
    fn test_shortfall_is_computed() {
        assert_eq!(
            select_feedback(FitState::Underfitting, 45, 5, true, 1, 70),
            Feedback::NeedsAccuracy { shortfall: 25 }
        );
        assert_eq!(
            select_feedback(FitState::Overfitting, 69, 16, true, 3, 70),
            Feedback::NeedsAccuracy { shortfall: 1 }
        );
        assert_eq!(
            select_feedback(FitState::Underfitting, 45, 5, true, 1, 70).to_string(),
            "Model accuracy needs 25% more to reach the next level"
        );
    }

    #[test]
    fn test_accurate_models() {
        assert_eq!(
            select_feedback(FitState::Correct, 70, 14, true, 2, 70),
            Feedback::ReadyToProceed { next_level: 3 }
        );
        assert_eq!(
            select_feedback(FitState::Overfitting, 80, 20, true, 2, 70),
            Feedback::MayBeOverfitting
        );
    }

    #[test]
    fn test_messages_are_distinct() {
        let messages = [
            Feedback::TrainPrompt { annotated: 0 }.to_string(),
            Feedback::NeedsAccuracy { shortfall: 10 }.to_string(),
            Feedback::ReadyToProceed { next_level: 2 }.to_string(),
            Feedback::MayBeOverfitting.to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_confidence_message_hedges_with_few_examples() {
        let early = confidence_message(0.99, 2);
        assert!(early.starts_with("Learning"));
        assert!(confidence_message(0.99, 4).starts_with("Studying"));
        // 0.95 - (8 - 5) * 0.06 = 0.77
        assert!(confidence_message(0.95, 5).starts_with("I can spot"));
        assert!(confidence_message(0.95, 10).starts_with("Found Wally!"));
        assert!(confidence_message(0.1, 10).starts_with("Where's Wally?"));
    }
}
