use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block as BlockWidget, Paragraph, Widget, Wrap},
};
use wallyfit_engine::{GameView, Label, PredictionSource, TrainingSummary};

use crate::ui::widgets::style;

/// Fit state, feedback, the test-image prediction and what the player has
/// taught the model so far.
#[derive(Debug)]
pub struct ModelPanelDisplay<'a> {
    view: &'a GameView,
    summary: &'a TrainingSummary,
    block: Option<BlockWidget<'a>>,
}

impl<'a> ModelPanelDisplay<'a> {
    pub fn new(view: &'a GameView, summary: &'a TrainingSummary) -> Self {
        Self {
            view,
            summary,
            block: None,
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let view = self.view;
        let summary = self.summary;
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Model: ", style::DIM),
                Span::styled(view.fit_state.to_string(), style::fit_state(view.fit_state)),
                Span::styled(format!("  {}%", view.accuracy), style::DEFAULT),
            ]),
            Line::styled(view.feedback.to_string(), style::DEFAULT),
            Line::default(),
        ];
        let mut test_image = vec![
            Span::styled("Test image: ", style::DIM),
            Span::styled(view.test_image.source().as_str(), style::DEFAULT),
        ];
        if let Some(difficulty) = view.test_difficulty {
            test_image.push(Span::styled(format!(" ({difficulty})"), style::DIM));
        }
        lines.push(Line::from(test_image));

        match view.prediction {
            Some(prediction) => {
                let label = match prediction.prediction.label {
                    Label::Object => format!("{} found", view.target_object),
                    Label::NoObject => format!("no {}", view.target_object),
                };
                let source = match prediction.source {
                    PredictionSource::Simulated => "simulated",
                    PredictionSource::Classifier => "classifier",
                };
                lines.push(Line::from(vec![
                    Span::styled("Prediction: ", style::DIM),
                    Span::styled(label, style::KEY),
                    Span::styled(
                        format!(
                            " ({:.0}% sure, {source})",
                            prediction.prediction.confidence * 100.0
                        ),
                        style::DIM,
                    ),
                ]));
            }
            None => lines.push(Line::styled("Prediction: train the model first", style::DIM)),
        }
        if let Some(message) = view.confidence_message {
            lines.push(Line::styled(message, style::DIM));
        }

        lines.extend([
            Line::default(),
            Line::styled(
                format!(
                    "Examples: {} with {}, {} without",
                    summary.positive_examples, view.target_object, summary.negative_examples
                ),
                style::DEFAULT,
            ),
            Line::styled(
                format!(
                    "Average box area: {:.1}%  Next challenge: {}",
                    summary.average_box_area / 100.0,
                    summary.recommended_difficulty
                ),
                style::DIM,
            ),
        ]);
        lines
    }
}

impl Widget for ModelPanelDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut paragraph = Paragraph::new(Text::from(self.lines())).wrap(Wrap { trim: true });
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
