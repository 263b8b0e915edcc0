use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block as BlockWidget, BlockExt as _, Gauge, Widget},
};
use wallyfit_engine::GameView;

use crate::ui::widgets::style;

/// Level, task, score and the accuracy gauge.
#[derive(Debug)]
pub struct HeaderDisplay<'a> {
    view: &'a GameView,
    threshold: u8,
    block: Option<BlockWidget<'a>>,
}

impl<'a> HeaderDisplay<'a> {
    pub fn new(view: &'a GameView, threshold: u8) -> Self {
        Self {
            view,
            threshold,
            block: None,
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }
}

impl Widget for HeaderDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);
        let [info_area, gauge_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let view = self.view;
        Line::from(vec![
            Span::styled(format!("LEVEL {}", view.level), style::KEY),
            Span::styled(" | Find ", style::DIM),
            Span::styled(view.target_object.as_str(), style::DEFAULT),
            Span::styled(format!(" ({})", view.category), style::DIM),
            Span::styled(" | ", style::DIM),
            Span::styled(
                format!("{}/{} annotated", view.annotated_count, view.total_images),
                style::DEFAULT,
            ),
            Span::styled(" | Score ", style::DIM),
            Span::styled(view.score.to_string(), style::DEFAULT),
        ])
        .render(info_area, buf);

        let label = if view.phase.is_annotating() {
            format!("Accuracy {}% (live)", view.accuracy)
        } else {
            format!("Accuracy {}% (trained)", view.accuracy)
        };
        Gauge::default()
            .gauge_style(style::accuracy(view.accuracy, self.threshold))
            .percent(u16::from(view.accuracy.min(100)))
            .label(label)
            .render(gauge_area, buf);
    }
}
