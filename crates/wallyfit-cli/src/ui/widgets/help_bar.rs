use ratatui::{
    prelude::{Buffer, Rect},
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::widgets::style;

/// One line of `key description` pairs.
#[derive(Debug)]
pub struct HelpBar<'a> {
    bindings: &'a [(&'a str, &'a str)],
}

impl<'a> HelpBar<'a> {
    pub fn new(bindings: &'a [(&'a str, &'a str)]) -> Self {
        Self { bindings }
    }
}

impl Widget for HelpBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans = self
            .bindings
            .iter()
            .enumerate()
            .flat_map(|(i, (key, description))| {
                let separator = (i > 0).then(|| Span::styled(" | ", style::DIM));
                separator.into_iter().chain([
                    Span::styled(*key, style::KEY),
                    Span::styled(format!(" {description}"), style::DIM),
                ])
            })
            .collect::<Vec<_>>();
        Line::from(spans).centered().render(area, buf);
    }
}
