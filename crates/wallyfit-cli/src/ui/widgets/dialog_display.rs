use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Paragraph, Widget, Wrap},
};

use crate::ui::widgets::{HelpBar, style};

/// Modal confirmation shown over the rest of the screen.
#[derive(Debug)]
pub struct DialogDisplay<'a> {
    title: &'a str,
    message: &'a str,
    choices: &'a [(&'a str, &'a str)],
}

impl<'a> DialogDisplay<'a> {
    pub fn new(title: &'a str, message: &'a str, choices: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            title,
            message,
            choices,
        }
    }
}

impl Widget for DialogDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [area] = Layout::vertical([Constraint::Length(9)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(60)])
            .flex(Flex::Center)
            .areas(area);
        let block = Block::bordered()
            .title(Line::from(self.title).centered())
            .padding(Padding::horizontal(1))
            .style(style::WARNING);
        let inner = block.inner(area);
        Clear.render(area, buf);
        block.render(area, buf);

        let [message_area, choices_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
        Paragraph::new(Text::from(self.message))
            .wrap(Wrap { trim: true })
            .render(message_area, buf);
        HelpBar::new(self.choices).render(choices_area, buf);
    }
}
