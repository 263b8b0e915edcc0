use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::Marker,
    widgets::{
        Block as BlockWidget, Widget,
        canvas::{Canvas, Rectangle},
    },
};
use wallyfit_engine::BoundingBox;

use crate::ui::widgets::{color, style};

/// The image frame with a bounding box drawn in percent coordinates.
#[derive(Debug)]
pub struct BoxDisplay<'a> {
    bbox: Option<BoundingBox>,
    editing: bool,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoxDisplay<'a> {
    pub fn new(bbox: Option<BoundingBox>) -> Self {
        Self {
            bbox,
            editing: false,
            block: None,
        }
    }

    pub fn editing(self, editing: bool) -> Self {
        Self { editing, ..self }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }
}

impl Widget for BoxDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let box_color = if self.editing {
            color::YELLOW
        } else {
            color::CYAN
        };
        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .background_color(color::BLACK)
            .x_bounds([0.0, 100.0])
            .y_bounds([0.0, 100.0])
            .paint(|ctx| {
                let Some(bbox) = self.bbox else {
                    return;
                };
                // canvas y grows upwards, image y grows downwards
                ctx.draw(&Rectangle {
                    x: f64::from(bbox.x()),
                    y: f64::from(100.0 - bbox.y() - bbox.height()),
                    width: f64::from(bbox.width()),
                    height: f64::from(bbox.height()),
                    color: box_color,
                });
            });
        if let Some(block) = self.block {
            canvas = canvas.block(block.style(style::BOX));
        }
        canvas.render(area, buf);
    }
}
