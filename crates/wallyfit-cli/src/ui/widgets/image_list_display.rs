use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};
use wallyfit_engine::{Annotation, AnnotationRecord};

use crate::ui::widgets::style;

/// The level's training images with the player's answers. Ground truth is
/// never shown.
#[derive(Debug)]
pub struct ImageListDisplay<'a> {
    images: &'a [AnnotationRecord],
    cursor: usize,
    block: Option<BlockWidget<'a>>,
}

impl<'a> ImageListDisplay<'a> {
    pub fn new(images: &'a [AnnotationRecord], cursor: usize) -> Self {
        Self {
            images,
            cursor,
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

/// First row to show so that `cursor` stays visible in `height` rows.
fn scroll_offset(cursor: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    cursor.saturating_sub(height / 2).min(len - height)
}

fn describe(annotation: Option<&Annotation>) -> (&'static str, String) {
    match annotation {
        None => ("[ ]", "not annotated".to_owned()),
        Some(Annotation::Rejected) => ("[-]", "no object".to_owned()),
        Some(Annotation::Boxed(bbox)) => (
            "[x]",
            format!(
                "box at ({:.0}, {:.0}) {:.0}x{:.0}",
                bbox.x(),
                bbox.y(),
                bbox.width(),
                bbox.height()
            ),
        ),
    }
}

impl Widget for ImageListDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let height = usize::from(area.height);
        let offset = scroll_offset(self.cursor, self.images.len(), height);
        for (row, (index, record)) in self
            .images
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .enumerate()
        {
            let (mark, text) = describe(record.user_annotation());
            let line_style = if index == self.cursor {
                style::CURSOR
            } else {
                style::DEFAULT
            };
            let line = Line::from(vec![
                Span::raw(format!("{mark} {:<10} ", record.image_id())),
                Span::raw(text),
            ])
            .style(line_style);
            #[expect(clippy::cast_possible_truncation)]
            let y = area.y + row as u16;
            line.render(Rect::new(area.x, y, area.width, 1), buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        assert_eq!(scroll_offset(0, 20, 8), 0);
        assert_eq!(scroll_offset(3, 20, 8), 0);
        assert_eq!(scroll_offset(10, 20, 8), 6);
        assert_eq!(scroll_offset(19, 20, 8), 12);
        assert_eq!(scroll_offset(5, 4, 8), 0);
        assert_eq!(scroll_offset(5, 20, 0), 0);
        for cursor in 0..20 {
            let offset = scroll_offset(cursor, 20, 8);
            assert!((offset..offset + 8).contains(&cursor));
        }
    }
}
