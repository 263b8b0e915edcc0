use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    text::Line,
    widgets::Block,
};
use tracing::{debug, warn};
use wallyfit_assist::ClassifierAssist;
use wallyfit_engine::{
    AdvanceOutcome, Annotation, BoundingBox, GameController, ImageId, Phase,
};

use crate::{
    tui::{App, Tui},
    ui::widgets::{
        BoxDisplay, DialogDisplay, HeaderDisplay, HelpBar, ImageListDisplay, ModelPanelDisplay,
        style,
    },
};

const TICK_RATE: f64 = 20.0;
/// Box editor step in percent of the image.
const BOX_STEP: f32 = 2.0;
const IMAGE_EXTENT: f32 = 100.0;
const DEFAULT_ANCHOR: (f32, f32) = (35.0, 35.0);
const DEFAULT_CORNER: (f32, f32) = (65.0, 65.0);

const BROWSE_KEYS: &[(&str, &str)] = &[
    ("↑↓", "Select"),
    ("b", "Draw box"),
    ("n", "No object"),
    ("t", "Train"),
    ("l", "Next level"),
    ("q", "Quit"),
];
const EDIT_KEYS: &[(&str, &str)] = &[
    ("←↑↓→", "Move"),
    ("Shift+←↑↓→", "Drag corner"),
    ("Enter", "Confirm"),
    ("Esc", "Cancel"),
];
const DIALOG_KEYS: &[(&str, &str)] = &[("y", "Continue anyway"), ("n", "Retrain model")];

/// A bounding box being drawn on one image.
///
/// The box is spanned by a fixed `anchor` and the `corner` the player drags,
/// so dragging past the anchor flips the box instead of stopping at zero.
#[derive(Debug, Clone)]
struct BoxEditor {
    image_id: ImageId,
    anchor: (f32, f32),
    corner: (f32, f32),
}

impl BoxEditor {
    fn new(image_id: ImageId, bbox: &BoundingBox) -> Self {
        Self {
            image_id,
            anchor: (bbox.x(), bbox.y()),
            corner: (bbox.x() + bbox.width(), bbox.y() + bbox.height()),
        }
    }

    fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_corners(self.anchor, self.corner).ok()
    }

    fn drag_corner(&mut self, dx: f32, dy: f32) {
        self.corner = (
            (self.corner.0 + dx).clamp(0.0, IMAGE_EXTENT),
            (self.corner.1 + dy).clamp(0.0, IMAGE_EXTENT),
        );
    }

    /// Moves the whole box, stopping at the image edges.
    fn translate(&mut self, dx: f32, dy: f32) {
        let Some(bbox) = self.bbox() else {
            return;
        };
        let moved = bbox.translated(dx, dy);
        let (dx, dy) = (moved.x() - bbox.x(), moved.y() - bbox.y());
        self.anchor = (self.anchor.0 + dx, self.anchor.1 + dy);
        self.corner = (self.corner.0 + dx, self.corner.1 + dy);
    }
}

#[derive(Debug)]
pub struct PlayApp {
    controller: GameController,
    assist: ClassifierAssist,
    cursor: usize,
    editor: Option<BoxEditor>,
    status: String,
    is_exiting: bool,
}

impl PlayApp {
    pub fn new(controller: GameController, assist: ClassifierAssist) -> Self {
        let status = format!(
            "Find {} in the images, then train your model",
            controller.state().category().target_object
        );
        Self {
            controller,
            assist,
            cursor: 0,
            editor: None,
            status,
            is_exiting: false,
        }
    }

    pub fn into_controller(mut self) -> GameController {
        self.assist.shutdown();
        self.controller
    }

    fn selected_id(&self) -> Option<ImageId> {
        self.controller
            .state()
            .images()
            .get(self.cursor)
            .map(|record| record.image_id().clone())
    }

    fn move_cursor(&mut self, forward: bool) {
        let len = self.controller.state().images().len();
        if len == 0 {
            return;
        }
        self.cursor = if forward {
            (self.cursor + 1) % len
        } else {
            (self.cursor + len - 1) % len
        };
    }

    /// Jumps to the next image without an annotation, if any.
    fn advance_cursor(&mut self) {
        let images = self.controller.state().images();
        let len = images.len();
        if let Some(next) = (1..=len)
            .map(|offset| (self.cursor + offset) % len)
            .find(|&index| !images[index].is_annotated())
        {
            self.cursor = next;
        }
    }

    fn annotate_selected(&mut self, annotation: Annotation) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.controller.annotate(&id, annotation) {
            Ok(true) => {
                let view = self.controller.view();
                self.status = format!(
                    "{id} annotated, {} of {} done (estimated accuracy {}%)",
                    view.annotated_count, view.total_images, view.accuracy
                );
                self.advance_cursor();
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "annotation failed");
                self.status = e.to_string();
            }
        }
    }

    fn open_editor(&mut self) {
        let Some(record) = self.controller.state().images().get(self.cursor) else {
            return;
        };
        let editor = match record.user_annotation().and_then(Annotation::bounding_box) {
            Some(bbox) => BoxEditor::new(record.image_id().clone(), bbox),
            None => BoxEditor {
                image_id: record.image_id().clone(),
                anchor: DEFAULT_ANCHOR,
                corner: DEFAULT_CORNER,
            },
        };
        self.editor = Some(editor);
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = &mut self.editor else {
            return;
        };
        let resize = key.modifiers.contains(KeyModifiers::SHIFT);
        let (dx, dy) = match key.code {
            KeyCode::Left => (-BOX_STEP, 0.0),
            KeyCode::Right => (BOX_STEP, 0.0),
            KeyCode::Up => (0.0, -BOX_STEP),
            KeyCode::Down => (0.0, BOX_STEP),
            KeyCode::Enter => {
                let Some(bbox) = editor.bbox().filter(BoundingBox::is_intentional) else {
                    self.status = "The box is too small, make it bigger first".to_owned();
                    return;
                };
                self.editor = None;
                self.annotate_selected(Annotation::Boxed(bbox));
                return;
            }
            KeyCode::Esc => {
                self.editor = None;
                return;
            }
            _ => return,
        };
        if resize {
            editor.drag_corner(dx, dy);
        } else {
            editor.translate(dx, dy);
        }
    }

    fn train(&mut self) {
        let Some(report) = self.controller.train() else {
            self.status = "Annotate at least one image before training".to_owned();
            return;
        };
        self.status = format!(
            "Model trained: {}% accuracy, {} (+{} points)",
            report.accuracy, report.fit_state, report.points
        );
        if let Some(request) = self.controller.prediction_request() {
            self.assist.submit(request);
        }
    }

    fn request_next_level(&mut self) {
        match self.controller.request_next_level() {
            AdvanceOutcome::Advanced { level } => self.level_started(level),
            AdvanceOutcome::NeedsConfirmation => {
                self.status = "Your model may be overfitting".to_owned();
            }
            AdvanceOutcome::Rejected(reason) => self.status = format!("Not yet: {reason}"),
        }
    }

    fn level_started(&mut self, level: u32) {
        self.cursor = 0;
        self.editor = None;
        self.status = format!(
            "Level {level}: find {}",
            self.controller.state().category().target_object
        );
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') => {
                if self.controller.confirm() {
                    self.level_started(self.controller.state().level());
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                if self.controller.cancel() {
                    self.status = "Improve your annotations and retrain".to_owned();
                }
            }
            KeyCode::Char('q') => self.is_exiting = true,
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Char('b') => self.open_editor(),
            KeyCode::Char('n') => self.annotate_selected(Annotation::Rejected),
            KeyCode::Char('t') => self.train(),
            KeyCode::Char('l') => self.request_next_level(),
            KeyCode::Char('q') => self.is_exiting = true,
            _ => {}
        }
    }
}

impl App for PlayApp {
    fn init(&mut self, tui: &mut Tui) {
        tui.set_tick_rate(TICK_RATE);
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, _tui: &mut Tui, event: Event) {
        let Some(key) = event.as_key_press_event() else {
            return;
        };
        if self.controller.phase() == Phase::AdvancePending {
            self.handle_dialog_key(key);
        } else if self.editor.is_some() {
            self.handle_editor_key(key);
        } else {
            self.handle_browse_key(key);
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let view = self.controller.view();
        let summary = self.controller.training_summary();
        let threshold = self.controller.config().advance_threshold;

        let [header_area, main_area, status_area, help_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [list_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).areas(main_area);
        let [box_area, model_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Fill(1)]).areas(detail_area);

        frame.render_widget(
            HeaderDisplay::new(&view, threshold).block(Block::bordered().style(style::DEFAULT)),
            header_area,
        );
        frame.render_widget(
            ImageListDisplay::new(self.controller.state().images(), self.cursor).block(
                Block::bordered()
                    .title(Line::from(" Training images "))
                    .style(style::DEFAULT),
            ),
            list_area,
        );

        let selected = self.controller.state().images().get(self.cursor);
        let (bbox, editing, title) = match (&self.editor, selected) {
            (Some(editor), _) => (
                editor.bbox(),
                true,
                format!(" Drawing on {} ", editor.image_id),
            ),
            (None, Some(record)) => (
                record
                    .user_annotation()
                    .and_then(Annotation::bounding_box)
                    .copied(),
                false,
                format!(" {} ", record.source().as_str()),
            ),
            (None, None) => (None, false, String::new()),
        };
        frame.render_widget(
            BoxDisplay::new(bbox)
                .editing(editing)
                .block(Block::bordered().title(Line::from(title))),
            box_area,
        );
        frame.render_widget(
            ModelPanelDisplay::new(&view, &summary).block(
                Block::bordered()
                    .title(Line::from(" Model "))
                    .style(style::DEFAULT),
            ),
            model_area,
        );

        frame.render_widget(
            Line::styled(self.status.as_str(), style::DEFAULT),
            status_area,
        );
        let keys = if view.pending_warning.is_some() {
            DIALOG_KEYS
        } else if self.editor.is_some() {
            EDIT_KEYS
        } else {
            BROWSE_KEYS
        };
        frame.render_widget(HelpBar::new(keys), help_area);

        if let Some(warning) = view.pending_warning {
            frame.render_widget(
                DialogDisplay::new(" Overfitting warning ", warning, DIALOG_KEYS),
                frame.area(),
            );
        }
    }

    fn update(&mut self, _tui: &mut Tui) -> bool {
        let mut changed = false;
        while let Some(outcome) = self.assist.try_next() {
            if outcome.apply_to(&mut self.controller) {
                debug!(ticket = ?outcome.ticket, "classifier prediction shown");
                changed = true;
            }
        }
        changed
    }
}
