use crossterm::event::Event;
use ratatui::Frame;

use crate::tui::Tui;

/// Application driven by [`Tui::run`].
pub trait App {
    /// Called once before the first event. Use this to set the tick rate.
    fn init(&mut self, tui: &mut Tui);

    fn should_exit(&self) -> bool;

    /// Handles key input, resize and other terminal events.
    fn handle_event(&mut self, tui: &mut Tui, event: Event);

    fn draw(&self, frame: &mut Frame);

    /// Polls background work on every tick. Returns whether anything visible
    /// changed, which schedules a redraw.
    fn update(&mut self, tui: &mut Tui) -> bool;
}
