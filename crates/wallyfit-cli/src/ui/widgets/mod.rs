pub use self::{
    box_display::*, dialog_display::*, header_display::*, help_bar::*, image_list_display::*,
    model_panel_display::*,
};

mod box_display;
mod dialog_display;
mod header_display;
mod help_bar;
mod image_list_display;
mod model_panel_display;

mod color {
    use ratatui::style::Color;

    pub const GREEN: Color = Color::Rgb(0, 200, 0);
    pub const YELLOW: Color = Color::Rgb(230, 200, 0);
    pub const RED: Color = Color::Rgb(220, 40, 40);
    pub const CYAN: Color = Color::Rgb(0, 200, 220);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

pub mod style {
    use ratatui::style::{Color, Modifier, Style};
    use wallyfit_engine::FitState;

    use crate::ui::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const DIM: Style = fg_bg(color::GRAY, color::BLACK);
    pub const KEY: Style = fg_bg(color::CYAN, color::BLACK);
    pub const CURSOR: Style = fg_bg(color::BLACK, color::CYAN);
    pub const BOX: Style = fg_bg(color::YELLOW, color::BLACK);
    pub const WARNING: Style = fg_bg(color::BLACK, color::YELLOW);

    pub fn fit_state(fit_state: FitState) -> Style {
        let fg = match fit_state {
            FitState::Underfitting => color::YELLOW,
            FitState::Correct => color::GREEN,
            FitState::Overfitting => color::RED,
        };
        fg_bg(fg, color::BLACK).add_modifier(Modifier::BOLD)
    }

    pub fn accuracy(accuracy: u8, threshold: u8) -> Style {
        let fg = if accuracy >= threshold {
            color::GREEN
        } else {
            color::YELLOW
        };
        fg_bg(fg, color::BLACK)
    }
}
