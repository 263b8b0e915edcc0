use crossterm::event::Event as CrosstermEvent;

/// Events processed by the runner.
#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum TuiEvent {
    /// Time to poll background work.
    Tick,
    /// The screen is out of date.
    Render,
    /// Key input, mouse, resize and the like.
    Crossterm(CrosstermEvent),
}
