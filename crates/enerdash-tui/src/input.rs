//! Keyboard handling for the dashboard.
//!
//! Key events map to [`Action`]s through a pure function so the bindings
//! are testable without a terminal, then [`apply_action`] mutates the
//! [`App`].

use crossterm::event::KeyCode;

use crate::app::{App, Mode};

/// What a key press means in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    NextPanel,
    PrevPanel,
    NextField,
    PrevField,
    /// Edit/toggle/cycle the selected field.
    Activate,
    Commit,
    Cancel,
    Backspace,
    Input(char),
    RangeMinDown,
    RangeMinUp,
    RangeMaxDown,
    RangeMaxUp,
}

/// Map a key press to an action.
pub fn handle_key(code: KeyCode, editing: bool) -> Action {
    if editing {
        return match code {
            KeyCode::Enter => Action::Commit,
            KeyCode::Esc => Action::Cancel,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Char(c) => Action::Input(c),
            _ => Action::None,
        };
    }

    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab => Action::NextPanel,
        KeyCode::BackTab => Action::PrevPanel,
        KeyCode::Down | KeyCode::Char('j') => Action::NextField,
        KeyCode::Up | KeyCode::Char('k') => Action::PrevField,
        KeyCode::Enter | KeyCode::Char('e') => Action::Activate,
        KeyCode::Char('h') => Action::RangeMinDown,
        KeyCode::Char('l') => Action::RangeMinUp,
        KeyCode::Char('H') => Action::RangeMaxDown,
        KeyCode::Char('L') => Action::RangeMaxUp,
        _ => Action::None,
    }
}

/// Apply an action to the app state.
pub fn apply_action(app: &mut App, action: Action) {
    match action {
        Action::None => {}
        Action::Quit => app.should_quit = true,
        Action::NextPanel => app.move_panel(1),
        Action::PrevPanel => app.move_panel(-1),
        Action::NextField => app.move_field(1),
        Action::PrevField => app.move_field(-1),
        Action::Activate => app.activate(),
        Action::Commit => app.commit_edit(),
        Action::Cancel => app.cancel_edit(),
        Action::Backspace => app.backspace(),
        Action::Input(c) => app.input_char(c),
        Action::RangeMinDown => app.range_step(true, false),
        Action::RangeMinUp => app.range_step(true, true),
        Action::RangeMaxDown => app.range_step(false, false),
        Action::RangeMaxUp => app.range_step(false, true),
    }
}

/// Whether the app is currently capturing text input.
pub fn is_editing(app: &App) -> bool {
    matches!(app.mode, Mode::Editing { .. })
}
