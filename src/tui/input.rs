use crossterm::event::KeyCode;

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    TogglePause,
    DeleteHead,
    ClearError,
    None,
}

/// Map a key press to a UI action.
pub fn map_key(code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') | KeyCode::Char(' ') => Action::TogglePause,
        KeyCode::Char('d') => Action::DeleteHead,
        KeyCode::Char('c') => Action::ClearError,
        _ => Action::None,
    }
}
