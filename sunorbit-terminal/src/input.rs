/// Keyboard mapping for the terminal front end
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use sunorbit_core::SceneEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Scene(SceneEvent),
    Quit,
}

/// Map a key event to an action. Orbit keys also fire on auto-repeat so
/// holding an arrow keeps the camera moving; toggles fire once per press.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    let repeat = key.kind == KeyEventKind::Repeat;
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Left => Some(Action::Scene(SceneEvent::OrbitLeft)),
        KeyCode::Right => Some(Action::Scene(SceneEvent::OrbitRight)),
        _ if repeat => None,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::Scene(SceneEvent::ToggleLight)),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::Scene(SceneEvent::ToggleMaterial)),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}
