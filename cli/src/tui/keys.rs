//! Translate crossterm key events into keymap key names.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Name of a key press, or `None` for keys the dashboard never binds.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };

    // shift is already reflected in the character
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        Some(format!("ctrl+{}", base))
    } else if key.modifiers.contains(KeyModifiers::ALT) {
        Some(format!("alt+{}", base))
    } else {
        Some(base)
    }
}
