use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Dashboard keybindings
pub struct KeyBindings {
    bindings: HashMap<KeyBinding, Action>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyBinding::new(KeyCode::Esc), Action::Quit);
        bindings.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);

        bindings.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        bindings.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        bindings.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        bindings.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        bindings.insert(KeyBinding::new(KeyCode::PageDown), Action::ScrollDown(10));
        bindings.insert(KeyBinding::new(KeyCode::PageUp), Action::ScrollUp(10));
        bindings.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        bindings.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);

        bindings.insert(KeyBinding::new(KeyCode::Char('u')), Action::ToggleUnreadyOnly);
        bindings.insert(KeyBinding::new(KeyCode::Char('x')), Action::DismissError);

        Self { bindings }
    }

    pub fn get_action(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings.get(&KeyBinding::from_event(event)).cloned()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        let bindings = KeyBindings::new();
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(bindings.get_action(&q), Some(Action::Quit));
        assert_eq!(bindings.get_action(&ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_unbound_key() {
        let bindings = KeyBindings::new();
        let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(bindings.get_action(&c), None);
    }
}
