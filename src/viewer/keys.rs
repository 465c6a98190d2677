//! Keyboard input as the viewer understands it.

use serde::{Deserialize, Serialize};

/// Keys with a grid binding. Anything else is left to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    F2,
    /// A printable key, lowercased
    Char(char),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Option<Self> {
        let key = match key {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "F2" => Self::F2,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c.to_ascii_lowercase()),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Row and column step of an arrow key.
    pub fn arrow_delta(self) -> Option<(i32, i32)> {
        match self {
            Self::ArrowUp => Some((-1, 0)),
            Self::ArrowDown => Some((1, 0)),
            Self::ArrowLeft => Some((0, -1)),
            Self::ArrowRight => Some((0, 1)),
            _ => None,
        }
    }
}

/// Modifier state of a key press. `command` is Ctrl, or Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub command: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        command: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        command: false,
    };

    pub const COMMAND: Self = Self {
        shift: false,
        command: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ArrowUp" => Some(Key::ArrowUp))]
    #[test_case("Esc" => Some(Key::Escape))]
    #[test_case("A" => Some(Key::Char('a')))]
    #[test_case("é" => Some(Key::Char('é')))]
    #[test_case("Tab" => None)]
    #[test_case("" => None)]
    fn test_from_dom(key: &str) -> Option<Key> {
        Key::from_dom(key)
    }

    #[test]
    fn test_arrow_delta() {
        assert_eq!(Key::ArrowLeft.arrow_delta(), Some((0, -1)));
        assert_eq!(Key::Enter.arrow_delta(), None);
    }
}
