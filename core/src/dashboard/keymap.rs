//! Symbolic shortcuts and their key bindings.
//!
//! Keys are identified by name: single characters (`"q"`, `"/"`, `"?"`),
//! named keys (`"up"`, `"esc"`, `"enter"`, `"space"`, `"backspace"`) and
//! modifier chords (`"ctrl+c"`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Dashboard actions a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shortcut {
    Quit,
    Up,
    Down,
    Search,
    Kill,
    Copy,
    ViewCommand,
    ViewLogs,
    ToggleGroup,
    ToggleDetails,
    SortByPort,
    SortByProcess,
    SortByPid,
    Help,
    Escape,
    Enter,
    Refresh,
}

impl Shortcut {
    pub const ALL: [Shortcut; 17] = [
        Shortcut::Quit,
        Shortcut::Up,
        Shortcut::Down,
        Shortcut::Search,
        Shortcut::Kill,
        Shortcut::Copy,
        Shortcut::ViewCommand,
        Shortcut::ViewLogs,
        Shortcut::ToggleGroup,
        Shortcut::ToggleDetails,
        Shortcut::SortByPort,
        Shortcut::SortByProcess,
        Shortcut::SortByPid,
        Shortcut::Help,
        Shortcut::Escape,
        Shortcut::Enter,
        Shortcut::Refresh,
    ];

    /// Name used in the `keyBindings` config section.
    pub fn name(&self) -> &'static str {
        match self {
            Shortcut::Quit => "Quit",
            Shortcut::Up => "Up",
            Shortcut::Down => "Down",
            Shortcut::Search => "Search",
            Shortcut::Kill => "Kill",
            Shortcut::Copy => "Copy",
            Shortcut::ViewCommand => "ViewCommand",
            Shortcut::ViewLogs => "ViewLogs",
            Shortcut::ToggleGroup => "ToggleGroup",
            Shortcut::ToggleDetails => "ToggleDetails",
            Shortcut::SortByPort => "SortByPort",
            Shortcut::SortByProcess => "SortByProcess",
            Shortcut::SortByPid => "SortByPid",
            Shortcut::Help => "Help",
            Shortcut::Escape => "Escape",
            Shortcut::Enter => "Enter",
            Shortcut::Refresh => "Refresh",
        }
    }

    /// One-line description for the help modal.
    pub fn description(&self) -> &'static str {
        match self {
            Shortcut::Quit => "Quit",
            Shortcut::Up => "Move selection up",
            Shortcut::Down => "Move selection down",
            Shortcut::Search => "Search ports",
            Shortcut::Kill => "Kill selected process",
            Shortcut::Copy => "Copy command to clipboard",
            Shortcut::ViewCommand => "Show full command",
            Shortcut::ViewLogs => "Show process logs",
            Shortcut::ToggleGroup => "Collapse or expand group",
            Shortcut::ToggleDetails => "Toggle details pane",
            Shortcut::SortByPort => "Sort by port",
            Shortcut::SortByProcess => "Sort by process name",
            Shortcut::SortByPid => "Sort by PID",
            Shortcut::Help => "Toggle help",
            Shortcut::Escape => "Close dialog or cancel search",
            Shortcut::Enter => "Confirm",
            Shortcut::Refresh => "Refresh now",
        }
    }

    fn default_keys(&self) -> &'static [&'static str] {
        match self {
            Shortcut::Quit => &["q", "ctrl+c"],
            Shortcut::Up => &["up", "k"],
            Shortcut::Down => &["down", "j"],
            Shortcut::Search => &["/"],
            Shortcut::Kill => &["x"],
            Shortcut::Copy => &["c"],
            Shortcut::ViewCommand => &["v"],
            Shortcut::ViewLogs => &["l"],
            Shortcut::ToggleGroup => &["space"],
            Shortcut::ToggleDetails => &["d"],
            Shortcut::SortByPort => &["p"],
            Shortcut::SortByProcess => &["n"],
            Shortcut::SortByPid => &["i"],
            Shortcut::Help => &["?"],
            Shortcut::Escape => &["esc"],
            Shortcut::Enter => &["enter"],
            Shortcut::Refresh => &["r"],
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shortcut {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shortcut::ALL
            .iter()
            .copied()
            .find(|shortcut| shortcut.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("Unknown shortcut: {}", s)))
    }
}

/// Key name to shortcut lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<String, Shortcut>,
}

impl Keymap {
    /// A keymap with no bindings at all.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key` to `shortcut`, replacing whatever the key did before.
    pub fn bind(&mut self, key: impl Into<String>, shortcut: Shortcut) {
        self.bindings.insert(key.into(), shortcut);
    }

    /// Replace every key of `shortcut` with `keys`.
    pub fn rebind(&mut self, shortcut: Shortcut, keys: &[String]) {
        self.bindings.retain(|_, bound| *bound != shortcut);
        for key in keys {
            let key = key.trim();
            if !key.is_empty() {
                self.bind(key, shortcut);
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<Shortcut> {
        self.bindings.get(key).copied()
    }

    /// Keys bound to `shortcut`, sorted for display.
    pub fn keys_for(&self, shortcut: Shortcut) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == shortcut)
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Keymap::empty();
        for shortcut in Shortcut::ALL {
            for key in shortcut.default_keys() {
                keymap.bind(*key, shortcut);
            }
        }
        keymap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::default();
        assert_eq!(keymap.lookup("q"), Some(Shortcut::Quit));
        assert_eq!(keymap.lookup("ctrl+c"), Some(Shortcut::Quit));
        assert_eq!(keymap.lookup("k"), Some(Shortcut::Up));
        assert_eq!(keymap.lookup("down"), Some(Shortcut::Down));
        assert_eq!(keymap.lookup("/"), Some(Shortcut::Search));
        assert_eq!(keymap.lookup("x"), Some(Shortcut::Kill));
        assert_eq!(keymap.lookup("space"), Some(Shortcut::ToggleGroup));
        assert_eq!(keymap.lookup("esc"), Some(Shortcut::Escape));
        assert_eq!(keymap.lookup("z"), None);
    }

    #[test]
    fn test_every_shortcut_has_a_default_key() {
        let keymap = Keymap::default();
        for shortcut in Shortcut::ALL {
            assert!(!keymap.keys_for(shortcut).is_empty(), "{} unbound", shortcut);
        }
    }

    #[test]
    fn test_rebind_replaces_all_keys() {
        let mut keymap = Keymap::default();
        keymap.rebind(Shortcut::Up, &["w".to_string(), " ".to_string()]);

        assert_eq!(keymap.lookup("w"), Some(Shortcut::Up));
        assert_eq!(keymap.lookup("up"), None);
        assert_eq!(keymap.lookup("k"), None);
        assert_eq!(keymap.keys_for(Shortcut::Up), vec!["w"]);
    }

    #[test]
    fn test_rebind_steals_key_from_other_shortcut() {
        let mut keymap = Keymap::default();
        keymap.rebind(Shortcut::Kill, &["q".to_string()]);

        assert_eq!(keymap.lookup("q"), Some(Shortcut::Kill));
        assert_eq!(keymap.keys_for(Shortcut::Quit), vec!["ctrl+c"]);
    }

    #[test]
    fn test_parse_shortcut_names() {
        assert_eq!("ViewLogs".parse::<Shortcut>().unwrap(), Shortcut::ViewLogs);
        assert_eq!("sortbypid".parse::<Shortcut>().unwrap(), Shortcut::SortByPid);
        assert!("Explode".parse::<Shortcut>().is_err());
    }
}
