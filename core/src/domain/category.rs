//! Port categories assigned by the type classifier.

use serde::{Deserialize, Serialize};

/// Semantic role of a listening port.
///
/// The built-in categories have fixed display labels. User presets may name
/// any other category, which is carried as [`PortCategory::Custom`] and
/// displayed with the generic "Other" label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PortCategory {
    DevServer,
    Api,
    Database,
    Storybook,
    Testing,
    /// Well-known risky ports (SSH, databases, web) not claimed by any other rule.
    Unexpected,
    #[default]
    Other,
    Custom(String),
}

impl PortCategory {
    /// Stable identifier used in presets, group ids and JSON output.
    pub fn as_str(&self) -> &str {
        match self {
            PortCategory::DevServer => "dev-server",
            PortCategory::Api => "api",
            PortCategory::Database => "database",
            PortCategory::Storybook => "storybook",
            PortCategory::Testing => "testing",
            PortCategory::Unexpected => "unexpected",
            PortCategory::Other => "other",
            PortCategory::Custom(name) => name,
        }
    }

    /// Human-readable group label.
    pub fn display_name(&self) -> &'static str {
        match self {
            PortCategory::DevServer => "Dev Servers",
            PortCategory::Api => "APIs",
            PortCategory::Database => "Databases",
            PortCategory::Storybook => "Storybook",
            PortCategory::Testing => "Testing",
            PortCategory::Unexpected => "⚠️ Unexpected Ports",
            PortCategory::Other => "Other Services",
            PortCategory::Custom(_) => "Other",
        }
    }

    pub fn is_unexpected(&self) -> bool {
        matches!(self, PortCategory::Unexpected)
    }
}

impl From<&str> for PortCategory {
    fn from(name: &str) -> Self {
        match name {
            "dev-server" => PortCategory::DevServer,
            "api" => PortCategory::Api,
            "database" => PortCategory::Database,
            "storybook" => PortCategory::Storybook,
            "testing" => PortCategory::Testing,
            "unexpected" => PortCategory::Unexpected,
            "other" => PortCategory::Other,
            custom => PortCategory::Custom(custom.to_string()),
        }
    }
}

impl From<String> for PortCategory {
    fn from(name: String) -> Self {
        PortCategory::from(name.as_str())
    }
}

impl From<PortCategory> for String {
    fn from(category: PortCategory) -> Self {
        category.as_str().to_string()
    }
}

impl std::fmt::Display for PortCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(PortCategory::DevServer.display_name(), "Dev Servers");
        assert_eq!(PortCategory::Api.display_name(), "APIs");
        assert_eq!(PortCategory::Database.display_name(), "Databases");
        assert_eq!(PortCategory::Storybook.display_name(), "Storybook");
        assert_eq!(PortCategory::Testing.display_name(), "Testing");
        assert_eq!(PortCategory::Unexpected.display_name(), "⚠️ Unexpected Ports");
        assert_eq!(PortCategory::Other.display_name(), "Other Services");
    }

    #[test]
    fn test_unknown_category_falls_back_to_other_label() {
        let custom = PortCategory::from("message-queue");
        assert_eq!(custom, PortCategory::Custom("message-queue".to_string()));
        assert_eq!(custom.display_name(), "Other");
        assert_eq!(custom.as_str(), "message-queue");
    }

    #[test]
    fn test_serde_uses_identifier() {
        let json = serde_json::to_string(&PortCategory::DevServer).unwrap();
        assert_eq!(json, "\"dev-server\"");

        let parsed: PortCategory = serde_json::from_str("\"database\"").unwrap();
        assert_eq!(parsed, PortCategory::Database);
    }
}
