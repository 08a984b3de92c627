//! Rule-based port type classification.

use super::{PortCategory, PortInfo, TypePreset};

/// Built-in preset table, highest priority first.
pub fn default_presets() -> Vec<TypePreset> {
    vec![
        TypePreset::new(PortCategory::Storybook, 10)
            .with_ports(&[6006])
            .with_command_patterns(&["storybook"])
            .with_process_patterns(&["storybook"]),
        TypePreset::new(PortCategory::DevServer, 9)
            .with_ports(&[3000, 3001, 5173, 4200, 8080, 8081, 4000])
            .with_command_patterns(&[
                "dev", "start", "serve", "vite", "next", "react", "angular", "webpack", "parcel",
            ])
            .with_process_patterns(&["node", "vite", "next", "react", "angular", "webpack", "parcel"]),
        TypePreset::new(PortCategory::Api, 8)
            .with_ports(&[8000, 8001, 4000, 3000, 3001])
            .with_command_patterns(&[
                "api", "server", "flask", "django", "fastapi", "uvicorn", "gunicorn", "express",
                "koa",
            ])
            .with_process_patterns(&[
                "python", "flask", "django", "fastapi", "uvicorn", "gunicorn", "node", "express",
                "koa",
            ]),
        TypePreset::new(PortCategory::Database, 7)
            .with_ports(&[5432, 3306, 27017, 6379, 5984, 9200, 1521, 1433])
            .with_process_patterns(&[
                "postgres",
                "postgresql",
                "mysql",
                "mariadb",
                "mongodb",
                "redis",
                "couchdb",
                "elasticsearch",
                "oracle",
                "mssql",
            ]),
        TypePreset::new(PortCategory::Testing, 6)
            .with_ports(&[9229, 9228])
            .with_command_patterns(&["jest", "test", "mocha", "jasmine", "karma"])
            .with_process_patterns(&["jest", "test", "mocha", "jasmine", "karma"]),
        TypePreset::new(PortCategory::Unexpected, 5)
            .with_ports(&[22, 80, 443, 3306, 5432, 27017, 6379]),
        TypePreset::new(PortCategory::Other, 0),
    ]
}

/// Assigns a category to each port from an ordered rule set.
///
/// Rules are evaluated by descending priority; equal priorities keep their
/// declaration order. The first matching rule wins and a port that matches
/// nothing is [`PortCategory::Other`].
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    presets: Vec<TypePreset>,
}

impl TypeClassifier {
    pub fn new(mut presets: Vec<TypePreset>) -> Self {
        // stable sort keeps declaration order among equal priorities
        presets.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { presets }
    }

    /// Rules in evaluation order.
    pub fn presets(&self) -> &[TypePreset] {
        &self.presets
    }

    pub fn classify(&self, port: &PortInfo) -> PortCategory {
        self.presets
            .iter()
            .find(|preset| preset.matches(port))
            .map(|preset| preset.name.clone())
            .unwrap_or_default()
    }
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new(default_presets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PortRange, Protocol};

    fn port(number: u16, process: &str, command: &str) -> PortInfo {
        PortInfo::new(number, Protocol::Tcp, 100, process).with_command(command)
    }

    #[test]
    fn test_storybook_port() {
        let classifier = TypeClassifier::default();
        assert_eq!(classifier.classify(&port(6006, "java", "")), PortCategory::Storybook);
    }

    #[test]
    fn test_ssh_is_unexpected() {
        let classifier = TypeClassifier::default();
        let sshd = port(22, "sshd", "/usr/sbin/sshd -D");
        assert_eq!(classifier.classify(&sshd), PortCategory::Unexpected);
    }

    #[test]
    fn test_database_beats_unexpected() {
        let classifier = TypeClassifier::default();
        assert_eq!(classifier.classify(&port(5432, "x", "")), PortCategory::Database);
    }

    #[test]
    fn test_unmatched_default_is_other() {
        let classifier = TypeClassifier::default();
        assert_eq!(classifier.classify(&port(41000, "mystery", "")), PortCategory::Other);
    }

    #[test]
    fn test_no_matching_rule_is_other() {
        let classifier = TypeClassifier::new(vec![
            TypePreset::new(PortCategory::Database, 5).with_ports(&[5432])
        ]);
        assert_eq!(classifier.classify(&port(9999, "x", "")), PortCategory::Other);
    }

    #[test]
    fn test_priority_order_beats_declaration_order() {
        let classifier = TypeClassifier::new(vec![
            TypePreset::new(PortCategory::Api, 1).with_ports(&[3000]),
            TypePreset::new(PortCategory::DevServer, 9).with_ports(&[3000]),
        ]);
        assert_eq!(classifier.classify(&port(3000, "x", "")), PortCategory::DevServer);
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let classifier = TypeClassifier::new(vec![
            TypePreset::new(PortCategory::Custom("first".into()), 4).with_ports(&[7000]),
            TypePreset::new(PortCategory::Custom("second".into()), 4)
                .with_ranges(&[PortRange::new(6000, 8000)]),
        ]);
        assert_eq!(
            classifier.classify(&port(7000, "x", "")),
            PortCategory::Custom("first".into())
        );
        assert_eq!(
            classifier.classify(&port(7001, "x", "")),
            PortCategory::Custom("second".into())
        );
    }

    #[test]
    fn test_command_and_process_patterns_are_case_insensitive() {
        let classifier = TypeClassifier::default();
        assert_eq!(
            classifier.classify(&port(45000, "Python3", "")),
            PortCategory::Api
        );
        assert_eq!(
            classifier.classify(&port(45001, "beam", "npx JEST --watch")),
            PortCategory::Testing
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = TypeClassifier::default();
        let p = port(8080, "nginx", "nginx: master process");
        let first = classifier.classify(&p);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&p), first);
        }
    }
}
