//! Classification and grouping of detected ports.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Utc;

use crate::domain::{PortCategory, PortDetectionResult, PortGroup, PortInfo, TypeClassifier};

/// Turns a flat detection snapshot into ordered category groups.
#[derive(Debug, Clone, Default)]
pub struct PortOrganizer {
    classifier: TypeClassifier,
}

impl PortOrganizer {
    pub fn new(classifier: TypeClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    /// Classify every port and build the groups for one refresh.
    pub fn organize(&self, ports: Vec<PortInfo>) -> PortDetectionResult {
        let ports: Vec<PortInfo> = ports
            .into_iter()
            .map(|port| {
                let category = self.classifier.classify(&port);
                port.with_category(category)
            })
            .collect();

        let groups = group_ports(&ports);

        PortDetectionResult {
            ports,
            groups,
            timestamp: Utc::now(),
        }
    }
}

/// Build one group per category present in `ports`.
///
/// Unclassified ports land in [`PortCategory::Other`]. Groups are returned
/// in display order (see [`compare_groups`]) and each group's ports are
/// sorted by port number.
pub fn group_ports(ports: &[PortInfo]) -> Vec<PortGroup> {
    let mut by_category: BTreeMap<PortCategory, PortGroup> = BTreeMap::new();

    for port in ports {
        let category = port.category.clone().unwrap_or_default();
        by_category
            .entry(category.clone())
            .or_insert_with(|| PortGroup::new(category))
            .ports
            .push(port.clone());
    }

    let mut groups: Vec<PortGroup> = by_category.into_values().collect();
    for group in &mut groups {
        group.ports.sort_by_key(|p| p.port);
    }
    groups.sort_by(compare_groups);
    groups
}

/// Unexpected first, then alphabetical by label, then by category id.
pub fn compare_groups(a: &PortGroup, b: &PortGroup) -> Ordering {
    b.category
        .is_unexpected()
        .cmp(&a.category.is_unexpected())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;

    fn classified(port: u16, category: PortCategory) -> PortInfo {
        PortInfo::new(port, Protocol::Tcp, port as u32, "proc").with_category(category)
    }

    fn categories(groups: &[PortGroup]) -> Vec<PortCategory> {
        groups.iter().map(|g| g.category.clone()).collect()
    }

    #[test]
    fn test_unexpected_first_then_alphabetical() {
        let ports = vec![
            classified(9000, PortCategory::Other),
            classified(8000, PortCategory::Api),
            classified(22, PortCategory::Unexpected),
        ];

        let groups = group_ports(&ports);
        assert_eq!(
            categories(&groups),
            vec![PortCategory::Unexpected, PortCategory::Api, PortCategory::Other]
        );
    }

    #[test]
    fn test_full_ordering_by_label() {
        let ports = vec![
            classified(1, PortCategory::Testing),
            classified(2, PortCategory::Storybook),
            classified(3, PortCategory::Other),
            classified(4, PortCategory::Database),
            classified(5, PortCategory::DevServer),
            classified(6, PortCategory::Api),
            classified(7, PortCategory::Unexpected),
        ];

        let names: Vec<String> = group_ports(&ports).into_iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "⚠️ Unexpected Ports",
                "APIs",
                "Databases",
                "Dev Servers",
                "Other Services",
                "Storybook",
                "Testing",
            ]
        );
    }

    #[test]
    fn test_ports_sorted_within_group() {
        let ports = vec![
            classified(8080, PortCategory::DevServer),
            classified(3000, PortCategory::DevServer),
            classified(5173, PortCategory::DevServer),
        ];

        let groups = group_ports(&ports);
        assert_eq!(groups.len(), 1);
        let numbers: Vec<u16> = groups[0].ports.iter().map(|p| p.port).collect();
        assert_eq!(numbers, vec![3000, 5173, 8080]);
    }

    #[test]
    fn test_group_identity() {
        let groups = group_ports(&[classified(5432, PortCategory::Database)]);
        assert_eq!(groups[0].id, "category:database");
        assert_eq!(groups[0].name, "Databases");
        assert!(!groups[0].collapsed);
    }

    #[test]
    fn test_custom_categories_share_label_but_stay_separate() {
        let ports = vec![
            classified(1, PortCategory::Custom("queue".into())),
            classified(2, PortCategory::Custom("cache".into())),
        ];

        let groups = group_ports(&ports);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category.as_str(), "cache");
        assert_eq!(groups[1].category.as_str(), "queue");
        assert!(groups.iter().all(|g| g.name == "Other"));
    }

    #[test]
    fn test_unclassified_goes_to_other() {
        let groups = group_ports(&[PortInfo::new(41000, Protocol::Tcp, 1, "mystery")]);
        assert_eq!(groups[0].category, PortCategory::Other);
    }

    #[test]
    fn test_organize_classifies_and_groups() {
        let organizer = PortOrganizer::default();
        let result = organizer.organize(vec![
            PortInfo::new(41000, Protocol::Tcp, 3, "mystery"),
            PortInfo::new(6006, Protocol::Tcp, 1, "java"),
            PortInfo::new(22, Protocol::Tcp, 2, "sshd"),
        ]);

        assert_eq!(result.ports.len(), 3);
        assert!(result.ports.iter().all(|p| p.category.is_some()));
        assert_eq!(result.ports[0].port, 41000);
        assert_eq!(
            categories(&result.groups),
            vec![PortCategory::Unexpected, PortCategory::Other, PortCategory::Storybook]
        );
    }

    #[test]
    fn test_organize_empty() {
        let result = PortOrganizer::default().organize(Vec::new());
        assert!(result.ports.is_empty());
        assert!(result.groups.is_empty());
    }
}
