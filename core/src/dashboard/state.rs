//! Dashboard state record and the derived row view.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::{PortCategory, PortGroup, PortInfo};

use super::Keymap;

/// Ordering applied to the ports inside each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Port,
    Process,
    Pid,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Port => "port",
            SortKey::Process => "process",
            SortKey::Pid => "pid",
        }
    }

    /// Sort `indices` into `ports` by this key.
    pub fn sort_indices(&self, ports: &[PortInfo], indices: &mut [usize]) {
        match self {
            SortKey::Port => indices.sort_by_key(|&i| (ports[i].port, ports[i].pid)),
            SortKey::Process => indices.sort_by_key(|&i| {
                (ports[i].process_name.to_lowercase(), ports[i].port, ports[i].pid)
            }),
            SortKey::Pid => indices.sort_by_key(|&i| (ports[i].pid, ports[i].port)),
        }
    }
}

/// Action waiting for the user to press Enter in the confirm modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Kill {
        port: u16,
        pid: u32,
        process_name: String,
    },
}

impl ConfirmAction {
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::Kill {
                port,
                pid,
                process_name,
            } => format!(
                "Port {} is an unexpected port. Kill {} (PID {})?",
                port, process_name, pid
            ),
        }
    }
}

/// Everything the dashboard displays besides the port data itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Index into the visible rows.
    pub selected: usize,
    pub sort_by: SortKey,
    pub filter: String,
    pub searching: bool,
    pub show_details: bool,

    pub show_help: bool,
    pub show_confirm: bool,
    pub confirm_action: Option<ConfirmAction>,
    pub show_logs: bool,
    pub logs_content: Option<String>,
    pub show_command: bool,
    pub command_content: Option<String>,

    /// Set for the whole kill protocol; blocks a second kill.
    pub is_killing: bool,
    pub killing_port: Option<u16>,

    /// Categories the user collapsed, reapplied after every refresh.
    pub collapsed: BTreeSet<PortCategory>,
    /// Outcome of the last action.
    pub status: Option<String>,
    /// Detection failure with nothing cached to fall back on.
    pub error: Option<String>,
    /// Timestamp of the last successful refresh.
    pub updated_at: Option<DateTime<Utc>>,
    pub should_quit: bool,
}

impl DashboardState {
    pub fn modal_open(&self) -> bool {
        self.show_help || self.show_confirm || self.show_logs || self.show_command
    }

    /// Navigation and actions are ignored while this holds.
    pub fn input_blocked(&self) -> bool {
        self.searching || self.modal_open()
    }
}

/// One line of the port table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleRow {
    /// Group header, indexing into the group list.
    Group { group: usize },
    /// Port line, indexing into the group list and that group's ports.
    Port { group: usize, port: usize },
}

impl VisibleRow {
    pub fn group(&self) -> usize {
        match self {
            VisibleRow::Group { group } | VisibleRow::Port { group, .. } => *group,
        }
    }
}

/// Flatten groups into table rows.
///
/// Only ports matching `filter` are listed and groups left empty by the
/// filter are dropped. Collapsed groups contribute their header only.
pub fn build_rows(groups: &[PortGroup], filter: &str, sort_by: SortKey) -> Vec<VisibleRow> {
    let mut rows = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        let mut matching: Vec<usize> = (0..group.ports.len())
            .filter(|&i| group.ports[i].matches_search(filter))
            .collect();
        if matching.is_empty() {
            continue;
        }

        rows.push(VisibleRow::Group { group: group_index });
        if group.collapsed {
            continue;
        }

        sort_by.sort_indices(&group.ports, &mut matching);
        rows.extend(matching.into_iter().map(|port| VisibleRow::Port {
            group: group_index,
            port,
        }));
    }

    rows
}

/// Read-only snapshot passed to the host on every render.
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    pub state: &'a DashboardState,
    pub groups: &'a [PortGroup],
    pub rows: &'a [VisibleRow],
    pub keymap: &'a Keymap,
}

impl<'a> DashboardView<'a> {
    pub fn group(&self, row: &VisibleRow) -> Option<&'a PortGroup> {
        self.groups.get(row.group())
    }

    pub fn port(&self, row: &VisibleRow) -> Option<&'a PortInfo> {
        match row {
            VisibleRow::Port { group, port } => self.groups.get(*group)?.ports.get(*port),
            VisibleRow::Group { .. } => None,
        }
    }

    pub fn selected_row(&self) -> Option<&'a VisibleRow> {
        self.rows.get(self.state.selected)
    }

    pub fn selected_port(&self) -> Option<&'a PortInfo> {
        self.selected_row().and_then(|row| self.port(row))
    }

    pub fn port_count(&self) -> usize {
        self.groups.iter().map(|g| g.ports.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;

    fn group(category: PortCategory, ports: &[(u16, u32, &str)]) -> PortGroup {
        let mut group = PortGroup::new(category.clone());
        group.ports = ports
            .iter()
            .map(|(port, pid, name)| {
                PortInfo::new(*port, Protocol::Tcp, *pid, *name).with_category(category.clone())
            })
            .collect();
        group
    }

    fn sample() -> Vec<PortGroup> {
        vec![
            group(PortCategory::Unexpected, &[(22, 50, "sshd")]),
            group(
                PortCategory::DevServer,
                &[(3000, 30, "vite"), (5173, 10, "Node"), (8080, 20, "bun")],
            ),
        ]
    }

    fn port_numbers(groups: &[PortGroup], rows: &[VisibleRow]) -> Vec<u16> {
        rows.iter()
            .filter_map(|row| match row {
                VisibleRow::Port { group, port } => Some(groups[*group].ports[*port].port),
                VisibleRow::Group { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_rows_include_headers() {
        let groups = sample();
        let rows = build_rows(&groups, "", SortKey::Port);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], VisibleRow::Group { group: 0 });
        assert_eq!(rows[2], VisibleRow::Group { group: 1 });
    }

    #[test]
    fn test_sort_keys() {
        let groups = sample();
        assert_eq!(
            port_numbers(&groups, &build_rows(&groups, "", SortKey::Port)),
            vec![22, 3000, 5173, 8080]
        );
        assert_eq!(
            port_numbers(&groups, &build_rows(&groups, "", SortKey::Process)),
            vec![22, 8080, 5173, 3000]
        );
        assert_eq!(
            port_numbers(&groups, &build_rows(&groups, "", SortKey::Pid)),
            vec![22, 5173, 8080, 3000]
        );
    }

    #[test]
    fn test_filter_drops_empty_groups() {
        let groups = sample();
        let rows = build_rows(&groups, "VITE", SortKey::Port);
        assert_eq!(rows, vec![
            VisibleRow::Group { group: 1 },
            VisibleRow::Port { group: 1, port: 0 },
        ]);
    }

    #[test]
    fn test_collapsed_group_shows_header_only() {
        let mut groups = sample();
        groups[1].collapsed = true;
        let rows = build_rows(&groups, "", SortKey::Port);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], VisibleRow::Group { group: 1 });
    }

    #[test]
    fn test_input_blocked() {
        let mut state = DashboardState::default();
        assert!(!state.input_blocked());
        state.show_logs = true;
        assert!(state.modal_open());
        assert!(state.input_blocked());
        state.show_logs = false;
        state.searching = true;
        assert!(!state.modal_open());
        assert!(state.input_blocked());
    }
}
