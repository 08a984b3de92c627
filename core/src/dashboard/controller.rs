//! Keyboard-driven dashboard controller.
//!
//! One key event is handled at a time. Every state change goes through
//! [`Dashboard::update`] and the host is re-rendered after each handled key.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::{full_command, process, PortOrganizer, PortRegistry};
use crate::domain::{PortCategory, PortGroup, PortInfo};
use crate::error::Result;
use crate::ports::PlatformAdapter;

use super::state::{build_rows, ConfirmAction, DashboardState, DashboardView, SortKey, VisibleRow};
use super::{Keymap, Shortcut};

/// Pause between a kill and the re-detection that follows it.
pub const KILL_GRACE_PERIOD: Duration = Duration::from_millis(200);

/// Shown in the command modal until the full command line arrives.
pub const COMMAND_PLACEHOLDER: &str = "Loading...";

pub const NO_LOGS: &str = "No logs available";

/// Rendering and clipboard side of the dashboard.
pub trait DashboardHost {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()>;

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;
}

/// State machine over the organized port list.
pub struct Dashboard<A: PlatformAdapter, H: DashboardHost> {
    registry: PortRegistry<A>,
    organizer: PortOrganizer,
    keymap: Keymap,
    host: H,
    confirm_unexpected_kills: bool,
    state: DashboardState,
    groups: Vec<PortGroup>,
    /// Filtered and sorted rows, rebuilt lazily after invalidation.
    rows_cache: Option<Vec<VisibleRow>>,
    /// Set when a kill protocol ran to completion, until the host takes it.
    kill_finished: bool,
}

impl<A, H> Dashboard<A, H>
where
    A: PlatformAdapter,
    H: DashboardHost,
{
    pub fn new(registry: PortRegistry<A>, organizer: PortOrganizer, keymap: Keymap, host: H) -> Self {
        Self {
            registry,
            organizer,
            keymap,
            host,
            confirm_unexpected_kills: true,
            state: DashboardState::default(),
            groups: Vec::new(),
            rows_cache: None,
            kill_finished: false,
        }
    }

    /// Whether killing a process on an unexpected port needs confirmation.
    pub fn with_confirm_unexpected_kills(mut self, enabled: bool) -> Self {
        self.confirm_unexpected_kills = enabled;
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn groups(&self) -> &[PortGroup] {
        &self.groups
    }

    pub fn registry(&self) -> &PortRegistry<A> {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit
    }

    /// The only place dashboard state is mutated.
    pub fn update<F: FnOnce(&mut DashboardState)>(&mut self, f: F) {
        f(&mut self.state);
    }

    fn invalidate_rows(&mut self) {
        self.rows_cache = None;
    }

    fn ensure_rows(&mut self) {
        if self.rows_cache.is_some() {
            return;
        }
        let rows = build_rows(&self.groups, &self.state.filter, self.state.sort_by);
        let last = rows.len().saturating_sub(1);
        self.rows_cache = Some(rows);
        self.update(|s| s.selected = s.selected.min(last));
    }

    pub fn rows(&mut self) -> &[VisibleRow] {
        self.ensure_rows();
        self.rows_cache.as_deref().unwrap_or_default()
    }

    fn selected_row(&mut self) -> Option<VisibleRow> {
        let selected = self.state.selected;
        self.rows().get(selected).copied()
    }

    fn selected_port(&mut self) -> Option<PortInfo> {
        match self.selected_row()? {
            VisibleRow::Port { group, port } => self.groups.get(group)?.ports.get(port).cloned(),
            VisibleRow::Group { .. } => None,
        }
    }

    pub fn render(&mut self) {
        self.ensure_rows();
        let view = DashboardView {
            state: &self.state,
            groups: &self.groups,
            rows: self.rows_cache.as_deref().unwrap_or_default(),
            keymap: &self.keymap,
        };
        if let Err(e) = self.host.render(&view) {
            warn!(error = %e, "Failed to render dashboard");
        }
    }

    /// First detection pass and render.
    pub async fn start(&mut self) {
        self.refresh().await;
        self.render();
    }

    /// Re-detect and rebuild the groups, keeping collapsed categories collapsed.
    ///
    /// A detection failure is stored in the state instead of being returned.
    pub async fn refresh(&mut self) {
        match self.registry.detect_ports().await {
            Ok(ports) => {
                let result = self.organizer.organize(ports);
                let timestamp = result.timestamp;
                let mut groups = result.groups;
                for group in &mut groups {
                    group.collapsed = self.state.collapsed.contains(&group.category);
                }
                debug!(groups = groups.len(), "Dashboard refreshed");
                self.groups = groups;
                self.invalidate_rows();
                self.update(|s| {
                    s.error = None;
                    s.updated_at = Some(timestamp);
                });
            }
            Err(e) => {
                warn!(error = %e, "Port detection failed");
                let message = e.to_string();
                self.update(|s| s.error = Some(message));
            }
        }
    }

    /// Handle one key by name. Unbound keys are ignored outside search mode.
    pub async fn handle_key(&mut self, key: &str) {
        self.process_key(key).await;
        self.render();
    }

    /// Whether a kill finished since the last call. The host then collects
    /// the keys the terminal buffered meanwhile and hands them to
    /// [`Dashboard::handle_queued_keys`].
    pub fn take_finished_kill(&mut self) -> bool {
        std::mem::take(&mut self.kill_finished)
    }

    /// Handle keys that were pressed while a kill was in flight. They are
    /// dispatched with the killing flag still raised, so repeated kill
    /// presses are refused instead of hitting whatever row is selected once
    /// the list has been re-detected.
    pub async fn handle_queued_keys<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return;
        }

        let was_killing = self.state.is_killing;
        self.update(|s| s.is_killing = true);
        for key in keys {
            debug!(key = key.as_ref(), "Handling key queued during kill");
            self.process_key(key.as_ref()).await;
        }
        self.update(|s| s.is_killing = was_killing);
        self.render();
    }

    async fn process_key(&mut self, key: &str) {
        if self.state.searching {
            self.handle_search_key(key);
        } else if let Some(shortcut) = self.keymap.lookup(key) {
            self.dispatch(shortcut).await;
        }
    }

    fn handle_search_key(&mut self, key: &str) {
        let text = key == "space" || key.chars().count() == 1;
        match self.keymap.lookup(key) {
            Some(Shortcut::Escape) => return self.cancel_search(),
            Some(Shortcut::Enter) => return self.commit_search(),
            // chords such as ctrl+c still quit; plain characters are text
            Some(Shortcut::Quit) if !text => return self.update(|s| s.should_quit = true),
            _ => {}
        }

        match key {
            "backspace" => self.update(|s| {
                s.filter.pop();
            }),
            "space" => self.update(|s| s.filter.push(' ')),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => self.update(|s| s.filter.push(c)),
                    _ => return,
                }
            }
        }
        self.invalidate_rows();
        self.update(|s| s.selected = 0);
    }

    async fn dispatch(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Quit => self.update(|s| s.should_quit = true),
            Shortcut::Help => self.update(|s| s.show_help = !s.show_help),
            Shortcut::Escape => self.escape(),
            Shortcut::Enter => self.enter().await,
            _ if self.state.input_blocked() => {}
            Shortcut::Up => self.move_selection(-1),
            Shortcut::Down => self.move_selection(1),
            Shortcut::Search => self.update(|s| {
                s.searching = true;
                s.status = None;
            }),
            Shortcut::ToggleGroup => self.toggle_group(),
            Shortcut::ToggleDetails => self.update(|s| s.show_details = !s.show_details),
            Shortcut::SortByPort => self.sort_by(SortKey::Port),
            Shortcut::SortByProcess => self.sort_by(SortKey::Process),
            Shortcut::SortByPid => self.sort_by(SortKey::Pid),
            Shortcut::Kill => self.kill_selected().await,
            Shortcut::Copy => self.copy_command(),
            Shortcut::ViewCommand => self.view_command().await,
            Shortcut::ViewLogs => self.view_logs().await,
            Shortcut::Refresh => {
                self.registry.clear_cache();
                self.refresh().await;
            }
        }
    }

    fn cancel_search(&mut self) {
        self.update(|s| {
            s.searching = false;
            s.filter.clear();
            s.selected = 0;
        });
        self.invalidate_rows();
    }

    fn commit_search(&mut self) {
        self.update(|s| {
            s.searching = false;
            s.selected = 0;
        });
        self.invalidate_rows();
    }

    /// Close the innermost open layer: search, help, confirm, logs, command.
    fn escape(&mut self) {
        if self.state.searching {
            return self.cancel_search();
        }
        self.update(|s| {
            if s.show_help {
                s.show_help = false;
            } else if s.show_confirm {
                s.show_confirm = false;
                s.confirm_action = None;
            } else if s.show_logs {
                s.show_logs = false;
                s.logs_content = None;
            } else if s.show_command {
                s.show_command = false;
                s.command_content = None;
            }
        });
    }

    async fn enter(&mut self) {
        if self.state.searching {
            return self.commit_search();
        }
        if !self.state.show_confirm || self.state.show_help {
            return;
        }

        let mut action = None;
        self.update(|s| {
            s.show_confirm = false;
            action = s.confirm_action.take();
        });
        if let Some(ConfirmAction::Kill { port, pid, .. }) = action {
            self.kill(port, pid).await;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        self.update(|s| s.selected = s.selected.saturating_add_signed(delta).min(len - 1));
    }

    fn sort_by(&mut self, key: SortKey) {
        self.update(|s| s.sort_by = key);
        self.invalidate_rows();
    }

    fn toggle_group(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let index = row.group();
        let Some(group) = self.groups.get_mut(index) else {
            return;
        };
        group.collapsed = !group.collapsed;
        let category = group.category.clone();
        let collapsed = group.collapsed;

        self.update(|s| {
            if collapsed {
                s.collapsed.insert(category);
            } else {
                s.collapsed.remove(&category);
            }
        });
        self.invalidate_rows();

        // keep the cursor on the toggled group's header
        let header = self
            .rows()
            .iter()
            .position(|r| *r == VisibleRow::Group { group: index });
        if let Some(header) = header {
            self.update(|s| s.selected = header);
        }
    }

    async fn kill_selected(&mut self) {
        if self.state.is_killing {
            return;
        }
        let Some(port) = self.selected_port() else {
            return;
        };

        let unexpected = port
            .category
            .as_ref()
            .is_some_and(PortCategory::is_unexpected);
        if unexpected && self.confirm_unexpected_kills {
            let action = ConfirmAction::Kill {
                port: port.port,
                pid: port.pid,
                process_name: port.process_name,
            };
            self.update(|s| {
                s.show_confirm = true;
                s.confirm_action = Some(action);
            });
            return;
        }

        self.kill(port.port, port.pid).await;
    }

    /// Kill protocol. The killing flag stays set from the first render until
    /// the post-kill refresh has been rendered.
    async fn kill(&mut self, port: u16, pid: u32) {
        if self.state.is_killing {
            return;
        }
        self.update(|s| {
            s.is_killing = true;
            s.killing_port = Some(port);
            s.status = None;
        });
        self.render();

        info!(port = port, pid = pid, "Killing process");
        let killed = process::kill_process(self.registry.adapter(), pid, false).await;
        if killed {
            info!(port = port, pid = pid, "Process killed");
        } else {
            warn!(port = port, pid = pid, "Failed to kill process");
        }

        self.invalidate_rows();
        self.registry.clear_cache();
        tokio::time::sleep(KILL_GRACE_PERIOD).await;
        self.refresh().await;
        self.render();

        let status = if killed {
            format!("Killed PID {} on port {}", pid, port)
        } else {
            format!("Failed to kill PID {} on port {}", pid, port)
        };
        self.update(|s| {
            s.is_killing = false;
            s.killing_port = None;
            s.status = Some(status);
        });
        self.kill_finished = true;
    }

    fn copy_command(&mut self) {
        let Some(port) = self.selected_port() else {
            return;
        };
        let command = full_command(&port);
        let status = match self.host.copy_to_clipboard(&command) {
            Ok(()) => "Copied command to clipboard".to_string(),
            Err(e) => {
                warn!(pid = port.pid, error = %e, "Failed to copy command");
                format!("Copy failed: {}", e)
            }
        };
        self.update(|s| s.status = Some(status));
    }

    async fn view_command(&mut self) {
        let Some(port) = self.selected_port() else {
            return;
        };
        self.update(|s| {
            s.show_command = true;
            s.command_content = Some(COMMAND_PLACEHOLDER.to_string());
        });
        self.render();

        let command = match self.registry.adapter().get_process_command(port.pid).await {
            Ok(command) if !command.trim().is_empty() => command,
            Ok(_) => full_command(&port),
            Err(e) => {
                debug!(pid = port.pid, error = %e, "Falling back to stored command");
                full_command(&port)
            }
        };

        // the modal may have been closed while the query was in flight
        if self.state.show_command {
            self.update(|s| s.command_content = Some(command));
        }
    }

    async fn view_logs(&mut self) {
        let Some(port) = self.selected_port() else {
            return;
        };
        let content = match process::process_logs(self.registry.adapter(), port.pid).await {
            Some(logs) if logs.stderr.is_empty() => logs.stdout,
            Some(logs) => format!("{}\n\n{}", logs.stdout, logs.stderr),
            None => NO_LOGS.to_string(),
        };
        self.update(|s| {
            s.show_logs = true;
            s.logs_content = Some(content);
        });
    }
}
