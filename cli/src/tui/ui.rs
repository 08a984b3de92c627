//! TUI rendering.

use chrono::Local;
use portscope_core::dashboard::{DashboardView, Shortcut, VisibleRow};
use portscope_core::{PortCategory, PortInfo};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::format::{format_duration, format_memory, or_dash, truncate};

const DETAILS_HEIGHT: u16 = 8;
const COLUMN_WIDTHS: [usize; 6] = [6, 5, 8, 20, 15, 10];

pub fn draw(f: &mut Frame, view: &DashboardView<'_>) {
    let mut constraints = vec![Constraint::Length(3), Constraint::Min(0)];
    if view.state.show_details {
        constraints.push(Constraint::Length(DETAILS_HEIGHT));
    }
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    draw_header(f, view, chunks[0]);
    draw_body(f, view, chunks[1]);
    if view.state.show_details {
        draw_details(f, view, chunks[2]);
    }
    draw_footer(f, view, chunks[chunks.len() - 1]);

    // innermost modal is drawn last
    let state = view.state;
    if state.show_command {
        let body = state.command_content.clone().unwrap_or_default();
        draw_modal(f, " Full Command ", Text::from(body), Color::Cyan, 80, 40);
    }
    if state.show_logs {
        let body = state.logs_content.clone().unwrap_or_default();
        draw_modal(f, " Logs ", Text::from(body), Color::Cyan, 80, 60);
    }
    if state.show_confirm {
        draw_confirm(f, view);
    }
    if state.show_help {
        draw_help(f, view);
    }
}

fn draw_header(f: &mut Frame, view: &DashboardView<'_>, area: Rect) {
    let state = view.state;
    let mut title = if state.searching {
        format!("PortScope | Search: {}_", state.filter)
    } else {
        format!(
            "PortScope | {} ports | sort: {}",
            view.port_count(),
            state.sort_by.label()
        )
    };
    if !state.searching && !state.filter.is_empty() {
        title.push_str(&format!(" | filter: {}", state.filter));
    }
    if let Some(port) = state.killing_port {
        title.push_str(&format!(" | Killing :{}...", port));
    }
    if let Some(updated) = state.updated_at {
        title.push_str(&format!(
            " | updated {}",
            updated.with_timezone(&Local).format("%H:%M:%S")
        ));
    }

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).bold())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    f.render_widget(header, area);
}

fn draw_body(f: &mut Frame, view: &DashboardView<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Listening Ports ");

    if let Some(error) = &view.state.error {
        let message = format!(
            "Port detection failed: {}\n\nPress {} to retry.",
            error,
            key(view, Shortcut::Refresh)
        );
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    if view.rows.is_empty() {
        let message = if view.state.filter.is_empty() {
            "No listening ports found."
        } else {
            "No ports match the search."
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let header = Paragraph::new(columns([
        "PORT", "PROTO", "PID", "PROCESS", "ADDRESS", "USER", "COMMAND",
    ]))
    .style(Style::default().fg(Color::Yellow).bold());
    f.render_widget(header, parts[0]);

    let items: Vec<ListItem> = view.rows.iter().map(|row| row_item(view, row)).collect();
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default().with_selected(Some(view.state.selected));
    f.render_stateful_widget(list, parts[1], &mut state);
}

fn row_item(view: &DashboardView<'_>, row: &VisibleRow) -> ListItem<'static> {
    match row {
        VisibleRow::Group { .. } => {
            let Some(group) = view.group(row) else {
                return ListItem::new("");
            };
            let arrow = if group.collapsed { "▸" } else { "▾" };
            let title = format!("{} {} ({})", arrow, group.name, group.ports.len());
            ListItem::new(Line::from(Span::styled(
                title,
                Style::default().fg(category_color(&group.category)).bold(),
            )))
        }
        VisibleRow::Port { .. } => {
            let Some(port) = view.port(row) else {
                return ListItem::new("");
            };
            let number = port.port.to_string();
            let pid = port.pid.to_string();
            let command = truncate(&port.command, 80);
            let text = columns([
                number.as_str(),
                port.protocol.as_str(),
                pid.as_str(),
                port.process_name.as_str(),
                port.address.as_str(),
                port.user.as_str(),
                command.as_str(),
            ]);
            let style = if view.state.killing_port == Some(port.port) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        }
    }
}

fn columns(cells: [&str; 7]) -> String {
    let mut line = String::from("  ");
    for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
        line.push_str(&format!("{:<width$} ", truncate(cell, width), width = width));
    }
    line.push_str(cells[6]);
    line
}

fn category_color(category: &PortCategory) -> Color {
    match category {
        PortCategory::Unexpected => Color::Red,
        PortCategory::DevServer => Color::Green,
        PortCategory::Api => Color::Cyan,
        PortCategory::Database => Color::Blue,
        PortCategory::Storybook => Color::Magenta,
        PortCategory::Testing => Color::Yellow,
        PortCategory::Other | PortCategory::Custom(_) => Color::Gray,
    }
}

fn draw_details(f: &mut Frame, view: &DashboardView<'_>, area: Rect) {
    let lines = match view.selected_port() {
        Some(port) => details_lines(port),
        None => match view.selected_row().and_then(|row| view.group(row)) {
            Some(group) => vec![Line::from(format!(
                "{}: {} ports",
                group.name,
                group.ports.len()
            ))],
            None => vec![Line::from("Nothing selected")],
        },
    };

    let details = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Details "),
    );
    f.render_widget(details, area);
}

fn details_lines(port: &PortInfo) -> Vec<Line<'static>> {
    let category = port.category.clone().unwrap_or_default();
    vec![
        format!(
            "Process: {} (PID {})   User: {}",
            port.process_name,
            port.pid,
            or_dash(Some(port.user.clone()))
        ),
        format!(
            "Address: {}:{}/{}   Category: {}",
            port.address,
            port.port,
            port.protocol,
            category.display_name()
        ),
        format!(
            "Uptime: {}   Memory: {}   CPU: {}",
            or_dash(port.lifetime.map(format_duration)),
            or_dash(port.memory.map(format_memory)),
            or_dash(port.cpu.map(|c| format!("{:.1}%", c)))
        ),
        format!("Directory: {}", or_dash(port.cwd.clone())),
        format!("Command: {}", or_dash(Some(port.command.clone()))),
    ]
    .into_iter()
    .map(Line::from)
    .collect()
}

fn draw_footer(f: &mut Frame, view: &DashboardView<'_>, area: Rect) {
    let state = view.state;

    let help = if state.searching {
        format!(
            "Type to search | {}: done | {}: cancel",
            key(view, Shortcut::Enter),
            key(view, Shortcut::Escape)
        )
    } else if state.show_confirm && !state.show_help {
        format!(
            "{}: confirm | {}: cancel",
            key(view, Shortcut::Enter),
            key(view, Shortcut::Escape)
        )
    } else if state.modal_open() {
        format!("{}: close", key(view, Shortcut::Escape))
    } else {
        let mut hints = vec![format!(
            "{}/{}: navigate",
            key(view, Shortcut::Up),
            key(view, Shortcut::Down)
        )];
        hints.extend(
            [
                (Shortcut::Kill, "kill"),
                (Shortcut::Copy, "copy"),
                (Shortcut::ViewCommand, "command"),
                (Shortcut::ViewLogs, "logs"),
                (Shortcut::Search, "search"),
                (Shortcut::ToggleGroup, "group"),
                (Shortcut::Help, "help"),
                (Shortcut::Quit, "quit"),
            ]
            .into_iter()
            .map(|(shortcut, label)| format!("{}: {}", key(view, shortcut), label)),
        );
        hints.join(" | ")
    };

    let footer_text = match &state.status {
        Some(status) => format!("{} | {}", status, help),
        None => help,
    };

    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    f.render_widget(footer, area);
}

fn draw_confirm(f: &mut Frame, view: &DashboardView<'_>) {
    let prompt = view
        .state
        .confirm_action
        .as_ref()
        .map(|action| action.prompt())
        .unwrap_or_default();
    let body = Text::from(vec![
        Line::from(prompt),
        Line::from(""),
        Line::from(format!(
            "{}: confirm | {}: cancel",
            key(view, Shortcut::Enter),
            key(view, Shortcut::Escape)
        ))
        .style(Style::default().fg(Color::DarkGray)),
    ]);
    draw_modal(f, " Confirm ", body, Color::Red, 60, 25);
}

fn draw_help(f: &mut Frame, view: &DashboardView<'_>) {
    let lines: Vec<Line> = Shortcut::ALL
        .iter()
        .map(|shortcut| {
            let keys = view.keymap.keys_for(*shortcut).join(", ");
            Line::from(vec![
                Span::styled(format!("{:<16}", keys), Style::default().fg(Color::Yellow)),
                Span::raw(shortcut.description()),
            ])
        })
        .collect();
    draw_modal(f, " Help ", Text::from(lines), Color::Yellow, 60, 70);
}

fn draw_modal(
    f: &mut Frame,
    title: &'static str,
    body: Text<'_>,
    color: Color,
    percent_x: u16,
    percent_y: u16,
) {
    let area = centered_rect(percent_x, percent_y, f.area());
    f.render_widget(Clear, area);

    let modal = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title),
    );
    f.render_widget(modal, area);
}

/// Shortest key bound to `shortcut`, for hints.
fn key(view: &DashboardView<'_>, shortcut: Shortcut) -> String {
    view.keymap
        .keys_for(shortcut)
        .into_iter()
        .min_by_key(|k| k.chars().count())
        .unwrap_or("-")
        .to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use portscope_core::dashboard::{build_rows, DashboardState, Keymap};
    use portscope_core::{PortGroup, Protocol};
    use ratatui::backend::TestBackend;

    fn groups() -> Vec<PortGroup> {
        let mut group = PortGroup::new(PortCategory::DevServer);
        group.ports = vec![PortInfo::new(3000, Protocol::Tcp, 4242, "node")
            .with_command("npm run dev")
            .with_category(PortCategory::DevServer)];
        vec![group]
    }

    fn render(state: &DashboardState) -> String {
        let groups = groups();
        let rows = build_rows(&groups, &state.filter, state.sort_by);
        let keymap = Keymap::default();
        let view = DashboardView {
            state,
            groups: &groups,
            rows: &rows,
            keymap: &keymap,
        };

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draws_groups_and_ports() {
        let screen = render(&DashboardState::default());
        assert!(screen.contains("Dev Servers (1)"));
        assert!(screen.contains("4242"));
        assert!(screen.contains("npm run dev"));
        assert!(screen.contains("x: kill"));
    }

    #[test]
    fn test_draws_error_instead_of_table() {
        let state = DashboardState {
            error: Some("lsof not found".into()),
            ..DashboardState::default()
        };
        let screen = render(&state);
        assert!(screen.contains("Port detection failed: lsof not found"));
        assert!(!screen.contains("Dev Servers"));
    }

    #[test]
    fn test_draws_help_modal() {
        let state = DashboardState {
            show_help: true,
            ..DashboardState::default()
        };
        let screen = render(&state);
        assert!(screen.contains("Kill selected process"));
        assert!(screen.contains("esc: close"));
    }

    #[test]
    fn test_search_header() {
        let state = DashboardState {
            searching: true,
            filter: "nod".into(),
            ..DashboardState::default()
        };
        assert!(render(&state).contains("Search: nod_"));
    }

    #[test]
    fn test_columns_pad_and_truncate() {
        let line = columns(["3000", "TCP", "1", "a-very-long-process-name-here", "*", "", "cmd"]);
        assert!(line.starts_with("  3000   TCP   1        a-very-long-process…"));
        assert!(line.ends_with("cmd"));
    }
}
