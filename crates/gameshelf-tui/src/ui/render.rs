use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use gameshelf_core::SessionStatus;

use crate::app::{App, AppState, LoginFocus, Tab};
use crate::form::FormOverlay;

use super::styles;
use super::tabs::{dashboard, games, manage_games, users};

const LOGO: [&str; 3] = [
    "╔═╗╔═╗╔╦╗╔═╗╔═╗╦ ╦╔═╗╦  ╔═╗",
    "║ ╦╠═╣║║║║╣ ╚═╗╠═╣║╣ ║  ╠╣ ",
    "╚═╝╩ ╩╩ ╩╚═╝╚═╝╩ ╩╚═╝╩═╝╚  ",
];

/// Width of the label column in form overlays
const FORM_LABEL_WIDTH: usize = 18;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::EditingForm => {
            if let Some(ref form) = app.form {
                render_form_overlay(frame, form);
            }
        }
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn logo_lines(indent: usize) -> Vec<Line<'static>> {
    let pad = " ".repeat(indent);
    LOGO.iter()
        .map(|row| Line::from(Span::styled(format!("{}{}", pad, row), styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  GameShelf";
    let user = match app.identity() {
        Some(identity) if identity.is_admin => format!("{} (admin)", identity.name),
        Some(identity) => identity.name.clone(),
        None => "not signed in".to_string(),
    };
    let help_hint = "[?] Help";
    let used = title.chars().count() + user.chars().count() + help_hint.len() + 7;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(
            user,
            if app.is_authenticated() {
                styles::highlight_style()
            } else {
                styles::muted_style()
            },
        ),
        Span::styled(" | ", styles::muted_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let authenticated = app.is_authenticated();
    let admin = app.is_admin();
    let tabs = [Tab::Games, Tab::Dashboard, Tab::Users, Tab::ManageGames];

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in tabs.iter().enumerate() {
        if !tab.is_available(authenticated, admin) {
            continue;
        }
        if spans.len() > 1 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    // Search query on the right
    if app.state == AppState::Searching || !app.search_query.is_empty() {
        let search = format!("/{}", app.search_query);
        let cursor = if app.state == AppState::Searching { "▌" } else { "" };
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let padding = (area.width as usize)
            .saturating_sub(used + search.chars().count() + cursor.len() + 2);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(search, styles::search_style()));
        spans.push(Span::styled(cursor, styles::search_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Games => games::render(frame, app, area),
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Users => users::render(frame, app, area),
        Tab::ManageGames => manage_games::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.is_authenticated() {
        "[u]pdate | [L]ogout | [q]uit"
    } else {
        "[u]pdate | [l]ogin | [q]uit"
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", app.session.status()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 31, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines(11);
    help_text.extend([
        Line::from(Span::styled(
            format!("               version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("Tab", "Switch focus (list ↔ detail)"),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("Enter", "Open game / edit"),
        help_line("Esc", "Go back / clear search"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("c", "Cycle category filter (Games)"),
        help_line("p / r", "Play / review the selected game"),
        help_line("u", "Update data from the server"),
        help_line("l / L", "Log in / log out"),
        help_line("P", "Edit profile"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Admin", styles::highlight_style())),
        help_line("n / e / d", "New / edit / delete"),
        help_line("t / c", "Toggle ratings / comments"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn login_field(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    // Keep the end of long input visible
    let shown: String = {
        let chars: Vec<char> = value.chars().collect();
        let start = chars.len().saturating_sub(24);
        chars[start..].iter().collect()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(format!("{:<24}{}", shown, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn login_button(label: &str, focused: bool) -> Line<'static> {
    if focused {
        Line::from(vec![
            Span::raw("            ["),
            Span::styled(format!(" ▶ {} ◀ ", label), styles::selected_style()),
            Span::raw("]"),
        ])
    } else {
        Line::from(vec![
            Span::raw("            ["),
            Span::styled(format!("   {}   ", label), styles::list_item_style()),
            Span::raw("]"),
        ])
    }
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let has_message = app.session.error().is_some() || app.session.is_loading();
    let height = if has_message { 16 } else { 14 };
    let area = centered_rect_fixed(48, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(9);
    lines.push(Line::from(""));

    lines.push(login_field("Email:", &app.login_email, app.login_focus == LoginFocus::Email));
    let masked = "*".repeat(app.login_password.chars().count());
    lines.push(login_field("Password:", &masked, app.login_focus == LoginFocus::Password));

    lines.push(Line::from(""));
    lines.push(login_button("  Log in   ", app.login_focus == LoginFocus::Button));
    lines.push(login_button("Create acct", app.login_focus == LoginFocus::Register));

    match app.session.status() {
        SessionStatus::Authenticating => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "   Signing in...",
                styles::highlight_style(),
            )));
        }
        SessionStatus::AuthenticationFailed => {
            if let Some(error) = app.session.error() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!(" {}", error),
                    styles::error_style(),
                )));
            }
        }
        SessionStatus::Anonymous | SessionStatus::Authenticated => {}
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

fn render_form_overlay(frame: &mut Frame, form: &FormOverlay) {
    let width: u16 = 68;
    let extra = if form.error.is_some() { 2 } else { 0 };
    let height = form.fields.len() as u16 + 5 + extra;
    let area = centered_rect_fixed(width, height, frame.area());

    frame.render_widget(Clear, area);

    let value_width = (width as usize).saturating_sub(FORM_LABEL_WIDTH + 6);
    let mut lines = vec![Line::from("")];

    let focused_label = form.focused().map(|f| f.label);
    for field in &form.fields {
        let focused = focused_label == Some(field.label);
        let display = field.display();
        let chars: Vec<char> = display.chars().collect();
        let start = chars.len().saturating_sub(value_width.saturating_sub(1));
        let shown: String = chars[start..].iter().collect();
        let cursor = if focused && field.is_editable_text() { "▌" } else { "" };

        let value_style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:>width$}: ", field.label, width = FORM_LABEL_WIDTH),
                if focused {
                    styles::highlight_style()
                } else {
                    styles::muted_style()
                },
            ),
            Span::styled(format!("{}{}", shown, cursor), value_style),
        ]));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" Tab", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("←/→", styles::help_key_style()),
        Span::styled(" change  ", styles::muted_style()),
        Span::styled("Enter", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(format!(" {} ", form.title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(ref target) = app.pending_delete else {
        return;
    };
    let area = centered_rect_fixed(52, 8, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   Delete {}?", target.description()),
            styles::error_style(),
        )),
        Line::from(Span::styled("   This cannot be undone.", styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Confirm ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    // Fixed size dialog matching the login overlay
    let area = centered_rect_fixed(48, 10, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(9);
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "    Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("    Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        let rect = centered_rect_fixed(48, 10, outer);
        assert_eq!(rect, Rect::new(26, 15, 48, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let outer = Rect::new(0, 0, 30, 5);
        let rect = centered_rect_fixed(48, 10, outer);
        assert_eq!(rect.width, 30);
        assert_eq!(rect.height, 5);
    }
}
