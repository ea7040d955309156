use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use gameshelf_core::utils::format_date;

use crate::app::App;
use crate::ui::styles;

/// Render the admin Users tab
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let users = app.visible_users();
    let own_id = app.identity().map(|i| i.id.as_str());

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Email"),
        Cell::from("Role"),
        Cell::from("Joined"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == app.users_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let name = if own_id == Some(user.id.as_str()) {
                format!("{} (you)", user.name)
            } else {
                user.name.clone()
            };
            let role = if user.is_admin {
                Span::styled(user.role(), styles::admin_style())
            } else {
                Span::styled(user.role(), styles::muted_style())
            };
            let joined = user.created_at.as_deref().map(format_date).unwrap_or_default();

            Row::new(vec![
                Cell::from(name),
                Cell::from(user.email.clone()),
                Cell::from(role),
                Cell::from(joined),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Fill(3),
        Constraint::Length(6),
        Constraint::Length(20),
    ];

    let title = format!(" Users ({}) - [e]dit [d]elete ", users.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !users.is_empty() {
        state.select(Some(app.users_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
