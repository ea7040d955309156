use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

fn flag_cell(disabled: bool) -> Cell<'static> {
    if disabled {
        Cell::from(Span::styled("off", styles::error_style()))
    } else {
        Cell::from(Span::styled("on", styles::success_style()))
    }
}

/// Render the admin catalog management tab
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let games = app.visible_admin_games();

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Brand"),
        Cell::from("Categories"),
        Cell::from("Reviews"),
        Cell::from("Ratings"),
        Cell::from("Comments"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            let style = if i == app.manage_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(game.name.clone()),
                Cell::from(game.brand.clone()),
                Cell::from(game.category_summary(3)),
                Cell::from(format!("{:>7}", game.num_reviews)),
                flag_cell(game.disable_rating),
                flag_cell(game.disable_commenting),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(28),
        Constraint::Fill(2),
        Constraint::Fill(3),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let title = format!(
        " Manage Games ({}) - [n]ew [e]dit [d]elete [t]oggle ratings [c]omments ",
        games.len()
    );
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
    if !games.is_empty() {
        state.select(Some(app.manage_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
