use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use gameshelf_core::catalog::find_user_review;
use gameshelf_core::models::Game;
use gameshelf_core::utils::{format_date, format_play_time, star_bar, truncate};

use crate::app::{App, AppState, Focus};
use crate::ui::styles;

/// Render the Games tab - catalog table with the selected game's details
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_game_table(frame, app, chunks[0]);
    render_game_detail(frame, app, chunks[1]);
}

fn render_game_table(frame: &mut Frame, app: &App, area: Rect) {
    let games = app.visible_games();
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Brand"),
        Cell::from("Categories"),
        Cell::from("Rating"),
        Cell::from("Played"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            let style = if i == app.games_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let played = game
                .current_user_play_time
                .filter(|m| *m > 0)
                .map(format_play_time)
                .unwrap_or_default();

            Row::new(vec![
                Cell::from(game.name.clone()),
                Cell::from(game.brand.clone()),
                Cell::from(game.category_summary(2)),
                Cell::from(Span::styled(format!("{:.1}", game.rating), styles::rating_style())),
                Cell::from(format!("{:>7}", played)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(32),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(6),
        Constraint::Length(8),
    ];

    let mut title = format!(" Games ({})", games.len());
    if let Some(ref category) = app.category_filter {
        title.push_str(&format!(" [{}]", category));
    }
    title.push_str(" - [c]ategory ");

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !games.is_empty() {
        state.select(Some(app.games_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);

    if games.is_empty() {
        let message = if app.refreshing {
            "Loading games..."
        } else if app.search_query.is_empty() && app.category_filter.is_none() {
            "No games in the catalog yet"
        } else {
            "No games match your search"
        };
        let inner = Rect::new(area.x + 2, area.y + 3, area.width.saturating_sub(4), 1);
        frame.render_widget(Paragraph::new(message).style(styles::muted_style()), inner);
    }
}

fn render_game_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let Some(game) = app.selected_game() else {
        let block = Block::default()
            .title(" Details ")
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        frame.render_widget(
            Paragraph::new("Select a game").style(styles::muted_style()).block(block),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Percentage(40)])
        .split(area);

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));
    let paragraph = Paragraph::new(detail_lines(app, game))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[0]);

    render_reviews(frame, app, game, chunks[1], focused);
}

fn detail_lines<'a>(app: &App, game: &'a Game) -> Vec<Line<'a>> {
    let placeholder = "-";
    let mut lines = vec![
        Line::from(Span::styled(game.name.as_str(), styles::title_style())),
        Line::from(vec![
            Span::styled(star_bar(game.rating), styles::rating_style()),
            Span::styled(
                format!(" {:.1} ({} reviews)", game.rating, game.num_reviews),
                styles::muted_style(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Brand:      ", styles::muted_style()),
            Span::raw(game.brand.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Developer:  ", styles::muted_style()),
            Span::raw(game.developer.as_deref().unwrap_or(placeholder)),
        ]),
        Line::from(vec![
            Span::styled("Released:   ", styles::muted_style()),
            Span::raw(
                game.release_date
                    .as_deref()
                    .map(format_date)
                    .unwrap_or_else(|| placeholder.to_string()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Categories: ", styles::muted_style()),
            Span::raw(game.category.join(", ")),
        ]),
    ];

    if !game.platform.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Platforms:  ", styles::muted_style()),
            Span::raw(game.platform.join(", ")),
        ]));
    }

    let yes_no = |v: Option<bool>| match v {
        Some(true) => "Yes",
        Some(false) => "No",
        None => placeholder,
    };
    lines.push(Line::from(vec![
        Span::styled("Voice:      ", styles::muted_style()),
        Span::raw(yes_no(game.voice_acting)),
        Span::styled("   Soundtrack: ", styles::muted_style()),
        Span::raw(yes_no(game.soundtrack_included)),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Total play: ", styles::muted_style()),
        Span::raw(game.display_play_time()),
    ]));

    if app.is_authenticated() {
        lines.push(Line::from(vec![
            Span::styled("You played: ", styles::muted_style()),
            Span::styled(
                format_play_time(App::play_minutes(game)),
                styles::highlight_style(),
            ),
        ]));
    }

    if let Some(own) = app
        .identity()
        .and_then(|identity| find_user_review(game, &identity.id))
    {
        let rating = own
            .rating
            .map(|r| star_bar(f64::from(r)))
            .unwrap_or_else(|| "comment only".to_string());
        lines.push(Line::from(vec![
            Span::styled("Your review: ", styles::muted_style()),
            Span::styled(rating, styles::rating_style()),
        ]));
    }

    match app.review_eligibility(game).message() {
        Some(message) => lines.push(Line::from(Span::styled(message, styles::muted_style()))),
        None => lines.push(Line::from(Span::styled(
            "[r] review  [p] play",
            styles::success_style(),
        ))),
    }

    if !game.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::raw(game.description.as_str())));
    }

    lines
}

fn render_reviews(frame: &mut Frame, app: &App, game: &Game, area: Rect, focused: bool) {
    let own_id = app.identity().map(|identity| identity.id.as_str());
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = game
        .reviews
        .iter()
        .map(|review| {
            let is_own = own_id == Some(review.user.id.as_str());
            let mut header = vec![Span::styled(
                review.user.name.clone(),
                if is_own {
                    styles::highlight_style()
                } else {
                    styles::title_style()
                },
            )];
            if let Some(rating) = review.rating {
                header.push(Span::raw(" "));
                header.push(Span::styled(star_bar(f64::from(rating)), styles::rating_style()));
            }
            if let Some(minutes) = review.user_play_time {
                header.push(Span::styled(
                    format!("  played {}", format_play_time(minutes)),
                    styles::muted_style(),
                ));
            }
            if let Some(ref date) = review.created_at {
                header.push(Span::styled(format!("  {}", format_date(date)), styles::muted_style()));
            }

            let mut lines = vec![Line::from(header)];
            if let Some(comment) = review.comment_text() {
                lines.push(Line::from(Span::raw(truncate(comment, width.max(8)))));
            }
            ListItem::new(lines)
        })
        .collect();

    let title = format!(" Reviews ({}) ", game.reviews.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused && app.state == AppState::Normal)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !game.reviews.is_empty() {
        state.select(Some(app.review_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
