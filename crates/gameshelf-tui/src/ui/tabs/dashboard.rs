use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use gameshelf_core::models::UserDashboard;
use gameshelf_core::utils::{format_date, format_play_time, star_bar, truncate};

use crate::app::{App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref dashboard) = app.dashboard else {
        let message = if app.refreshing {
            "Loading dashboard..."
        } else {
            "No dashboard data - press [u] to refresh"
        };
        let block = Block::default()
            .title(" Dashboard ")
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(
            Paragraph::new(message).style(styles::muted_style()).block(block),
            area,
        );
        return;
    };

    // 1. Profile | Stats
    // 2. Played games | Comments
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(8)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[0]);
    render_profile(frame, app, dashboard, top[0]);
    render_stats(frame, dashboard, top[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);
    render_played_games(frame, app, dashboard, bottom[0]);
    render_comments(frame, app, dashboard, bottom[1]);
}

fn render_profile(frame: &mut Frame, app: &App, dashboard: &UserDashboard, area: Rect) {
    let user = &dashboard.user;
    let initial = app.identity().map(|i| i.initial()).unwrap_or('?');

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("({}) ", initial), styles::highlight_style()),
            Span::styled(user.name.as_str(), styles::title_style()),
        ]),
        Line::from(vec![
            Span::styled("Email:  ", styles::muted_style()),
            Span::raw(user.email.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Role:   ", styles::muted_style()),
            if user.is_admin {
                Span::styled(user.role(), styles::admin_style())
            } else {
                Span::raw(user.role())
            },
        ]),
    ];
    if let Some(ref created) = user.created_at {
        lines.push(Line::from(vec![
            Span::styled("Joined: ", styles::muted_style()),
            Span::raw(format_date(created)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[P] edit profile  [L] log out",
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stats(frame: &mut Frame, dashboard: &UserDashboard, area: Rect) {
    let stats = &dashboard.stats;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total play time:  ", styles::muted_style()),
            Span::styled(format_play_time(stats.total_play_time), styles::highlight_style()),
        ]),
        Line::from(vec![
            Span::styled("Games played:     ", styles::muted_style()),
            Span::raw(stats.games_played_count.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Average rating:   ", styles::muted_style()),
            Span::styled(stats.display_average_rating(), styles::rating_style()),
            Span::styled(format!(" ({} ratings)", stats.rating_count), styles::muted_style()),
        ]),
        Line::from(vec![
            Span::styled("Comments:         ", styles::muted_style()),
            Span::raw(stats.comments_count.to_string()),
        ]),
    ];

    match dashboard.most_played_game {
        Some(ref most) => lines.push(Line::from(vec![
            Span::styled("Most played:      ", styles::muted_style()),
            Span::styled(most.game.name.as_str(), styles::success_style()),
            Span::styled(
                format!(" ({})", format_play_time(most.play_time)),
                styles::muted_style(),
            ),
        ])),
        None => lines.push(Line::from(Span::styled(
            "Play a game to see your favourite here",
            styles::muted_style(),
        ))),
    }

    let block = Block::default()
        .title(" Stats ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_played_games(frame: &mut Frame, app: &App, dashboard: &UserDashboard, area: Rect) {
    let focused = app.focus == Focus::List;
    let items: Vec<ListItem> = dashboard
        .played_games
        .iter()
        .map(|played| {
            let mut spans = vec![
                Span::styled(format!("{:>7}  ", format_play_time(played.play_time)), styles::highlight_style()),
                Span::raw(played.game.name.as_str()),
            ];
            if let Some(rating) = played.game.rating {
                spans.push(Span::styled(format!("  {:.1}", rating), styles::rating_style()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Played Games ({}) ", dashboard.played_games.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !dashboard.played_games.is_empty() {
        state.select(Some(app.dashboard_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_comments(frame: &mut Frame, app: &App, dashboard: &UserDashboard, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = dashboard
        .comments
        .iter()
        .map(|comment| {
            let mut header = vec![Span::styled(comment.game_name.as_str(), styles::title_style())];
            if let Some(rating) = comment.rating {
                header.push(Span::raw(" "));
                header.push(Span::styled(star_bar(f64::from(rating)), styles::rating_style()));
            }
            if let Some(ref date) = comment.created_at {
                header.push(Span::styled(format!("  {}", format_date(date)), styles::muted_style()));
            }
            ListItem::new(vec![
                Line::from(header),
                Line::from(Span::raw(truncate(&comment.comment, width.max(8)))),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Your Reviews ({}) ", dashboard.comments.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !dashboard.comments.is_empty() {
        state.select(Some(app.dashboard_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
