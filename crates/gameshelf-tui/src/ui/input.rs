//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, Focus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};
use crate::form::FormKind;

/// Move a list selection for the common navigation keys.
/// Returns true if the key was a navigation key.
fn navigate(selection: &mut usize, len: usize, key: KeyCode) -> bool {
    let max_index = len.saturating_sub(1);
    match key {
        KeyCode::Char('j') | KeyCode::Down => *selection = (*selection + 1).min(max_index),
        KeyCode::Char('k') | KeyCode::Up => *selection = selection.saturating_sub(1),
        KeyCode::Home => *selection = 0,
        KeyCode::End => *selection = max_index,
        KeyCode::PageDown => *selection = (*selection + PAGE_SCROLL_SIZE).min(max_index),
        KeyCode::PageUp => *selection = selection.saturating_sub(PAGE_SCROLL_SIZE),
        _ => return false,
    }
    true
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::EditingForm => return handle_form_input(app, key).await,
        AppState::Searching => return handle_search_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => app.select_tab(Tab::Games),
        KeyCode::Char('2') => app.select_tab(Tab::Dashboard),
        KeyCode::Char('3') => app.select_tab(Tab::Users),
        KeyCode::Char('4') => app.select_tab(Tab::ManageGames),
        KeyCode::Left => app.prev_tab(),
        KeyCode::Right => app.next_tab(),
        KeyCode::Char('u') => app.refresh_all_background(),
        KeyCode::Char('l') if !app.is_authenticated() => app.start_login(),
        KeyCode::Char('L') if app.is_authenticated() => app.logout(),
        KeyCode::Char('P') if app.is_authenticated() => app.open_profile_form(),
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
        }
        KeyCode::Tab => {
            // Toggle focus between list and detail panels
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
            app.dashboard_selection = 0;
        }
        KeyCode::Esc => {
            if app.focus == Focus::Detail {
                app.focus = Focus::List;
            } else {
                app.search_query.clear();
                app.category_filter = None;
            }
        }
        _ => match app.current_tab {
            Tab::Games => handle_games_input(app, key).await?,
            Tab::Dashboard => handle_dashboard_input(app, key),
            Tab::Users => handle_users_input(app, key),
            Tab::ManageGames => handle_manage_games_input(app, key).await?,
        },
    }

    Ok(false)
}

async fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            // Keep search query active
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.search_query.push(c);
            // Reset selection when search changes
            app.games_selection = 0;
            app.users_selection = 0;
            app.manage_selection = 0;
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Fields are frozen while the request is in flight
    if app.session.is_loading() {
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => {
            // Keep browsing anonymously
            app.session.clear_error();
            app.state = AppState::Normal;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Register,
                LoginFocus::Register => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Register,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
                LoginFocus::Register => LoginFocus::Button,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                app.login_focus = LoginFocus::Button;
                app.attempt_login();
            }
            LoginFocus::Register => {
                app.open_register_form();
            }
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Email => {
                    app.login_email.pop();
                }
                LoginFocus::Password => {
                    app.login_password.pop();
                }
                LoginFocus::Button | LoginFocus::Register => return Ok(false),
            }
            app.on_login_edit();
        }
        KeyCode::Char(c) => {
            let accepted = match app.login_focus {
                LoginFocus::Email => {
                    let ok = can_add_email_char(app.login_email.chars().count(), c);
                    if ok {
                        app.login_email.push(c);
                    }
                    ok
                }
                LoginFocus::Password => {
                    let ok = can_add_password_char(app.login_password.chars().count(), c);
                    if ok {
                        app.login_password.push(c);
                    }
                    ok
                }
                LoginFocus::Button | LoginFocus::Register => false,
            };
            if accepted {
                app.on_login_edit();
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            let back_to_login = app
                .form
                .as_ref()
                .is_some_and(|f| f.kind == FormKind::Register);
            app.close_form();
            if back_to_login {
                app.state = AppState::LoggingIn;
            }
            return Ok(false);
        }
        KeyCode::Enter => {
            app.submit_form().await;
            return Ok(false);
        }
        _ => {}
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };
    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Left => form.cycle(false),
        KeyCode::Right => form.cycle(true),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
    Ok(false)
}

async fn handle_games_input(app: &mut App, key: KeyEvent) -> Result<()> {
    match app.focus {
        Focus::List => {
            let len = app.visible_games().len();
            if navigate(&mut app.games_selection, len, key.code) {
                app.review_selection = 0;
                return Ok(());
            }
            match key.code {
                KeyCode::Enter => {
                    app.fetch_game_detail().await;
                    app.focus = Focus::Detail;
                }
                KeyCode::Char('c') => app.cycle_category(),
                KeyCode::Char('p') => app.open_play_form(),
                KeyCode::Char('r') => app.open_review_form(),
                _ => {}
            }
        }
        Focus::Detail => {
            let len = app.selected_game().map(|g| g.reviews.len()).unwrap_or(0);
            if navigate(&mut app.review_selection, len, key.code) {
                return Ok(());
            }
            match key.code {
                KeyCode::Char('p') => app.open_play_form(),
                KeyCode::Char('r') => app.open_review_form(),
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    let len = app
        .dashboard
        .as_ref()
        .map(|d| match app.focus {
            Focus::List => d.played_games.len(),
            Focus::Detail => d.comments.len(),
        })
        .unwrap_or(0);
    navigate(&mut app.dashboard_selection, len, key.code);
}

fn handle_users_input(app: &mut App, key: KeyEvent) {
    let len = app.visible_users().len();
    if navigate(&mut app.users_selection, len, key.code) {
        return;
    }
    match key.code {
        KeyCode::Enter | KeyCode::Char('e') => app.open_user_edit_form(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => {}
    }
}

async fn handle_manage_games_input(app: &mut App, key: KeyEvent) -> Result<()> {
    let len = app.visible_admin_games().len();
    if navigate(&mut app.manage_selection, len, key.code) {
        return Ok(());
    }
    match key.code {
        KeyCode::Char('n') => app.open_game_editor(true),
        KeyCode::Enter | KeyCode::Char('e') => app.open_game_editor(false),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('t') => app.toggle_game_flag(true).await,
        KeyCode::Char('c') => app.toggle_game_flag(false).await,
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use gameshelf_core::auth::MemoryStorage;
    use gameshelf_core::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn anonymous_app() -> App {
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9/api".to_string()),
            ..Default::default()
        };
        App::with_config_file(config, Box::new(MemoryStorage::new()), None).unwrap()
    }

    #[test]
    fn test_navigate_clamps() {
        let mut selection = 0;
        assert!(navigate(&mut selection, 3, KeyCode::Down));
        assert!(navigate(&mut selection, 3, KeyCode::End));
        assert_eq!(selection, 2);
        navigate(&mut selection, 3, KeyCode::Down);
        assert_eq!(selection, 2);
        navigate(&mut selection, 3, KeyCode::PageUp);
        assert_eq!(selection, 0);
        assert!(!navigate(&mut selection, 3, KeyCode::Char('x')));
    }

    #[tokio::test]
    async fn test_login_focus_cycles_through_register() {
        let mut app = anonymous_app();
        app.start_login();
        app.login_focus = LoginFocus::Email;
        for expected in [
            LoginFocus::Password,
            LoginFocus::Button,
            LoginFocus::Register,
            LoginFocus::Email,
        ] {
            handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
            assert_eq!(app.login_focus, expected);
        }
    }

    #[tokio::test]
    async fn test_login_escape_returns_to_browsing() {
        let mut app = anonymous_app();
        app.start_login();
        let quit = handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(!quit);
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_register_form_escape_returns_to_login() {
        let mut app = anonymous_app();
        app.start_login();
        app.login_focus = LoginFocus::Register;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.state, AppState::EditingForm);

        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_invalid_register_form_stays_open() {
        let mut app = anonymous_app();
        app.open_register_form();
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.state, AppState::EditingForm);
        assert_eq!(
            app.form.as_ref().and_then(|f| f.error.as_deref()),
            Some("Name, email and password are required")
        );
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = anonymous_app();
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_typing_resets_selection() {
        let mut app = anonymous_app();
        app.games_selection = 4;
        handle_input(&mut app, key(KeyCode::Char('/'))).await.unwrap();
        handle_input(&mut app, key(KeyCode::Char('h'))).await.unwrap();
        assert_eq!(app.search_query, "h");
        assert_eq!(app.games_selection, 0);
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.search_query, "h");
    }
}
