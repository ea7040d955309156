//! GameShelf - a terminal client for the GameShelf game catalog.
//!
//! This application provides a fast, keyboard-driven interface for browsing
//! games, logging play time, writing reviews and (for admins) managing the
//! catalog and user accounts.

mod app;
mod form;
mod ui;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gameshelf_core::api::user_message;
use gameshelf_core::forms::LoginForm;
use gameshelf_core::utils::{format_play_time, truncate};
use gameshelf_core::{ApiClient, Config, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written while the TUI owns the terminal
const LOG_FILE: &str = "gameshelf.log";

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Tui,
    Login,
    Logout,
    Whoami,
    Games { json: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    command: Command,
    /// Keep the session in memory only
    ephemeral: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut ephemeral = false;
    let mut json = false;
    let mut command: Option<&str> = None;

    for arg in args {
        match arg.as_str() {
            "--ephemeral" => ephemeral = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            name if command.is_none() => command = Some(name),
            extra => bail!("Unexpected argument: {}", extra),
        }
    }

    let command = match command {
        None => Command::Tui,
        Some("login") => Command::Login,
        Some("logout") => Command::Logout,
        Some("whoami") => Command::Whoami,
        Some("games") => Command::Games { json },
        Some(other) => bail!(
            "Unknown command: {} (expected login, logout, whoami or games)",
            other
        ),
    };
    if json && !matches!(command, Command::Games { .. }) {
        bail!("--json is only supported by the games command");
    }

    Ok(CliArgs { command, ephemeral })
}

// ============================================================================
// Logging
// ============================================================================

/// Initialize the tracing subscriber for logging.
///
/// The TUI logs to a file so output does not corrupt the screen; the
/// returned guard flushes it on drop. CLI commands log to stderr.
fn init_tracing(to_file: bool) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = if to_file { Config::data_dir().ok() } else { None };
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let _log_guard = init_tracing(cli.command == Command::Tui);
    info!(command = ?cli.command, ephemeral = cli.ephemeral, "GameShelf starting");

    let config = Config::load()?;

    match cli.command {
        Command::Tui => run_tui(config, cli.ephemeral).await,
        Command::Login => login_command(config, cli.ephemeral).await,
        Command::Logout => logout_command(&config, cli.ephemeral),
        Command::Whoami => whoami_command(&config, cli.ephemeral),
        Command::Games { json } => games_command(&config, cli.ephemeral, json).await,
    }
}

// ============================================================================
// CLI commands
// ============================================================================

/// Prompt for a line on stdin, falling back to `default` when left empty
fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => eprint!("{} [{}]: ", label, d),
        None => eprint!("{}: ", label),
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(line.to_string())
    }
}

async fn login_command(mut config: Config, ephemeral: bool) -> Result<()> {
    let storage = config.open_storage(ephemeral)?;
    let mut store = SessionStore::open(storage);

    let email = prompt("Email", config.default_email().as_deref())?;
    let password = match Config::env_password() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };
    let request = LoginForm { email, password }.validate()?;

    let mut api = ApiClient::new(&config.api_base_url())?;
    store.begin_login();
    match api.login(&request).await {
        Ok(response) => match response.into_parts() {
            Ok((identity, token)) => {
                api.set_token(&token);
                store.login(identity, token);
            }
            Err(e) => {
                let message = e.user_message();
                store.fail_login(message.clone());
                bail!(message);
            }
        },
        Err(e) => {
            let message = user_message(&e);
            store.fail_login(message.clone());
            bail!(message);
        }
    }

    config.last_email = Some(request.email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if let Some(identity) = store.identity() {
        println!("Logged in as {} <{}>", identity.name, identity.email);
    }
    Ok(())
}

fn logout_command(config: &Config, ephemeral: bool) -> Result<()> {
    let mut store = SessionStore::open(config.open_storage(ephemeral)?);
    if store.is_authenticated() {
        store.logout();
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn whoami_command(config: &Config, ephemeral: bool) -> Result<()> {
    let store = SessionStore::open(config.open_storage(ephemeral)?);
    match store.identity() {
        Some(identity) => {
            let role = if identity.is_admin { " (admin)" } else { "" };
            println!("{} <{}>{}", identity.name, identity.email, role);
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn games_command(config: &Config, ephemeral: bool, json: bool) -> Result<()> {
    let store = SessionStore::open(config.open_storage(ephemeral)?);
    let mut api = ApiClient::new(&config.api_base_url())?;

    // Play time needs the detailed listing, which needs a token
    let result = match store.token() {
        Some(token) => {
            api.set_token(token);
            api.fetch_detailed_games().await
        }
        None => api.fetch_games().await,
    };
    let games = result.map_err(|e| anyhow::anyhow!(user_message(&e)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&games)?);
        return Ok(());
    }

    if games.is_empty() {
        println!("No games in the catalog yet");
        return Ok(());
    }
    for game in &games {
        let played = game
            .current_user_play_time
            .filter(|m| *m > 0)
            .map(format_play_time)
            .unwrap_or_default();
        println!(
            "{:<32} {:<20} {:>4.1} {:>8}",
            truncate(&game.name, 32),
            truncate(&game.brand, 20),
            game.rating,
            played
        );
    }
    Ok(())
}

// ============================================================================
// TUI
// ============================================================================

async fn run_tui(config: Config, ephemeral: bool) -> Result<()> {
    let storage = config.open_storage(ephemeral)?;
    let mut app = App::new(config, storage)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.refresh_all_background();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("GameShelf shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_starts_tui() {
        let cli = parse_args(&[]).unwrap();
        assert_eq!(cli.command, Command::Tui);
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_ephemeral_in_any_position() {
        let cli = parse_args(&args(&["--ephemeral", "whoami"])).unwrap();
        assert_eq!(cli.command, Command::Whoami);
        assert!(cli.ephemeral);

        let cli = parse_args(&args(&["login", "--ephemeral"])).unwrap();
        assert_eq!(cli.command, Command::Login);
        assert!(cli.ephemeral);
    }

    #[test]
    fn test_games_json() {
        let cli = parse_args(&args(&["games", "--json"])).unwrap();
        assert_eq!(cli.command, Command::Games { json: true });
        assert_eq!(
            parse_args(&args(&["games"])).unwrap().command,
            Command::Games { json: false }
        );
    }

    #[test]
    fn test_rejects_bad_args() {
        assert!(parse_args(&args(&["dance"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
        assert!(parse_args(&args(&["whoami", "extra"])).is_err());
        assert!(parse_args(&args(&["whoami", "--json"])).is_err());
    }
}
