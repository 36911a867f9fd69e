mod app;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppError, AppEvent, AppModel};
use crate::domain::{DatasetRecord, build_dataset_url};
use crate::infra::{SessionClient, open_in_browser};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::time::Duration;

// Fixed at build time, matching the deployment this tool points at. No CLI
// flags, env vars or config files.
const BASE_URL: &str = "http://11.11.50.39:8190";
const DEFAULT_USERNAME: &str = "admin@example.com";
const DEFAULT_PASSWORD: &str = "Password123";
const PAGE_NO: u32 = 1;
const PAGE_SIZE: u32 = 100;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn main() {
    if let Err(error) = run_tui() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_tui() -> Result<(), AppError> {
    let client = SessionClient::new(BASE_URL, HTTP_TIMEOUT);
    let mut model = AppModel::new();
    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut model, &client);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), AppError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    client: &SessionClient,
) -> Result<(), AppError> {
    login_and_fetch(terminal, model, client)?;

    loop {
        terminal.draw(|frame| ui::render(frame, model))?;

        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let (next, command) = app::update(model.clone(), AppEvent::Key(key));
                    *model = next;
                    match command {
                        AppCommand::None => {}
                        AppCommand::Quit => return Ok(()),
                        AppCommand::Refresh => login_and_fetch(terminal, model, client)?,
                        AppCommand::OpenSelection { records } => open_selection(model, &records),
                    }
                }
                Event::Paste(text) => {
                    let (next, _command) = app::update(model.clone(), AppEvent::Paste(text));
                    *model = next;
                }
                _ => {}
            }
        }
    }
}

/// Both network calls block this thread; the sequencing (and its redraws
/// between stages) lives in `app::perform_refresh`.
fn login_and_fetch(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    client: &SessionClient,
) -> Result<(), AppError> {
    app::perform_refresh(
        model,
        |model| {
            terminal.draw(|frame| ui::render(frame, model))?;
            Ok(())
        },
        || client.login(DEFAULT_USERNAME, DEFAULT_PASSWORD),
        |token| client.fetch_datasets(token, PAGE_NO, PAGE_SIZE),
    )
}

fn open_selection(model: &mut AppModel, records: &[DatasetRecord]) {
    let Some(token) = model.session.token.clone() else {
        model.notice = Some("Not logged in. Press Ctrl+R to refresh.".to_string());
        return;
    };

    let url = match build_dataset_url(BASE_URL, records, &token) {
        Ok(url) => url,
        Err(error) => {
            model.notice = Some(error.to_string());
            return;
        }
    };

    model.status = "Opening browser...".to_string();
    match open_in_browser(&url) {
        Ok(()) => {
            model.status = "Opened in browser".to_string();
        }
        Err(error) => {
            model.status = "Error occurred".to_string();
            model.notice = Some(format!("Failed to open browser: {error}"));
        }
    }
}
