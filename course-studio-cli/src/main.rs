mod client;
mod config;
mod error;
mod format;
mod history_log;
mod keymap;
mod response;
mod rich_text;
mod state;
mod ui;

use anyhow::Result;
use client::{BackendClient, Completion};
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use history_log::HistoryLogger;
use keymap::Command;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use state::{Action, Effect, ScrollLimits, ViewState};
use std::io;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Bad configuration should be reported before the terminal enters raw mode
    let config = Config::load()?;

    // Initialize logging to file instead of terminal to avoid corrupting TUI
    let log_file = std::fs::File::create(&config.log_file).ok();
    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .init();
    }

    info!("Using backend at {}", config.backend_url);

    let history_log = match &config.history_dir {
        Some(dir) => HistoryLogger::new(dir).unwrap_or_else(|e| {
            error!("Failed to create history log in {:?}: {}", dir, e);
            HistoryLogger::disabled()
        }),
        None => HistoryLogger::disabled(),
    };
    if let Some(path) = history_log.path() {
        info!("Logging history to: {:?}", path);
    }

    let (client, mut completion_rx) = BackendClient::new(config.backend_url.clone(), config.timeout)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = ViewState::new();
    state.apply(Action::SelectOperation(config.operation));

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        while let Ok(event) = event::read() {
            if ui_tx.send(event).is_err() {
                break;
            }
        }
    });

    let res = run_app(
        &mut terminal,
        &mut state,
        &client,
        &history_log,
        &mut completion_rx,
        &mut ui_rx,
    )
    .await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn handle(state: &mut ViewState, action: Action, client: &BackendClient, history_log: &HistoryLogger) {
    match state.apply(action) {
        Effect::Dispatch(submission) => client.dispatch(submission),
        Effect::Appended(index) => {
            if let Err(e) = history_log.log_entry(&state.history()[index]) {
                error!("Failed to log history entry: {}", e);
            }
        }
        Effect::None => {}
    }
}

fn completion_action(completion: Completion) -> Action {
    match completion.result {
        Ok(payload) => {
            info!(
                "Submission {} ({}) succeeded",
                completion.seq, completion.operation
            );
            Action::SubmitSuccess {
                seq: completion.seq,
                payload,
            }
        }
        Err(e) => {
            error!(
                "Submission {} ({}) failed: {}",
                completion.seq, completion.operation, e
            );
            Action::SubmitError {
                seq: completion.seq,
            }
        }
    }
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut ViewState,
    client: &BackendClient,
    history_log: &HistoryLogger,
    completion_rx: &mut mpsc::UnboundedReceiver<Completion>,
    ui_rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    loop {
        let mut limits = ScrollLimits::default();
        terminal.draw(|f| limits = ui::draw(f, state, history_log.path()))?;
        state.apply(Action::SetScrollLimits(limits));

        tokio::select! {
            Some(event) = ui_rx.recv() => {
                match keymap::command_for(&event) {
                    Some(Command::Quit) => return Ok(()),
                    Some(Command::Apply(action)) => handle(state, action, client, history_log),
                    None => {}
                }
            }
            Some(completion) = completion_rx.recv() => {
                let action = completion_action(completion);
                handle(state, action, client, history_log);
            }
            else => return Ok(()),
        }
    }
}
