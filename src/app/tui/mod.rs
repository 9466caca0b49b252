mod actions;
mod render;
mod terminal;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::controller::{Controller, Notice, View};
use super::player::{MediaPlayer, MediaPosition};

use self::actions::{
    Intent, handle_catalog_key, handle_login_key, handle_player_key, handle_upload_prompt_key,
    run_intent,
};
use self::render::draw_tui;
use self::terminal::TerminalGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoginField {
    Username,
    AccessKey,
}

impl LoginField {
    pub(super) fn toggle(self) -> Self {
        match self {
            Self::Username => Self::AccessKey,
            Self::AccessKey => Self::Username,
        }
    }
}

/// Everything the screen shows that the controller does not own.
pub(super) struct UiState {
    pub(super) username: String,
    pub(super) access_key: String,
    pub(super) focus: LoginField,
    /// Index into catalog rows followed by upload rows.
    pub(super) selected: usize,
    pub(super) upload_prompt: Option<String>,
    pub(super) pending_notice: Option<Notice>,
    pub(super) status: String,
    pub(super) position: MediaPosition,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            username: String::new(),
            access_key: String::new(),
            focus: LoginField::Username,
            selected: 0,
            upload_prompt: None,
            pending_notice: None,
            status: actions::status_info("Enter your username and access key."),
            position: MediaPosition::unknown(),
        }
    }
}

pub(crate) fn run_tui<P: MediaPlayer>(mut controller: Controller<P>) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut ui = UiState::default();

    loop {
        if ui.pending_notice.is_none() {
            ui.pending_notice = controller.take_notice();
        }
        if controller.view() == View::Player {
            ui.position = controller.position();
        }
        terminal.draw(|frame| draw_tui(frame, &controller, &ui))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if ui.pending_notice.is_some() {
            ui.pending_notice = None;
            continue;
        }

        let interrupt =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        let intent = if interrupt {
            Intent::Quit
        } else if ui.upload_prompt.is_some() {
            handle_upload_prompt_key(&mut ui, key.code)
        } else {
            match controller.view() {
                View::Login => handle_login_key(&controller, &mut ui, key.code),
                View::Catalog => handle_catalog_key(&controller, &mut ui, key.code),
                View::Player => handle_player_key(key.code),
            }
        };

        if let Some(busy) = intent.busy_label() {
            ui.status = actions::status_info(busy);
            terminal.draw(|frame| draw_tui(frame, &controller, &ui))?;
        }
        if run_intent(&mut controller, &mut ui, intent) {
            break;
        }
    }

    terminal.show_cursor()?;
    guard.leave()?;
    Ok(())
}
