use std::path::PathBuf;

use crossterm::event::KeyCode;

use super::super::api::UploadedMovie;
use super::super::catalog::{CATALOG, CatalogEntry};
use super::super::controller::{Controller, View};
use super::super::player::MediaPlayer;
use super::{LoginField, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Intent {
    None,
    SignIn,
    Play(usize),
    Save,
    Back,
    Upload(PathBuf),
    Refresh,
    Logout,
    Quit,
}

impl Intent {
    /// Status shown while the blocking request for this intent runs.
    pub(super) fn busy_label(&self) -> Option<&'static str> {
        match self {
            Self::SignIn => Some("Signing in..."),
            Self::Play(_) => Some("Loading video..."),
            Self::Save | Self::Back => Some("Saving progress..."),
            Self::Upload(_) => Some("Uploading..."),
            Self::Refresh => Some("Refreshing..."),
            Self::None | Self::Logout | Self::Quit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Selection {
    Catalog(&'static CatalogEntry),
    Upload(UploadedMovie),
}

pub(super) fn row_count<P: MediaPlayer>(controller: &Controller<P>) -> usize {
    CATALOG.len() + controller.uploads().len()
}

pub(super) fn selection_at<P: MediaPlayer>(
    controller: &Controller<P>,
    index: usize,
) -> Option<Selection> {
    if let Some(entry) = CATALOG.get(index) {
        return Some(Selection::Catalog(entry));
    }
    controller
        .uploads()
        .get(index - CATALOG.len())
        .cloned()
        .map(Selection::Upload)
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

fn focused_field(ui: &mut UiState) -> &mut String {
    match ui.focus {
        LoginField::Username => &mut ui.username,
        LoginField::AccessKey => &mut ui.access_key,
    }
}

pub(super) fn handle_login_key<P: MediaPlayer>(
    controller: &Controller<P>,
    ui: &mut UiState,
    code: KeyCode,
) -> Intent {
    match code {
        KeyCode::Esc => Intent::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            ui.focus = ui.focus.toggle();
            Intent::None
        }
        KeyCode::Enter if controller.login_enabled() => Intent::SignIn,
        KeyCode::Backspace => {
            focused_field(ui).pop();
            Intent::None
        }
        KeyCode::Char(ch) => {
            focused_field(ui).push(ch);
            Intent::None
        }
        _ => Intent::None,
    }
}

pub(super) fn handle_catalog_key<P: MediaPlayer>(
    controller: &Controller<P>,
    ui: &mut UiState,
    code: KeyCode,
) -> Intent {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Intent::Quit,
        KeyCode::Up => {
            ui.selected = ui.selected.saturating_sub(1);
            Intent::None
        }
        KeyCode::Down => {
            ui.selected = (ui.selected + 1).min(row_count(controller).saturating_sub(1));
            Intent::None
        }
        KeyCode::Enter => Intent::Play(ui.selected),
        KeyCode::Char('u') => {
            ui.upload_prompt = Some(String::new());
            ui.status = status_info("Type a video file path. Enter uploads, Esc cancels.");
            Intent::None
        }
        KeyCode::Char('r') => Intent::Refresh,
        KeyCode::Char('l') => Intent::Logout,
        _ => Intent::None,
    }
}

pub(super) fn handle_player_key(code: KeyCode) -> Intent {
    match code {
        KeyCode::Char('p') => Intent::Save,
        KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => Intent::Back,
        KeyCode::Char('q') => Intent::Quit,
        _ => Intent::None,
    }
}

pub(super) fn handle_upload_prompt_key(ui: &mut UiState, code: KeyCode) -> Intent {
    let Some(input) = ui.upload_prompt.as_mut() else {
        return Intent::None;
    };
    match code {
        KeyCode::Esc => {
            ui.upload_prompt = None;
            ui.status = status_info("Upload canceled.");
            Intent::None
        }
        KeyCode::Enter => {
            let path = input.trim().to_string();
            if path.is_empty() {
                return Intent::None;
            }
            ui.upload_prompt = None;
            Intent::Upload(PathBuf::from(path))
        }
        KeyCode::Backspace => {
            input.pop();
            Intent::None
        }
        KeyCode::Char(ch) => {
            input.push(ch);
            Intent::None
        }
        _ => Intent::None,
    }
}

fn clamp_selection<P: MediaPlayer>(controller: &Controller<P>, ui: &mut UiState) {
    ui.selected = ui.selected.min(row_count(controller).saturating_sub(1));
}

/// Runs one intent against the controller. Returns `true` when the UI should
/// exit.
pub(super) fn run_intent<P: MediaPlayer>(
    controller: &mut Controller<P>,
    ui: &mut UiState,
    intent: Intent,
) -> bool {
    match intent {
        Intent::None => {}
        Intent::SignIn => {
            if controller.authenticate(&ui.username, &ui.access_key) {
                ui.access_key.clear();
                ui.selected = 0;
                ui.status = status_info(&format!(
                    "Signed in as {}.",
                    controller.session().display_name()
                ));
            } else {
                ui.status = status_error("Sign-in failed.");
            }
        }
        Intent::Play(index) => {
            let started = match selection_at(controller, index) {
                Some(Selection::Catalog(entry)) => controller.play_movie(entry.movie_id),
                Some(Selection::Upload(movie)) => controller.play_upload(&movie),
                None => false,
            };
            ui.status = if started {
                status_info("Playing. p saves progress, b returns to movies.")
            } else {
                status_error("Playback did not start.")
            };
        }
        Intent::Save => {
            ui.status = if controller.save_progress() {
                status_info("Progress saved.")
            } else {
                status_error("Progress not saved.")
            };
        }
        Intent::Back => {
            controller.back_to_movies();
            ui.status = status_info("Ready.");
        }
        Intent::Upload(path) => {
            ui.status = if controller.upload_file(&path) {
                status_info(&format!("Uploaded {}.", path.display()))
            } else {
                status_error("Upload failed.")
            };
            clamp_selection(controller, ui);
        }
        Intent::Refresh => {
            controller.load_all_progress();
            controller.load_user_movies();
            clamp_selection(controller, ui);
            ui.status = status_info("Refreshed.");
        }
        Intent::Logout => {
            controller.logout();
            *ui = UiState::default();
            ui.status = status_info("Signed out.");
        }
        Intent::Quit => {
            if controller.view() == View::Player {
                controller.back_to_movies();
            }
            return true;
        }
    }
    false
}
