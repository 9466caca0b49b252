use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};

use super::api::{ApiClient, ApiError, UploadedMovie};
use super::catalog::{CATALOG, clamp_percent, display_title, find_entry, playback_percent};
use super::player::{MediaPlayer, MediaPosition};
use super::session::{PlaybackContext, Session};

pub(crate) const LOGIN_REQUIRED: &str = "Please log in first.";
pub(crate) const MISSING_CREDENTIALS: &str = "Please enter a username and access key.";
pub(crate) const LOGIN_REJECTED: &str = "Invalid username or access key.";
pub(crate) const VIDEO_UNAVAILABLE: &str = "Video is not available.";
pub(crate) const PROGRESS_SAVED: &str = "Progress saved.";
pub(crate) const NOTHING_PLAYING: &str = "No movie is playing.";
pub(crate) const POSITION_UNKNOWN: &str = "Playback position is not available yet.";
pub(crate) const UPLOAD_COMPLETE: &str = "Upload complete.";
pub(crate) const NO_UPLOADS: &str = "No uploaded movies yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Login,
    Catalog,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Info,
    Error,
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) kind: NoticeKind,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GridItem {
    Placeholder(&'static str),
    Card(UploadedMovie),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NowPlaying {
    pub(crate) movie_id: String,
    pub(crate) label: String,
    /// `None` hides the description pane.
    pub(crate) description: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveOutcome {
    Skipped,
    Saved,
    Failed,
}

pub(crate) struct Controller<P: MediaPlayer> {
    api: ApiClient,
    player: P,
    session: Session,
    playback: PlaybackContext,
    view: View,
    progress: HashMap<&'static str, f64>,
    uploads: Option<Vec<UploadedMovie>>,
    now_playing: Option<NowPlaying>,
    login_enabled: bool,
    notices: VecDeque<Notice>,
}

impl<P: MediaPlayer> Controller<P> {
    pub(crate) fn new(api: ApiClient, player: P) -> Self {
        Self {
            api,
            player,
            session: Session::default(),
            playback: PlaybackContext::default(),
            view: View::Login,
            progress: HashMap::new(),
            uploads: None,
            now_playing: None,
            login_enabled: true,
            notices: VecDeque::new(),
        }
    }

    pub(crate) fn view(&self) -> View {
        self.view
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn login_enabled(&self) -> bool {
        self.login_enabled
    }

    pub(crate) fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn active_movie_id(&self) -> Option<&str> {
        self.playback.active_movie_id()
    }

    /// Width of a catalog movie's progress bar, in percent.
    pub(crate) fn progress_for(&self, movie_id: &str) -> f64 {
        self.progress.get(movie_id).copied().unwrap_or(0.0)
    }

    pub(crate) fn uploads(&self) -> &[UploadedMovie] {
        self.uploads.as_deref().unwrap_or_default()
    }

    pub(crate) fn upload_grid(&self) -> Vec<GridItem> {
        match self.uploads.as_deref() {
            None => Vec::new(),
            Some([]) => vec![GridItem::Placeholder(NO_UPLOADS)],
            Some(movies) => movies.iter().cloned().map(GridItem::Card).collect(),
        }
    }

    pub(crate) fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub(crate) fn position(&mut self) -> MediaPosition {
        self.player.position()
    }

    pub(crate) fn player_active(&mut self) -> bool {
        self.player.is_active()
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> &P {
        &self.player
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.push_back(Notice {
            kind,
            message: message.into(),
        });
    }

    fn require_user(&mut self) -> Option<String> {
        match self.session.user_id() {
            Some(user_id) => Some(user_id.to_string()),
            None => {
                self.notify(NoticeKind::Error, LOGIN_REQUIRED);
                None
            }
        }
    }

    pub(crate) fn authenticate(&mut self, username: &str, access_key: &str) -> bool {
        let username = username.trim();
        if username.is_empty() || access_key.is_empty() {
            self.notify(NoticeKind::Error, MISSING_CREDENTIALS);
            return false;
        }

        self.login_enabled = false;
        match self.api.authenticate(username, access_key) {
            Ok(identity) => {
                info!("signed in as {} ({})", identity.username, identity.user_id);
                self.session.sign_in(identity);
                self.view = View::Catalog;
                self.load_all_progress();
                self.load_user_movies();
                true
            }
            Err(err) => {
                self.login_enabled = true;
                let message = match err {
                    ApiError::Rejected(reason) => {
                        reason.unwrap_or_else(|| LOGIN_REJECTED.to_string())
                    }
                    other => format!("Login failed: {other}"),
                };
                warn!("sign-in for {username} failed: {message}");
                self.notify(NoticeKind::Error, message);
                false
            }
        }
    }

    pub(crate) fn logout(&mut self) {
        self.player.clear();
        self.session.sign_out();
        self.playback.clear();
        self.progress.clear();
        self.uploads = None;
        self.now_playing = None;
        self.login_enabled = true;
        self.view = View::Login;
    }

    /// Looks up progress for each catalog movie, one request at a time and in
    /// catalog order. A failed lookup leaves that bar untouched.
    pub(crate) fn load_all_progress(&mut self) {
        let Some(user_id) = self.require_user() else {
            return;
        };

        let api = &self.api;
        let lookups = CATALOG
            .iter()
            .map(|entry| (entry.movie_id, api.get_progress(&user_id, entry.movie_id)));
        for (movie_id, result) in lookups {
            match result {
                Ok(percent) => {
                    debug!("progress for {movie_id}: {percent}");
                    self.progress.insert(movie_id, clamp_percent(percent));
                }
                Err(err) => warn!("failed to load progress for {movie_id}: {err}"),
            }
        }
    }

    pub(crate) fn load_user_movies(&mut self) {
        let Some(user_id) = self.require_user() else {
            return;
        };

        match self.api.list_user_movies(&user_id) {
            Ok(movies) => {
                debug!("{} uploaded movie(s) for {user_id}", movies.len());
                self.uploads = Some(movies);
            }
            Err(err) => {
                warn!("failed to list uploaded movies: {err}");
                self.notify(NoticeKind::Error, format!("Error loading your movies: {err}"));
            }
        }
    }

    pub(crate) fn play_movie(&mut self, movie_id: &str) -> bool {
        if !self.session.is_authenticated() {
            self.notify(NoticeKind::Error, LOGIN_REQUIRED);
            return false;
        }

        match self.api.get_video(movie_id) {
            Ok(video_url) => {
                let description = find_entry(movie_id).map(|entry| entry.description);
                self.start_playback(movie_id, &video_url, description)
            }
            Err(ApiError::Rejected(reason)) => {
                let message = reason.unwrap_or_else(|| VIDEO_UNAVAILABLE.to_string());
                warn!("no video for {movie_id}: {message}");
                self.notify(NoticeKind::Error, message);
                false
            }
            Err(err) => {
                warn!("failed to load video {movie_id}: {err}");
                self.notify(NoticeKind::Error, format!("Error loading video: {err}"));
                false
            }
        }
    }

    /// Uploaded movies already carry their URL, so no `getVideo` round trip.
    pub(crate) fn play_upload(&mut self, movie: &UploadedMovie) -> bool {
        if !self.session.is_authenticated() {
            self.notify(NoticeKind::Error, LOGIN_REQUIRED);
            return false;
        }
        self.start_playback(&movie.movie_id, &movie.video_url, None)
    }

    fn start_playback(
        &mut self,
        movie_id: &str,
        video_url: &str,
        description: Option<&'static str>,
    ) -> bool {
        if let Err(err) = self.player.load(video_url) {
            self.notify(NoticeKind::Error, format!("Error loading video: {err}"));
            return false;
        }
        self.playback.select(movie_id);
        self.view = View::Player;
        self.now_playing = Some(NowPlaying {
            movie_id: movie_id.to_string(),
            label: format!("Now Playing: {}", display_title(movie_id)),
            description,
        });
        info!("playing {movie_id}");

        if let Err(err) = self.player.play() {
            warn!("player failed to start: {err:#}");
            self.notify(NoticeKind::Error, format!("Could not start playback: {err}"));
        }
        true
    }

    /// Saves the current position without leaving the player.
    pub(crate) fn save_progress(&mut self) -> bool {
        if !self.session.is_authenticated() {
            self.notify(NoticeKind::Error, LOGIN_REQUIRED);
            return false;
        }
        if self.playback.active_movie_id().is_none() {
            self.notify(NoticeKind::Error, NOTHING_PLAYING);
            return false;
        }

        match self.save_current_position() {
            SaveOutcome::Saved => true,
            SaveOutcome::Failed => false,
            SaveOutcome::Skipped => {
                self.notify(NoticeKind::Info, POSITION_UNKNOWN);
                false
            }
        }
    }

    pub(crate) fn back_to_movies(&mut self) {
        self.player.pause();
        let outcome = self.save_current_position();
        debug!("leaving player, save outcome {outcome:?}");

        self.player.clear();
        self.playback.clear();
        self.now_playing = None;
        if self.session.is_authenticated() {
            self.view = View::Catalog;
            self.load_all_progress();
        } else {
            self.view = View::Login;
        }
    }

    fn save_current_position(&mut self) -> SaveOutcome {
        let (Some(user_id), Some(movie_id)) =
            (self.session.user_id(), self.playback.active_movie_id())
        else {
            return SaveOutcome::Skipped;
        };
        let position = self.player.position();
        let Some(percent) = playback_percent(position.current_time, position.duration) else {
            debug!("duration unavailable for {movie_id}; not saving");
            return SaveOutcome::Skipped;
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let result = self.api.save_progress(user_id, movie_id, percent, &timestamp);
        match result {
            Ok(()) => {
                info!("saved {percent:.1}% for {movie_id}");
                self.notify(NoticeKind::Info, PROGRESS_SAVED);
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!("failed to save progress for {movie_id}: {err}");
                self.notify(NoticeKind::Error, format!("Error saving progress: {err}"));
                SaveOutcome::Failed
            }
        }
    }

    pub(crate) fn upload_file(&mut self, path: &Path) -> bool {
        let Some(user_id) = self.require_user() else {
            return false;
        };
        let Some(file_name) = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
        else {
            self.notify(NoticeKind::Error, "Choose a video file to upload.");
            return false;
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.notify(
                    NoticeKind::Error,
                    format!("Could not read {}: {err}", path.display()),
                );
                return false;
            }
        };

        let result = self
            .api
            .request_upload_url(&user_id, file_name)
            .and_then(|upload_url| self.api.put_upload(&upload_url, &bytes));
        match result {
            Ok(()) => {
                info!("uploaded {file_name} ({} bytes)", bytes.len());
                self.notify(NoticeKind::Info, UPLOAD_COMPLETE);
                self.load_user_movies();
                true
            }
            Err(err) => {
                warn!("upload of {file_name} failed: {err}");
                self.notify(NoticeKind::Error, format!("Upload failed: {err}"));
                false
            }
        }
    }
}
