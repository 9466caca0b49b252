use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use super::api::{ApiClient, UploadedMovie, decode_payload};
use super::catalog::CATALOG;
use super::controller::{
    Controller, GridItem, LOGIN_REQUIRED, MISSING_CREDENTIALS, NO_UPLOADS, Notice, NoticeKind,
    PROGRESS_SAVED, UPLOAD_COMPLETE, View,
};
use super::player::{MediaPlayer, MediaPosition};
use crate::http::HttpClient;
use crate::testing::{Behavior, TestServer};

#[derive(Debug, Default)]
struct FakePlayer {
    source: Option<String>,
    position: Option<MediaPosition>,
    played: bool,
    paused: bool,
    cleared: bool,
}

impl FakePlayer {
    fn at(current_time: f64, duration: f64) -> Self {
        Self {
            position: Some(MediaPosition {
                current_time,
                duration,
            }),
            ..Self::default()
        }
    }
}

impl MediaPlayer for FakePlayer {
    fn load(&mut self, url: &str) -> Result<()> {
        self.source = Some(url.to_string());
        self.cleared = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.played = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn clear(&mut self) {
        self.source = None;
        self.cleared = true;
    }

    fn position(&mut self) -> MediaPosition {
        self.position.unwrap_or_else(MediaPosition::unknown)
    }

    fn is_active(&mut self) -> bool {
        self.played && self.source.is_some()
    }
}

fn controller(server: &TestServer, player: FakePlayer) -> Controller<FakePlayer> {
    let http = HttpClient::new(Duration::from_millis(500), Duration::from_millis(500));
    Controller::new(ApiClient::new(http, server.url("/prod/content")), player)
}

/// Authentication for alice followed by empty progress and upload lookups.
fn sign_in_script() -> Vec<Behavior> {
    let mut script = vec![Behavior::json(json!({
        "authenticated": true,
        "username": "alice",
        "userId": "u-1",
    }))];
    script.extend((0..CATALOG.len() + 1).map(|_| Behavior::json(json!({}))));
    script
}

fn notices(controller: &mut Controller<FakePlayer>) -> Vec<Notice> {
    std::iter::from_fn(|| controller.take_notice()).collect()
}

fn temp_video(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vidstream-test-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write temp video");
    path
}

#[test]
fn sign_in_loads_progress_in_catalog_order_then_uploads() {
    let server = TestServer::spawn(sign_in_script());
    let mut controller = controller(&server, FakePlayer::default());

    assert!(controller.authenticate("alice", "K1"));

    assert!(controller.session().is_authenticated());
    assert_eq!(controller.session().display_name(), "alice");
    assert_eq!(controller.view(), View::Catalog);
    assert_eq!(
        server.actions(),
        vec![
            "authenticate",
            "getProgress",
            "getProgress",
            "getProgress",
            "listUserMovies"
        ]
    );

    let requests = server.requests();
    assert_eq!(
        requests[0].json(),
        json!({"action": "authenticate", "username": "alice", "accessKey": "K1"})
    );
    let progress_movies: Vec<String> = requests[1..4]
        .iter()
        .map(|request| request.json()["movieId"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(progress_movies, vec!["movie1", "movie2", "movie3"]);
    assert!(requests[1..].iter().all(|request| request.json()["userId"] == "u-1"));
}

#[test]
fn rejected_sign_in_reports_server_error_and_reenables_login() {
    let server = TestServer::spawn(vec![Behavior::json(json!({
        "authenticated": false,
        "error": "Invalid access key",
    }))]);
    let mut controller = controller(&server, FakePlayer::default());

    assert!(!controller.authenticate("alice", "wrong"));

    assert!(!controller.session().is_authenticated());
    assert_eq!(controller.view(), View::Login);
    assert!(controller.login_enabled());
    assert_eq!(server.request_count(), 1);
    assert_eq!(
        notices(&mut controller),
        vec![Notice {
            kind: NoticeKind::Error,
            message: "Invalid access key".to_string(),
        }]
    );
}

#[test]
fn blank_credentials_never_reach_the_server() {
    let server = TestServer::spawn(Vec::new());
    let mut controller = controller(&server, FakePlayer::default());

    assert!(!controller.authenticate("   ", "K1"));
    assert!(!controller.authenticate("alice", ""));

    assert_eq!(server.request_count(), 0);
    let messages: Vec<String> = notices(&mut controller)
        .into_iter()
        .map(|notice| notice.message)
        .collect();
    assert_eq!(messages, vec![MISSING_CREDENTIALS, MISSING_CREDENTIALS]);
}

#[test]
fn progress_is_clamped_and_failed_lookup_does_not_stop_the_rest() {
    let server = TestServer::spawn(vec![
        Behavior::json(json!({"authenticated": true, "username": "alice", "userId": "u-1"})),
        Behavior::json(json!({"watchProgress": 150})),
        Behavior::Respond(500, "boom".to_string()),
        Behavior::json(json!({"watchProgress": -5})),
        Behavior::json(json!({"movies": []})),
    ]);
    let mut controller = controller(&server, FakePlayer::default());

    assert!(controller.authenticate("alice", "K1"));

    assert_eq!(controller.progress_for("movie1"), 100.0);
    assert_eq!(controller.progress_for("movie2"), 0.0);
    assert_eq!(controller.progress_for("movie3"), 0.0);
    assert_eq!(
        server
            .actions()
            .iter()
            .filter(|action| *action == "getProgress")
            .count(),
        3
    );
}

#[test]
fn enveloped_and_bare_payloads_decode_the_same_progress() {
    let bare = json!({"watchProgress": 42}).to_string();
    let enveloped = json!({
        "statusCode": 200,
        "body": json!({"watchProgress": 42}).to_string(),
    })
    .to_string();
    assert_eq!(
        decode_payload(&bare).expect("bare payload")["watchProgress"],
        42
    );
    assert_eq!(
        decode_payload(&enveloped).expect("enveloped payload")["watchProgress"],
        42
    );

    let server = TestServer::spawn(vec![
        Behavior::enveloped(json!({"authenticated": true, "username": "alice", "userId": "u-1"})),
        Behavior::enveloped(json!({"watchProgress": 42})),
        Behavior::json(json!({"watchProgress": 42})),
        Behavior::json(json!({"watchProgress": "42"})),
        Behavior::enveloped(json!({"movies": []})),
    ]);
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));
    for entry in &CATALOG {
        assert_eq!(controller.progress_for(entry.movie_id), 42.0);
    }
}

#[test]
fn playing_a_catalog_movie_switches_to_player_with_description() {
    let mut script = sign_in_script();
    script.push(Behavior::json(
        json!({"videoUrl": "https://cdn.example/movie1.mp4"}),
    ));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));

    assert!(controller.play_movie("movie1"));

    assert_eq!(controller.view(), View::Player);
    assert_eq!(controller.active_movie_id(), Some("movie1"));
    assert_eq!(
        controller.player().source.as_deref(),
        Some("https://cdn.example/movie1.mp4")
    );
    assert!(controller.player().played);
    let now_playing = controller.now_playing().expect("now playing");
    assert_eq!(
        now_playing.label,
        format!("Now Playing: {}", CATALOG[0].title)
    );
    assert_eq!(now_playing.description, Some(CATALOG[0].description));
    assert_eq!(server.actions().last().map(String::as_str), Some("getVideo"));
}

#[test]
fn missing_video_url_keeps_catalog_view() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"error": "Video not found"})));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));

    assert!(!controller.play_movie("movie9"));

    assert_eq!(controller.view(), View::Catalog);
    assert!(controller.player().source.as_deref().is_none());
    let last = notices(&mut controller).pop().expect("notice");
    assert_eq!(last.message, "Video not found");
}

#[test]
fn playing_an_upload_skips_video_lookup_and_hides_description() {
    let server = TestServer::spawn(sign_in_script());
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));
    let before = server.request_count();

    let upload = UploadedMovie {
        movie_id: "u-1/clip.mp4".to_string(),
        video_url: "https://cdn.example/u-1/clip.mp4".to_string(),
    };
    assert!(controller.play_upload(&upload));

    assert_eq!(server.request_count(), before);
    assert_eq!(controller.view(), View::Player);
    assert_eq!(
        controller.player().source.as_deref(),
        Some("https://cdn.example/u-1/clip.mp4")
    );
    assert_eq!(
        controller.now_playing().and_then(|playing| playing.description),
        None
    );
}

#[test]
fn back_to_movies_without_duration_skips_save() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"videoUrl": "https://cdn.example/m.mp4"})));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::at(12.0, f64::NAN));
    assert!(controller.authenticate("alice", "K1"));
    assert!(controller.play_movie("movie2"));

    controller.back_to_movies();

    assert_eq!(controller.view(), View::Catalog);
    assert!(controller.player().paused);
    assert!(controller.player().cleared);
    assert!(controller.now_playing().is_none());
    assert!(controller.active_movie_id().is_none());
    let actions = server.actions();
    assert!(!actions.iter().any(|action| action == "saveProgress"));
    assert_eq!(
        actions[actions.len() - 3..],
        ["getProgress", "getProgress", "getProgress"]
    );
}

#[test]
fn back_to_movies_saves_position_then_reloads_progress() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"videoUrl": "https://cdn.example/m.mp4"})));
    script.push(Behavior::Respond(200, String::new()));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::at(60.0, 120.0));
    assert!(controller.authenticate("alice", "K1"));
    assert!(controller.play_movie("movie3"));

    controller.back_to_movies();

    assert_eq!(controller.view(), View::Catalog);
    let requests = server.requests();
    let save = requests[requests.len() - 4].json();
    assert_eq!(save["action"], "saveProgress");
    assert_eq!(save["movieId"], "movie3");
    assert_eq!(save["progress"].as_f64(), Some(50.0));
    let actions = server.actions();
    assert_eq!(
        actions[actions.len() - 3..],
        ["getProgress", "getProgress", "getProgress"]
    );
    assert!(
        notices(&mut controller)
            .iter()
            .any(|notice| notice.kind == NoticeKind::Info && notice.message == PROGRESS_SAVED)
    );
}

#[test]
fn back_to_movies_returns_to_catalog_even_when_save_fails() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"videoUrl": "https://cdn.example/m.mp4"})));
    script.push(Behavior::Respond(500, "boom".to_string()));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::at(60.0, 120.0));
    assert!(controller.authenticate("alice", "K1"));
    assert!(controller.play_movie("movie1"));

    controller.back_to_movies();

    assert_eq!(controller.view(), View::Catalog);
    assert!(controller.player().cleared);
    assert!(controller.active_movie_id().is_none());
    let actions = server.actions();
    assert_eq!(
        actions[actions.len() - 5..],
        [
            "getVideo",
            "saveProgress",
            "getProgress",
            "getProgress",
            "getProgress"
        ]
    );
    let last = notices(&mut controller).pop().expect("notice");
    assert_eq!(last.kind, NoticeKind::Error);
    assert_eq!(last.message, "Error saving progress: HTTP status 500 (boom)");
}

#[test]
fn progress_error_payload_resets_bar_to_zero() {
    let server = TestServer::spawn(vec![
        Behavior::json(json!({"authenticated": true, "username": "alice", "userId": "u-1"})),
        Behavior::json(json!({"watchProgress": 50})),
        Behavior::json(json!({})),
        Behavior::json(json!({})),
        Behavior::json(json!({"movies": []})),
    ]);
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));
    assert_eq!(controller.progress_for("movie1"), 50.0);

    server.push(Behavior::enveloped(
        json!({"error": "userId and movieId are required"}),
    ));
    controller.load_all_progress();

    assert_eq!(controller.progress_for("movie1"), 0.0);
    assert!(notices(&mut controller).is_empty());
}

#[test]
fn dropped_connection_skips_one_movie_and_keeps_loading() {
    let server = TestServer::spawn(vec![
        Behavior::json(json!({"authenticated": true, "username": "alice", "userId": "u-1"})),
        Behavior::json(json!({"watchProgress": 10})),
        Behavior::Hangup,
        Behavior::json(json!({"watchProgress": 30})),
        Behavior::json(json!({"movies": []})),
    ]);
    let mut controller = controller(&server, FakePlayer::default());

    assert!(controller.authenticate("alice", "K1"));

    assert_eq!(controller.progress_for("movie1"), 10.0);
    assert_eq!(controller.progress_for("movie2"), 0.0);
    assert_eq!(controller.progress_for("movie3"), 30.0);
    assert_eq!(
        server.actions(),
        vec![
            "authenticate",
            "getProgress",
            "getProgress",
            "getProgress",
            "listUserMovies"
        ]
    );
}

#[test]
fn save_progress_sends_percent_and_utc_timestamp() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"videoUrl": "https://cdn.example/m.mp4"})));
    script.push(Behavior::Respond(200, String::new()));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::at(30.0, 120.0));
    assert!(controller.authenticate("alice", "K1"));
    assert!(controller.play_movie("movie1"));

    assert!(controller.save_progress());

    assert_eq!(controller.view(), View::Player);
    let requests = server.requests();
    let save = requests.last().expect("save request").json();
    assert_eq!(save["action"], "saveProgress");
    assert_eq!(save["userId"], "u-1");
    assert_eq!(save["movieId"], "movie1");
    assert_eq!(save["progress"].as_f64(), Some(25.0));
    let timestamp = save["timestamp"].as_str().expect("timestamp");
    assert!(timestamp.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(
        notices(&mut controller)
            .iter()
            .any(|notice| notice.kind == NoticeKind::Info && notice.message == PROGRESS_SAVED)
    );
}

#[test]
fn failed_save_reports_reason() {
    let mut script = sign_in_script();
    script.push(Behavior::json(json!({"videoUrl": "https://cdn.example/m.mp4"})));
    script.push(Behavior::Respond(500, "boom".to_string()));
    let server = TestServer::spawn(script);
    let mut controller = controller(&server, FakePlayer::at(30.0, 120.0));
    assert!(controller.authenticate("alice", "K1"));
    assert!(controller.play_movie("movie1"));

    assert!(!controller.save_progress());

    let last = notices(&mut controller).pop().expect("notice");
    assert_eq!(last.kind, NoticeKind::Error);
    assert!(last.message.starts_with("Error saving progress: "));
}

#[test]
fn empty_upload_list_renders_single_placeholder() {
    let server = TestServer::spawn(sign_in_script());
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));

    let grid = controller.upload_grid();
    assert_eq!(grid, vec![GridItem::Placeholder(NO_UPLOADS)]);
    assert!(!grid.iter().any(|item| matches!(item, GridItem::Card(_))));
}

#[test]
fn guarded_operations_require_sign_in() {
    let server = TestServer::spawn(Vec::new());
    let mut controller = controller(&server, FakePlayer::default());
    let path = temp_video("guard.mp4", b"data");

    assert!(!controller.play_movie("movie1"));
    assert!(!controller.save_progress());
    assert!(!controller.upload_file(&path));
    controller.load_all_progress();
    controller.load_user_movies();

    assert_eq!(server.request_count(), 0);
    let messages = notices(&mut controller);
    assert_eq!(messages.len(), 5);
    assert!(messages.iter().all(|notice| notice.message == LOGIN_REQUIRED));
}

#[test]
fn upload_puts_file_to_issued_url_then_refreshes_list() {
    let server = TestServer::spawn(sign_in_script());
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));
    let path = temp_video("clip.mp4", b"fake mp4 bytes");

    server.push(Behavior::json(
        json!({"uploadUrl": server.url("/bucket/clip.mp4?sig=abc")}),
    ));
    server.push(Behavior::Respond(200, String::new()));
    server.push(Behavior::enveloped(json!({
        "movies": [{"movieId": "u-1/clip.mp4", "videoUrl": "https://cdn.example/u-1/clip.mp4"}],
    })));

    assert!(controller.upload_file(&path));

    let requests = server.requests();
    let tail = &requests[requests.len() - 3..];
    assert_eq!(
        tail[0].json(),
        json!({"action": "requestUploadUrl", "userId": "u-1", "fileName": "clip.mp4"})
    );
    assert_eq!(tail[1].method, "PUT");
    assert_eq!(tail[1].path, "/bucket/clip.mp4?sig=abc");
    assert_eq!(tail[1].header("content-type"), Some("video/mp4"));
    assert_eq!(tail[1].body, b"fake mp4 bytes");
    assert_eq!(tail[2].action().as_deref(), Some("listUserMovies"));

    assert_eq!(
        controller.upload_grid(),
        vec![GridItem::Card(UploadedMovie {
            movie_id: "u-1/clip.mp4".to_string(),
            video_url: "https://cdn.example/u-1/clip.mp4".to_string(),
        })]
    );
    assert!(
        notices(&mut controller)
            .iter()
            .any(|notice| notice.message == UPLOAD_COMPLETE)
    );
    let _ = fs::remove_file(path);
}

#[test]
fn logout_returns_to_login_and_forgets_user_state() {
    let server = TestServer::spawn(sign_in_script());
    let mut controller = controller(&server, FakePlayer::default());
    assert!(controller.authenticate("alice", "K1"));

    controller.logout();

    assert_eq!(controller.view(), View::Login);
    assert!(!controller.session().is_authenticated());
    assert!(controller.login_enabled());
    assert!(controller.upload_grid().is_empty());
    assert_eq!(controller.progress_for("movie1"), 0.0);
}
