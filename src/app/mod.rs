mod api;
mod catalog;
mod controller;
mod player;
mod session;
mod tui;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::{Cli, Command, Credentials};
use crate::config::Settings;
use crate::http::HttpClient;
use crate::logger::{self, LogTarget};
use crate::paths::log_file_path;

use self::api::ApiClient;
use self::catalog::{CATALOG, format_clock, truncate};
use self::controller::{Controller, GridItem, NoticeKind};
use self::player::{MediaPlayer, MpvPlayer};

const PLAYER_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli)?;

    match cli.command {
        Some(Command::Catalog(credentials)) => {
            logger::init(LogTarget::Stderr, settings.log_level)?;
            run_catalog(&settings, &credentials)?
        }
        Some(Command::Play {
            credentials,
            movie_id,
        }) => {
            logger::init(LogTarget::Stderr, settings.log_level)?;
            run_play(&settings, &credentials, &movie_id)?
        }
        Some(Command::Upload { credentials, path }) => {
            logger::init(LogTarget::Stderr, settings.log_level)?;
            run_upload(&settings, &credentials, &path)?
        }
        Some(Command::Uploads(credentials)) => {
            logger::init(LogTarget::Stderr, settings.log_level)?;
            run_uploads(&settings, &credentials)?
        }
        Some(Command::Tui) | None => {
            let log_path = log_file_path()?;
            logger::init(LogTarget::File(&log_path), settings.log_level)?;
            tui::run_tui(build_controller(&settings))?
        }
    }

    Ok(())
}

fn build_controller(settings: &Settings) -> Controller<MpvPlayer> {
    let http = HttpClient::new(settings.connect_timeout, settings.read_timeout);
    let api = ApiClient::new(http, settings.api_url.clone());
    Controller::new(api, MpvPlayer::new(settings.player_bin.clone()))
}

fn sign_in<P: MediaPlayer>(
    controller: &mut Controller<P>,
    credentials: &Credentials,
) -> Result<()> {
    let signed_in = controller.authenticate(&credentials.username, &credentials.access_key);
    print_notices(controller);
    if !signed_in {
        bail!("sign-in failed for {}", credentials.username);
    }
    println!("Signed in as {}", controller.session().display_name());
    Ok(())
}

fn run_catalog(settings: &Settings, credentials: &Credentials) -> Result<()> {
    let mut controller = build_controller(settings);
    sign_in(&mut controller, credentials)?;
    println!();
    print_catalog(&controller);
    println!();
    print_uploads(&controller);
    Ok(())
}

fn run_play(settings: &Settings, credentials: &Credentials, movie_id: &str) -> Result<()> {
    let mut controller = build_controller(settings);
    sign_in(&mut controller, credentials)?;

    if !controller.play_movie(movie_id) {
        print_notices(&mut controller);
        println!("Progress not updated.");
        return Ok(());
    }
    if let Some(now_playing) = controller.now_playing() {
        println!("{}", now_playing.label);
        if let Some(description) = now_playing.description {
            println!("  {description}");
        }
    }
    print_notices(&mut controller);
    println!("Close the player window to save your progress.");

    let mut last_position = controller.position();
    while controller.player_active() {
        thread::sleep(PLAYER_POLL_INTERVAL);
        last_position = controller.position();
    }
    println!(
        "Stopped at {} of {}",
        format_clock(last_position.current_time),
        format_clock(last_position.duration)
    );

    controller.back_to_movies();
    print_notices(&mut controller);
    println!();
    print_catalog(&controller);
    Ok(())
}

fn run_upload(settings: &Settings, credentials: &Credentials, path: &Path) -> Result<()> {
    let mut controller = build_controller(settings);
    sign_in(&mut controller, credentials)?;
    println!("Uploading {} ...", path.display());
    controller.upload_file(path);
    print_notices(&mut controller);
    println!();
    print_uploads(&controller);
    Ok(())
}

fn run_uploads(settings: &Settings, credentials: &Credentials) -> Result<()> {
    let mut controller = build_controller(settings);
    sign_in(&mut controller, credentials)?;
    println!();
    print_uploads(&controller);
    Ok(())
}

fn print_notices<P: MediaPlayer>(controller: &mut Controller<P>) {
    while let Some(notice) = controller.take_notice() {
        match notice.kind {
            NoticeKind::Info => println!("{}", notice.message),
            NoticeKind::Error => println!("Error: {}", notice.message),
        }
    }
}

fn print_catalog<P: MediaPlayer>(controller: &Controller<P>) {
    println!("{:<10} {:<36} {:>8}", "MOVIE ID", "TITLE", "WATCHED");
    for entry in CATALOG {
        println!(
            "{:<10} {:<36} {:>7.0}%",
            entry.movie_id,
            truncate(entry.title, 36),
            controller.progress_for(entry.movie_id)
        );
    }
}

fn print_uploads<P: MediaPlayer>(controller: &Controller<P>) {
    let grid = controller.upload_grid();
    if grid.is_empty() {
        return;
    }
    println!("{:<24} {:<60}", "UPLOAD ID", "VIDEO URL");
    for item in grid {
        match item {
            GridItem::Placeholder(message) => println!("{message}"),
            GridItem::Card(movie) => println!(
                "{:<24} {:<60}",
                truncate(&movie.movie_id, 24),
                truncate(&movie.video_url, 60)
            ),
        }
    }
}
