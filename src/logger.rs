use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{Level, LevelFilter, Metadata, Record};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

struct LineLogger {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl log::Log for LineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Dependencies (ureq in particular) only get through at info and above.
        metadata.level() <= log::max_level()
            && (metadata.target().starts_with(CRATE_TARGET) || metadata.level() <= Level::Info)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        let line = format_line(Utc::now(), record.level(), record.target(), record.args());
        let _ = writeln!(sink, "{line}");
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }
}

pub fn init(target: LogTarget<'_>, level: LevelFilter) -> Result<()> {
    let sink: Box<dyn Write + Send> = match target {
        LogTarget::Stderr => Box::new(io::stderr()),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Box::new(file)
        }
    };

    log::set_boxed_logger(Box::new(LineLogger {
        sink: Mutex::new(sink),
    }))
    .map(|()| log::set_max_level(level))
    .context("logger already initialized")
}

fn format_line(now: DateTime<Utc>, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    format!(
        "[{}] {:<5} {} - {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        target,
        args
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_line_includes_timestamp_level_and_target() {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        let line = format_line(
            now,
            Level::Warn,
            "vidstream::app::controller",
            &format_args!("progress lookup failed for {}", "movie2"),
        );
        assert_eq!(
            line,
            "[2024-05-01T12:30:00.000Z] WARN  vidstream::app::controller - progress lookup failed for movie2"
        );
    }
}
