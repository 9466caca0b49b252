use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::Deserialize;

use crate::cli::Cli;
use crate::paths::config_file_path;

const DEFAULT_PLAYER: &str = "mpv";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) api_url: Option<String>,
    pub(crate) player: Option<PathBuf>,
    pub(crate) connect_timeout_ms: Option<u64>,
    pub(crate) read_timeout_ms: Option<u64>,
    pub(crate) log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub player_bin: PathBuf,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub log_level: LevelFilter,
}

/// Values that take precedence over the config file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) api_url: Option<String>,
    pub(crate) player: Option<OsString>,
    pub(crate) verbose: bool,
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match cli.config.as_deref() {
            Some(path) => read_file_config(path)?.ok_or_else(|| {
                anyhow!("config file {} does not exist", path.display())
            })?,
            None => read_file_config(&config_file_path()?)?.unwrap_or_default(),
        };
        let overrides = Overrides {
            api_url: cli.api_url.clone(),
            player: env::var_os("VIDSTREAM_PLAYER"),
            verbose: cli.verbose,
        };
        Self::resolve(file, overrides)
    }

    pub(crate) fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let api_url = overrides
            .api_url
            .or(file.api_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "no API URL configured: pass --api-url, set VIDSTREAM_API_URL, or add `api_url` to config.toml"
                )
            })?;

        let player_bin = match overrides.player {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => file.player.unwrap_or_else(|| PathBuf::from(DEFAULT_PLAYER)),
        };

        let log_level = if overrides.verbose {
            LevelFilter::Debug
        } else {
            match file.log_level.as_deref() {
                Some(raw) => raw
                    .trim()
                    .parse::<LevelFilter>()
                    .map_err(|_| anyhow!("invalid log_level '{raw}' in config"))?,
                None => LevelFilter::Info,
            }
        };

        Ok(Self {
            api_url,
            player_bin,
            connect_timeout: Duration::from_millis(
                file.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            ),
            read_timeout: Duration::from_millis(
                file.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS),
            ),
            log_level,
        })
    }
}

fn read_file_config(path: &Path) -> Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let parsed = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(Some(parsed))
}
