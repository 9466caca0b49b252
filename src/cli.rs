use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "vidstream",
    version,
    about = "Browse, play and upload movies on a vidstream backend"
)]
pub struct Cli {
    /// Backend endpoint that receives every `action` request.
    #[arg(long, global = true, env = "VIDSTREAM_API_URL")]
    pub api_url: Option<String>,

    /// Alternate config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive terminal UI (default).
    Tui,
    /// Print the catalog with watch progress and your uploads.
    Catalog(Credentials),
    /// Play a catalog movie and save progress when the player exits.
    Play {
        #[command(flatten)]
        credentials: Credentials,
        movie_id: String,
    },
    /// Upload a video file.
    Upload {
        #[command(flatten)]
        credentials: Credentials,
        path: PathBuf,
    },
    /// List movies you uploaded.
    Uploads(Credentials),
}

#[derive(Debug, Clone, Args)]
pub struct Credentials {
    #[arg(long, env = "VIDSTREAM_USERNAME")]
    pub username: String,
    #[arg(long, env = "VIDSTREAM_ACCESS_KEY", hide_env_values = true)]
    pub access_key: String,
}
