mod client;
mod envelope;

pub(crate) use client::ApiClient;
#[cfg(test)]
pub(crate) use envelope::decode_payload;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::HttpError;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The backend answered but refused; carries its `error` text when present.
    #[error("{}", .0.as_deref().unwrap_or("request rejected by server"))]
    Rejected(Option<String>),
}

/// One request to the action endpoint. Serializes as a flat object with an
/// `action` discriminator and camelCase fields.
#[derive(Debug, Serialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub(crate) enum ApiRequest<'a> {
    Authenticate {
        username: &'a str,
        access_key: &'a str,
    },
    GetProgress {
        user_id: &'a str,
        movie_id: &'a str,
    },
    GetVideo {
        movie_id: &'a str,
    },
    SaveProgress {
        user_id: &'a str,
        movie_id: &'a str,
        progress: f64,
        timestamp: &'a str,
    },
    RequestUploadUrl {
        user_id: &'a str,
        file_name: &'a str,
    },
    ListUserMovies {
        user_id: &'a str,
    },
}

impl ApiRequest<'_> {
    pub(crate) fn action(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::GetProgress { .. } => "getProgress",
            Self::GetVideo { .. } => "getVideo",
            Self::SaveProgress { .. } => "saveProgress",
            Self::RequestUploadUrl { .. } => "requestUploadUrl",
            Self::ListUserMovies { .. } => "listUserMovies",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedIn {
    pub(crate) username: String,
    pub(crate) user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadedMovie {
    pub(crate) movie_id: String,
    pub(crate) video_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct AuthenticateResponse {
    pub(crate) authenticated: bool,
    pub(crate) username: Option<String>,
    pub(crate) user_id: Option<String>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ProgressResponse {
    pub(crate) watch_progress: Option<Value>,
    pub(crate) error: Option<String>,
}

impl ProgressResponse {
    /// Raw percentage as reported; absent or non-numeric values count as 0.
    pub(crate) fn percent(&self) -> f64 {
        match &self.watch_progress {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct VideoResponse {
    pub(crate) video_url: Option<String>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct UploadUrlResponse {
    pub(crate) upload_url: Option<String>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserMoviesResponse {
    pub(crate) movies: Option<Vec<Value>>,
    pub(crate) error: Option<String>,
}

impl UserMoviesResponse {
    pub(crate) fn into_movies(self) -> Vec<UploadedMovie> {
        self.movies
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let movie_id = entry.get("movieId")?.as_str()?.trim();
                let video_url = entry.get("videoUrl")?.as_str()?.trim();
                if movie_id.is_empty() || video_url.is_empty() {
                    return None;
                }
                Some(UploadedMovie {
                    movie_id: movie_id.to_string(),
                    video_url: video_url.to_string(),
                })
            })
            .collect()
    }
}
