use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::envelope::decode_typed;
use super::{
    ApiError, ApiRequest, AuthenticateResponse, ProgressResponse, SignedIn, UploadUrlResponse,
    UploadedMovie, UserMoviesResponse, VideoResponse,
};
use crate::http::HttpClient;

const UPLOAD_CONTENT_TYPE: &str = "video/mp4";

/// Typed access to the single action endpoint.
#[derive(Clone)]
pub(crate) struct ApiClient {
    http: HttpClient,
    endpoint: String,
}

impl ApiClient {
    pub(crate) fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    fn send(&self, request: &ApiRequest<'_>) -> Result<String, ApiError> {
        let body = serde_json::to_value(request)
            .map_err(|err| ApiError::Malformed(format!("unserializable request: {err}")))?;
        debug!("POST {} action={}", self.endpoint, request.action());
        Ok(self.http.post_json(&self.endpoint, &body)?)
    }

    fn call<T: DeserializeOwned>(&self, request: &ApiRequest<'_>) -> Result<T, ApiError> {
        let raw = self.send(request)?;
        decode_typed(&raw)
    }

    pub(crate) fn authenticate(
        &self,
        username: &str,
        access_key: &str,
    ) -> Result<SignedIn, ApiError> {
        let response: AuthenticateResponse = self.call(&ApiRequest::Authenticate {
            username,
            access_key,
        })?;
        if !response.authenticated {
            return Err(ApiError::Rejected(response.error));
        }

        let user_id = response
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::Malformed("authenticated without a userId".to_string()))?;
        let username = response
            .username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| username.to_string());
        Ok(SignedIn { username, user_id })
    }

    pub(crate) fn get_progress(&self, user_id: &str, movie_id: &str) -> Result<f64, ApiError> {
        let response: ProgressResponse =
            self.call(&ApiRequest::GetProgress { user_id, movie_id })?;
        if response.watch_progress.is_none()
            && let Some(error) = response.error.as_deref()
        {
            warn!("no progress for {movie_id}: {error}");
        }
        Ok(response.percent())
    }

    pub(crate) fn get_video(&self, movie_id: &str) -> Result<String, ApiError> {
        let response: VideoResponse = self.call(&ApiRequest::GetVideo { movie_id })?;
        response
            .video_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ApiError::Rejected(response.error))
    }

    /// Only the HTTP status matters; the response body is not inspected.
    pub(crate) fn save_progress(
        &self,
        user_id: &str,
        movie_id: &str,
        progress: f64,
        timestamp: &str,
    ) -> Result<(), ApiError> {
        self.send(&ApiRequest::SaveProgress {
            user_id,
            movie_id,
            progress,
            timestamp,
        })?;
        Ok(())
    }

    pub(crate) fn request_upload_url(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<String, ApiError> {
        let response: UploadUrlResponse =
            self.call(&ApiRequest::RequestUploadUrl { user_id, file_name })?;
        response
            .upload_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ApiError::Rejected(response.error))
    }

    /// PUT straight to the presigned URL; the action endpoint is not involved.
    pub(crate) fn put_upload(&self, upload_url: &str, bytes: &[u8]) -> Result<(), ApiError> {
        debug!("PUT {} bytes to presigned upload url", bytes.len());
        self.http
            .put_bytes(upload_url, UPLOAD_CONTENT_TYPE, bytes)
            .map_err(ApiError::from)
    }

    pub(crate) fn list_user_movies(&self, user_id: &str) -> Result<Vec<UploadedMovie>, ApiError> {
        let response: UserMoviesResponse = self.call(&ApiRequest::ListUserMovies { user_id })?;
        if response.movies.is_none()
            && let Some(error) = response.error
        {
            return Err(ApiError::Rejected(Some(error)));
        }
        Ok(response.into_movies())
    }
}
