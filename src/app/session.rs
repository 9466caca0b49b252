use super::api::SignedIn;

/// Who is signed in. Only `sign_in` and `sign_out` change it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Session {
    display_name: String,
    user_id: String,
    authenticated: bool,
}

impl Session {
    pub(crate) fn sign_in(&mut self, identity: SignedIn) {
        self.display_name = identity.username;
        self.user_id = identity.user_id;
        self.authenticated = true;
    }

    pub(crate) fn sign_out(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The user id, only while signed in with a non-empty id.
    pub(crate) fn user_id(&self) -> Option<&str> {
        (self.authenticated && !self.user_id.is_empty()).then_some(self.user_id.as_str())
    }
}

/// The movie currently loaded in the player, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PlaybackContext {
    active_movie_id: Option<String>,
}

impl PlaybackContext {
    pub(crate) fn select(&mut self, movie_id: &str) {
        self.active_movie_id = (!movie_id.is_empty()).then(|| movie_id.to_string());
    }

    pub(crate) fn clear(&mut self) {
        self.active_movie_id = None;
    }

    pub(crate) fn active_movie_id(&self) -> Option<&str> {
        self.active_movie_id.as_deref()
    }
}
