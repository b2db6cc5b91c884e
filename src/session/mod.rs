//! Session Holder: the signed-in user's profile, kept by the browser in the
//! `food_tracker_user` cookie between page loads.

mod claims;
pub mod cookie;
pub mod extractors;
pub mod keys;

use axum::{extract::FromRef, http::HeaderMap};
use tracing::{debug, warn};

use crate::{auth::dto::PublicUser, state::AppState};
use cookie::{expired_cookie, set_cookie, token_from_headers};
use keys::SessionKeys;

pub use extractors::Session;

/// A freshly written session record.
#[derive(Debug, Clone)]
pub struct SavedSession {
    pub token: String,
    pub set_cookie: String,
}

#[derive(Clone)]
pub struct SessionHolder {
    keys: SessionKeys,
}

impl FromRef<AppState> for SessionHolder {
    fn from_ref(state: &AppState) -> Self {
        Self {
            keys: SessionKeys::from_ref(state),
        }
    }
}

impl SessionHolder {
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }

    /// The persisted user, or `None` when absent, expired or tampered with.
    pub fn load(&self, headers: &HeaderMap) -> Option<PublicUser> {
        let token = token_from_headers(headers)?;
        match self.keys.verify(&token) {
            Ok(claims) => Some(claims.user),
            Err(e) => {
                warn!(error = %e, "discarding invalid session");
                None
            }
        }
    }

    /// Signs `user` as the session record, with the `Set-Cookie` value persisting it.
    pub fn save(&self, user: &PublicUser) -> anyhow::Result<SavedSession> {
        let token = self.keys.sign(user)?;
        debug!(user_id = %user.id, "session saved");
        Ok(SavedSession {
            set_cookie: set_cookie(&token, self.keys.ttl.as_secs()),
            token,
        })
    }

    /// `Set-Cookie` value erasing the session record.
    pub fn clear(&self) -> String {
        expired_cookie()
    }
}
