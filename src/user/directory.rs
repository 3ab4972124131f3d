//! User directory implementation
//!
//! Maps opaque session tokens to user identities. Tokens are random and the
//! store enforces their uniqueness; creation retries on the (unlikely)
//! collision instead of surfacing it to the caller.

use crate::error::{Result, RoomServiceError};
use crate::store::RoomStore;
use crate::types::UserProfile;
use crate::utils::generate_session_token;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of token generation attempts before giving up
pub const DEFAULT_TOKEN_ATTEMPTS: u32 = 3;

/// The user directory component
pub struct UserDirectory {
    store: Arc<dyn RoomStore>,
    token_attempts: u32,
}

impl UserDirectory {
    /// Create a directory with the default token retry bound
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self::with_token_attempts(store, DEFAULT_TOKEN_ATTEMPTS)
    }

    /// Create a directory with a custom token retry bound
    pub fn with_token_attempts(store: Arc<dyn RoomStore>, token_attempts: u32) -> Self {
        Self {
            store,
            token_attempts: token_attempts.max(1),
        }
    }

    /// Create a new user and return their session token
    pub fn create(&self, name: &str, leader_card_id: i64) -> Result<String> {
        for attempt in 1..=self.token_attempts {
            let token = generate_session_token();

            let mut tx = self.store.begin()?;
            match tx.insert_user(name, &token, leader_card_id) {
                Ok(user_id) => {
                    tx.commit()?;
                    debug!("Created user {} (name: '{}')", user_id, name);
                    return Ok(token);
                }
                Err(e) if is_token_conflict(&e) => {
                    warn!(
                        "Token collision on user creation (attempt {}/{}), retrying",
                        attempt, self.token_attempts
                    );
                    // dropped transaction rolls back; next attempt gets a
                    // fresh token
                }
                Err(e) => return Err(e),
            }
        }

        Err(RoomServiceError::InternalError {
            message: format!(
                "Failed to generate a unique token after {} attempts",
                self.token_attempts
            ),
        }
        .into())
    }

    /// Resolve a token to its user profile
    pub fn resolve(&self, token: &str) -> Result<Option<UserProfile>> {
        let mut tx = self.store.begin()?;
        Ok(tx.user_by_token(token)?.map(|user| UserProfile {
            id: user.id,
            name: user.name,
            leader_card_id: user.leader_card_id,
        }))
    }

    /// Overwrite the mutable profile fields of the token's user
    pub fn update(&self, token: &str, name: &str, leader_card_id: i64) -> Result<()> {
        let mut tx = self.store.begin()?;
        if !tx.update_user(token, name, leader_card_id)? {
            return Err(RoomServiceError::UserNotFound {
                identifier: "token".to_string(),
            }
            .into());
        }
        tx.commit()?;
        Ok(())
    }
}

fn is_token_conflict(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<RoomServiceError>(),
        Some(RoomServiceError::TokenConflict)
    )
}
