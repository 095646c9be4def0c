//! Delete confirmation token store.
//!
//! This module provides the `DeleteConfirmationService` for the two-phase server deletion
//! flow. A delete request issues a random opaque token bound to one server and its owner;
//! the confirmation must echo the token back within five minutes. Tokens are kept in
//! memory and are single use.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// How long a delete confirmation token stays valid.
pub const CONFIRMATION_TTL: Duration = Duration::minutes(5);

const TOKEN_LENGTH: usize = 24;

/// A pending deletion awaiting confirmation.
#[derive(Clone, Debug)]
struct PendingDelete {
    server_id: i32,
    owner_id: u64,
    expires_at: DateTime<Utc>,
}

impl PendingDelete {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory store of outstanding delete confirmations.
///
/// Cloning shares the same store, so one instance lives in the application state and is
/// handed to every command handler.
#[derive(Clone, Default)]
pub struct DeleteConfirmationService {
    pending: Arc<RwLock<HashMap<String, PendingDelete>>>,
}

impl DeleteConfirmationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token for deleting `server_id` on behalf of `owner_id`.
    ///
    /// Any earlier token for the same server is replaced, and expired tokens are swept.
    ///
    /// # Returns
    /// - `(String, DateTime<Utc>)` - The token and when it expires
    pub async fn issue(
        &self,
        server_id: i32,
        owner_id: u64,
        now: DateTime<Utc>,
    ) -> (String, DateTime<Utc>) {
        let token = Self::generate_token();
        let expires_at = now + CONFIRMATION_TTL;

        let mut pending = self.pending.write().await;
        pending.retain(|_, entry| !entry.is_expired(now) && entry.server_id != server_id);
        pending.insert(
            token.clone(),
            PendingDelete {
                server_id,
                owner_id,
                expires_at,
            },
        );

        (token, expires_at)
    }

    /// Redeems a token.
    ///
    /// A token presented by someone other than the owner it was issued to is left in
    /// place. Expired tokens are removed.
    ///
    /// # Returns
    /// - `Some(server_id)` - Token valid for this owner; it has been consumed
    /// - `None` - Unknown, expired or foreign token
    pub async fn consume(&self, token: &str, owner_id: u64, now: DateTime<Utc>) -> Option<i32> {
        let mut pending = self.pending.write().await;

        let entry = pending.get(token)?;
        if entry.is_expired(now) {
            pending.remove(token);
            return None;
        }
        if entry.owner_id != owner_id {
            return None;
        }

        pending.remove(token).map(|entry| entry.server_id)
    }

    fn generate_token() -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                 abcdefghijklmnopqrstuvwxyz\
                                 0123456789";

        let mut rng = rand::rng();

        (0..TOKEN_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}
