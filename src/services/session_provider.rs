//! Session provider contract.
//!
//! Sign-in and sign-out live outside this crate; a session only needs to know
//! which owner, if any, is authenticated when it starts.

use async_trait::async_trait;

use crate::types::bookmark::OwnerId;

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The authenticated owner, or `None` when nobody is signed in.
    async fn current_session(&self) -> Option<OwnerId>;
}

/// Provider that always reports the same owner (or no session at all).
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    owner_id: Option<OwnerId>,
}

impl StaticSessionProvider {
    pub fn new(owner_id: Option<OwnerId>) -> Self {
        Self { owner_id }
    }

    pub fn signed_in(owner_id: impl Into<String>) -> Self {
        Self::new(Some(OwnerId::new(owner_id)))
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Option<OwnerId> {
        self.owner_id.clone()
    }
}
