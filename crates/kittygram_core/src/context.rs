//! Explicit per-request caller context.
//!
//! Operations receive the caller as an argument instead of reading ambient
//! request state.

use crate::model::user::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    user: Option<UserId>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn for_user(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }
}
