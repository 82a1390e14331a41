//! Actor identity supplied by the upstream identity provider.
//!
//! Credentials and sessions live outside this service. The gateway in front of
//! it authenticates visitors and forwards the result as two headers:
//! [`USER_HEADER`] carries the numeric user id and [`ROLE_HEADER`] carries
//! `staff` for shelter administrators. Requests without them are anonymous.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const USER_HEADER: &str = "x-shelter-user";
pub const ROLE_HEADER: &str = "x-shelter-role";

/// Identifier of a registered visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Visitor,
    Staff,
}

/// Whoever issued the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub role: ActorRole,
}

impl Actor {
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            role: ActorRole::Visitor,
        }
    }

    pub const fn visitor(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Visitor,
        }
    }

    pub const fn staff(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Staff,
        }
    }

    pub const fn is_staff(&self) -> bool {
        matches!(self.role, ActorRole::Staff)
    }

    /// Staff may act on any record; visitors only on their own.
    pub fn can_act_for(&self, owner: Option<UserId>) -> bool {
        if self.is_staff() {
            return true;
        }
        match (self.user_id, owner) {
            (Some(actor), Some(owner)) => actor == owner,
            _ => false,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IdentityError> {
        let user_id = match headers.get(USER_HEADER) {
            Some(raw) => {
                let text = raw.to_str().map_err(|_| IdentityError::MalformedUser)?;
                let id = text
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| IdentityError::MalformedUser)?;
                Some(UserId(id))
            }
            None => None,
        };

        let role = match headers.get(ROLE_HEADER).map(|raw| raw.to_str()) {
            Some(Ok(value)) if value.trim().eq_ignore_ascii_case("staff") => ActorRole::Staff,
            Some(Ok(_)) | None => ActorRole::Visitor,
            Some(Err(_)) => return Err(IdentityError::MalformedRole),
        };

        if role == ActorRole::Staff && user_id.is_none() {
            return Err(IdentityError::AnonymousStaff);
        }

        Ok(Self { user_id, role })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("x-shelter-user must be a numeric user id")]
    MalformedUser,
    #[error("x-shelter-role must be valid ASCII")]
    MalformedRole,
    #[error("staff requests must carry x-shelter-user")]
    AnonymousStaff,
}
