use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identity::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SupportRequestId(pub u64);

impl fmt::Display for SupportRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportSubject {
    Adoption,
    Volunteer,
    Donation,
    Technical,
    Other,
}

impl SupportSubject {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Adoption => "Adoption question",
            Self::Volunteer => "Volunteering",
            Self::Donation => "Donations",
            Self::Technical => "Technical problem",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl SupportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Requests never return to `new`, and a closed request stays closed.
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::InProgress | Self::Resolved | Self::Closed)
                | (Self::InProgress, Self::Resolved | Self::Closed)
                | (Self::Resolved, Self::InProgress | Self::Closed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: SupportRequestId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub subject: SupportSubject,
    pub message: String,
    pub status: SupportStatus,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportForm {
    pub name: String,
    pub email: String,
    pub subject: SupportSubject,
    pub message: String,
}
