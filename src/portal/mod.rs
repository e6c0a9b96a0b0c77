/// Applicant-facing portal resources
pub mod applications;
pub mod checklist;
pub mod feedback;
pub mod messages;
pub mod timeline;

use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};

/// Moderation status shared by timeline event requests and feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> PortalResult<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(PortalError::Validation(format!("Invalid status: {}", s))),
        }
    }
}

/// Which side of the portal authored a note or message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Admin,
    Applicant,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Admin => "admin",
            Party::Applicant => "applicant",
        }
    }

    pub fn from_str(s: &str) -> PortalResult<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Party::Admin),
            "applicant" => Ok(Party::Applicant),
            _ => Err(PortalError::Validation(format!("Invalid party: {}", s))),
        }
    }
}
