use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of an application as seen by both sides of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    #[serde(alias = "reviewed")]
    Reviewing,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }

    /// Statuses reachable from `self` through a normal company transition.
    pub const fn successors(self) -> &'static [ApplicationStatus] {
        match self {
            ApplicationStatus::Pending => {
                &[ApplicationStatus::Reviewing, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Reviewing => {
                &[ApplicationStatus::Interview, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Interview => {
                &[ApplicationStatus::Accepted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Validate a normal transition against the table.
    pub fn transition(self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal { from: self, to: next });
        }
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Illegal { from: self, to: next })
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = TransitionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewing" | "reviewed" => Ok(ApplicationStatus::Reviewing),
            "interview" => Ok(ApplicationStatus::Interview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(TransitionError::UnknownStatus(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("unrecognized application status '{0}'")]
    UnknownStatus(String),
    #[error("application is already {from}; it cannot move to {to}")]
    Terminal {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("cannot move application from {from} to {to}")]
    Illegal {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}
