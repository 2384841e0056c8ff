//! Internship postings and the application lifecycle.
//!
//! The embedded application list on each [`Internship`] is the source of truth for status. The
//! copy held on [`StudentProfile`] is a projection kept in sync by [`ApplicationService`].

pub mod access;
pub mod domain;
pub mod memory;
mod postings;
mod profiles;
pub mod projection;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use access::{authorize, AccessDenied, Permission};
pub use domain::{
    ApplicationEntry, ApplicationId, ApplicationRequest, ApplicationView, ApplyReceipt, Caller,
    Internship, InternshipId, InternshipPage, InternshipSummary, InternshipUpdate,
    MirroredApplication, NewInternship, PostingView, ProfileUpdate, Role, StatusView,
    StudentProfile, User, UserId, WorkType,
};
pub use memory::{MemoryInternshipStore, MemoryProfileStore, MemoryUserDirectory};
pub use postings::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use projection::{PendingProjection, ReconciliationReport};
pub use repository::{InternshipRepository, ProfileRepository, RepositoryError, UserDirectory};
pub use router::internship_router;
pub use service::{ApplicationService, ApplicationServiceError};
pub use status::{ApplicationStatus, TransitionError};
