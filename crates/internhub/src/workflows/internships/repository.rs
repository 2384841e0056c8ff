use super::domain::{
    ApplicationEntry, ApplicationId, Internship, InternshipId, StudentProfile, User, UserId,
};
use super::status::ApplicationStatus;

/// Document store for postings and their embedded applications.
///
/// Implementations must apply `append_application` atomically: the duplicate check, the append,
/// and the counter increment happen under one write so two concurrent applies from the same
/// student cannot both succeed.
pub trait InternshipRepository: Send + Sync {
    fn insert(&self, internship: Internship) -> Result<Internship, RepositoryError>;
    fn fetch(&self, id: &InternshipId) -> Result<Option<Internship>, RepositoryError>;
    /// Replace the posting fields. Embedded applications and `applicants` are left untouched.
    fn save_details(&self, internship: &Internship) -> Result<(), RepositoryError>;
    /// Append under the (internship, student) unique constraint and return the new count.
    ///
    /// Inactive postings are rejected with `NotFound` inside the same write.
    fn append_application(
        &self,
        id: &InternshipId,
        entry: ApplicationEntry,
    ) -> Result<u32, RepositoryError>;
    /// Compare-and-set an embedded status. `expected = None` overwrites unconditionally.
    fn set_application_status(
        &self,
        id: &InternshipId,
        application: &ApplicationId,
        expected: Option<ApplicationStatus>,
        status: ApplicationStatus,
    ) -> Result<ApplicationEntry, RepositoryError>;
    /// Active postings, newest first, plus the total active count.
    fn list_active(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Internship>, usize), RepositoryError>;
    fn all(&self) -> Result<Vec<Internship>, RepositoryError>;
}

/// Store for the student-side profile and its application mirror.
///
/// Mirror projections and the student's own edits touch the same document, so every partial change
/// goes through `update`, which must read, apply `change`, and write under one lock.
pub trait ProfileRepository: Send + Sync {
    fn fetch(&self, user: &UserId) -> Result<Option<StudentProfile>, RepositoryError>;
    /// Replace the whole document.
    fn save(&self, profile: StudentProfile) -> Result<StudentProfile, RepositoryError>;
    /// Atomically mutate the stored profile, starting from `seed` when none exists yet.
    ///
    /// Nothing is written when `change` returns `false`. Returns the resulting profile and whether
    /// it was written.
    fn update(
        &self,
        user: &UserId,
        seed: StudentProfile,
        change: &mut dyn FnMut(&mut StudentProfile) -> bool,
    ) -> Result<(StudentProfile, bool), RepositoryError>;
}

/// Read access to the identity records owned by the auth collaborator.
pub trait UserDirectory: Send + Sync {
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (current status {current})")]
    Stale { current: ApplicationStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
