use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::{error, info, warn};

use super::access::{authorize, AccessDenied, Permission};
use super::domain::{
    ApplicationEntry, ApplicationId, ApplicationRequest, ApplicationView, ApplyReceipt, Caller,
    Internship, InternshipId, MirroredApplication, Role, StatusView, StudentSnapshot, UserId,
};
use super::projection::ProjectionOutbox;
use super::repository::{InternshipRepository, ProfileRepository, RepositoryError, UserDirectory};
use super::status::{ApplicationStatus, TransitionError};
use crate::http::envelope;
use crate::workflows::notifications::templates::is_applicant_milestone;
use crate::workflows::notifications::{ApplicationSummary, NotificationCenter};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Service owning the application lifecycle: the authoritative write on the internship, the
/// student-side mirror projection, and the notification fan-out.
pub struct ApplicationService<R, P> {
    pub(super) internships: Arc<R>,
    pub(super) profiles: Arc<P>,
    pub(super) users: Arc<dyn UserDirectory>,
    pub(super) notifications: Arc<NotificationCenter>,
    pub(super) outbox: ProjectionOutbox,
}

impl<R, P> ApplicationService<R, P>
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(
        internships: Arc<R>,
        profiles: Arc<P>,
        users: Arc<dyn UserDirectory>,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            internships,
            profiles,
            users,
            notifications,
            outbox: ProjectionOutbox::default(),
        }
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Append a `pending` application for the calling student and return the new count.
    ///
    /// The mirror write and notifications run after the primary append and never fail the call.
    pub fn apply(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
        request: ApplicationRequest,
    ) -> Result<ApplyReceipt, ApplicationServiceError> {
        authorize(caller, Permission::Apply, None)?;

        let internship = self
            .internships
            .fetch(internship_id)?
            .filter(|internship| internship.is_active)
            .ok_or(ApplicationServiceError::NotFound("internship"))?;

        if internship.application_from(&caller.user_id).is_some() {
            return Err(ApplicationServiceError::DuplicateApplication);
        }

        let entry = ApplicationEntry {
            id: next_application_id(),
            student: caller.user_id.clone(),
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
            resume: non_blank(request.resume),
            cover_letter: non_blank(request.cover_letter),
        };

        let applicants = match self
            .internships
            .append_application(internship_id, entry.clone())
        {
            Ok(count) => count,
            Err(RepositoryError::Conflict) => {
                return Err(ApplicationServiceError::DuplicateApplication)
            }
            Err(RepositoryError::NotFound) => {
                return Err(ApplicationServiceError::NotFound("internship"))
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            internship = %internship_id.0,
            application = %entry.id.0,
            student = %caller.user_id.0,
            applicants,
            "application submitted"
        );

        self.mirror_best_effort(
            &caller.user_id,
            MirroredApplication::of(internship_id, &entry),
        );
        self.announce_submission(&internship, &entry, applicants);

        Ok(ApplyReceipt {
            internship_id: internship_id.clone(),
            application_id: entry.id,
            applicants,
        })
    }

    /// Owner-only listing of the embedded applications with student identity resolved.
    pub fn list_applications(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        let internship = self.owned_posting(caller, internship_id)?;

        Ok(internship
            .applications
            .iter()
            .map(|entry| ApplicationView::from_entry(entry, self.snapshot_of(&entry.student)))
            .collect())
    }

    /// Move an application along the transition table.
    pub fn update_status(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
        application_id: &ApplicationId,
        status: &str,
    ) -> Result<StatusView, ApplicationServiceError> {
        self.change_status(caller, internship_id, application_id, status, false)
    }

    /// Manual correction that bypasses the transition table. Owner only.
    pub fn force_status(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
        application_id: &ApplicationId,
        status: &str,
    ) -> Result<StatusView, ApplicationServiceError> {
        self.change_status(caller, internship_id, application_id, status, true)
    }

    fn change_status(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
        application_id: &ApplicationId,
        status: &str,
        forced: bool,
    ) -> Result<StatusView, ApplicationServiceError> {
        let internship = self.owned_posting(caller, internship_id)?;
        let next: ApplicationStatus = status.parse()?;

        let current = internship
            .application(application_id)
            .ok_or(ApplicationServiceError::NotFound("application"))?;
        let previous = current.status;

        if forced {
            if previous == next {
                return Ok(StatusView {
                    internship_id: internship_id.clone(),
                    application_id: application_id.clone(),
                    previous_status: previous,
                    status: next,
                });
            }
            warn!(
                internship = %internship_id.0,
                application = %application_id.0,
                company = %caller.user_id.0,
                from = %previous,
                to = %next,
                "forcing application status outside the transition table"
            );
        } else {
            previous.transition(next)?;
        }

        let expected = if forced { None } else { Some(previous) };
        let updated = match self.internships.set_application_status(
            internship_id,
            application_id,
            expected,
            next,
        ) {
            Ok(entry) => entry,
            Err(RepositoryError::NotFound) => {
                return Err(ApplicationServiceError::NotFound("application"))
            }
            Err(RepositoryError::Stale { current }) => {
                return Err(ApplicationServiceError::Validation(format!(
                    "application moved to {current} concurrently; reload and retry"
                )))
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            internship = %internship_id.0,
            application = %application_id.0,
            from = %previous,
            to = %next,
            "application status updated"
        );

        self.mirror_best_effort(
            &updated.student,
            MirroredApplication::of(internship_id, &updated),
        );

        if let Err(err) = self.notifications.notify_status_change(
            &updated.student,
            &internship.summary(),
            previous,
            next,
        ) {
            warn!(error = %err, application = %application_id.0, "status notification dropped");
        }

        Ok(StatusView {
            internship_id: internship_id.clone(),
            application_id: application_id.clone(),
            previous_status: previous,
            status: updated.status,
        })
    }

    /// Fetch a posting and require the caller to own it.
    pub(super) fn owned_posting(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
    ) -> Result<Internship, ApplicationServiceError> {
        // role first, so students never learn which ids exist
        if caller.role != Role::Company {
            return Err(AccessDenied::Role {
                required: Role::Company.label(),
            }
            .into());
        }

        let internship = self
            .internships
            .fetch(internship_id)?
            .ok_or(ApplicationServiceError::NotFound("internship"))?;
        authorize(caller, Permission::ManagePosting, Some(&internship))?;
        Ok(internship)
    }

    fn snapshot_of(&self, student: &UserId) -> Option<StudentSnapshot> {
        match self.users.fetch(student) {
            Ok(Some(user)) => Some(StudentSnapshot {
                id: user.id,
                name: user.name,
                email: user.email,
                skills: user.skills,
            }),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, student = %student.0, "student lookup failed");
                None
            }
        }
    }

    pub(super) fn display_name(&self, user: &UserId) -> Option<String> {
        self.users
            .fetch(user)
            .ok()
            .flatten()
            .map(|user| user.name)
            .filter(|name| !name.trim().is_empty())
    }

    fn announce_submission(&self, internship: &Internship, entry: &ApplicationEntry, applicants: u32) {
        let summary = internship.summary();

        if let Err(err) = self
            .notifications
            .notify_application_submitted(&entry.student, &summary)
        {
            warn!(error = %err, application = %entry.id.0, "submission notification dropped");
        }

        let student_name = self
            .display_name(&entry.student)
            .unwrap_or_else(|| "A student".to_string());
        let application = ApplicationSummary {
            internship: summary.clone(),
            application_id: entry.id.clone(),
            student: entry.student.clone(),
            student_name,
        };
        if let Err(err) = self.notifications.notify_new_application(&application) {
            warn!(error = %err, application = %entry.id.0, "company notification dropped");
        }

        if is_applicant_milestone(applicants) {
            if let Err(err) = self.notifications.notify_milestone(&summary, applicants) {
                warn!(error = %err, internship = %summary.id.0, "milestone notification dropped");
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you have already applied to this internship")]
    DuplicateApplication,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// Secondary (mirror) write failed. Logged and queued, never returned by apply/update.
    #[error("student profile mirror unavailable: {0}")]
    DependencyFailure(RepositoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApplicationServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ApplicationServiceError::DuplicateApplication
            | ApplicationServiceError::Validation(_)
            | ApplicationServiceError::Transition(_) => StatusCode::BAD_REQUEST,
            ApplicationServiceError::DependencyFailure(_)
            | ApplicationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "application workflow failure");
            return envelope::failure(status, "unexpected failure");
        }
        envelope::failure(status, self.to_string())
    }
}
