//! Student-side mirror of the embedded applications.
//!
//! The internship document is authoritative. The mirror on `StudentProfile` is written after the
//! primary update as an idempotent projection; failed writes are parked in an outbox and retried
//! by [`ApplicationService::reconcile`], which also diffs every posting against the mirrors.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{InternshipId, MirroredApplication, StudentProfile, UserId};
use super::repository::{InternshipRepository, ProfileRepository};
use super::service::{ApplicationService, ApplicationServiceError};

/// A mirror write that failed and is waiting for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProjection {
    pub student: UserId,
    pub internship: InternshipId,
    pub attempts: u32,
    pub last_error: String,
}

#[derive(Default)]
pub(crate) struct ProjectionOutbox {
    pending: Mutex<Vec<PendingProjection>>,
}

impl ProjectionOutbox {
    fn park(&self, student: &UserId, internship: &InternshipId, error: String) {
        let mut guard = self.pending.lock().expect("outbox mutex poisoned");
        match guard
            .iter_mut()
            .find(|entry| &entry.student == student && &entry.internship == internship)
        {
            Some(entry) => {
                entry.attempts += 1;
                entry.last_error = error;
            }
            None => guard.push(PendingProjection {
                student: student.clone(),
                internship: internship.clone(),
                attempts: 1,
                last_error: error,
            }),
        }
    }

    fn drain(&self) -> Vec<PendingProjection> {
        std::mem::take(&mut *self.pending.lock().expect("outbox mutex poisoned"))
    }

    /// Put a drained entry back after another failed attempt.
    fn requeue(&self, entry: PendingProjection, error: String) {
        self.pending
            .lock()
            .expect("outbox mutex poisoned")
            .push(PendingProjection {
                attempts: entry.attempts + 1,
                last_error: error,
                ..entry
            });
    }

    fn snapshot(&self) -> Vec<PendingProjection> {
        self.pending.lock().expect("outbox mutex poisoned").clone()
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Applications compared against their mirror.
    pub scanned: usize,
    /// Parked projections that now succeeded.
    pub retried: usize,
    /// Divergent or missing mirrors found by the diff and repaired.
    pub repaired: usize,
    /// Pairs that still could not be written; they stay parked.
    pub failed: usize,
}

impl<R, P> ApplicationService<R, P>
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    /// Write `mirror` into the student's profile, creating the profile if needed.
    ///
    /// Returns whether anything changed; re-applying the same mirror is a no-op.
    pub(super) fn project(
        &self,
        student: &UserId,
        mirror: MirroredApplication,
    ) -> Result<bool, ApplicationServiceError> {
        let now = Utc::now();
        let seed = self.blank_profile(student);

        let (_, written) = self
            .profiles
            .update(student, seed, &mut |profile: &mut StudentProfile| {
                match profile
                    .applications
                    .iter_mut()
                    .find(|existing| existing.internship == mirror.internship)
                {
                    Some(existing) if *existing == mirror => return false,
                    Some(existing) => *existing = mirror.clone(),
                    None => profile.applications.push(mirror.clone()),
                }
                profile.updated_at = now;
                true
            })
            .map_err(ApplicationServiceError::DependencyFailure)?;
        Ok(written)
    }

    /// Project and swallow failures into the outbox.
    pub(super) fn mirror_best_effort(&self, student: &UserId, mirror: MirroredApplication) {
        let internship = mirror.internship.clone();
        if let Err(err) = self.project(student, mirror) {
            warn!(
                error = %err,
                student = %student.0,
                internship = %internship.0,
                "mirror write failed; parked for reconciliation"
            );
            self.outbox.park(student, &internship, err.to_string());
        }
    }

    /// Mirror writes waiting for reconciliation.
    pub fn pending_projections(&self) -> Vec<PendingProjection> {
        self.outbox.snapshot()
    }

    /// Retry parked projections, then diff every embedded application against its mirror.
    pub fn reconcile(&self) -> Result<ReconciliationReport, ApplicationServiceError> {
        let mut report = ReconciliationReport::default();
        let mut failing: HashSet<(UserId, InternshipId)> = HashSet::new();

        for parked in self.outbox.drain() {
            let key = (parked.student.clone(), parked.internship.clone());
            let source = match self.internships.fetch(&parked.internship) {
                Ok(source) => source,
                Err(err) => {
                    warn!(
                        error = %err,
                        internship = %parked.internship.0,
                        "source posting unreadable; projection stays parked"
                    );
                    self.outbox.requeue(parked, err.to_string());
                    failing.insert(key);
                    report.failed += 1;
                    continue;
                }
            };

            let authoritative = source.and_then(|internship| {
                internship
                    .application_from(&parked.student)
                    .map(|entry| MirroredApplication::of(&internship.id, entry))
            });

            let Some(mirror) = authoritative else {
                warn!(
                    student = %parked.student.0,
                    internship = %parked.internship.0,
                    "dropping parked projection without a source application"
                );
                continue;
            };

            match self.project(&parked.student, mirror) {
                Ok(_) => report.retried += 1,
                Err(err) => {
                    self.outbox.requeue(parked, err.to_string());
                    failing.insert(key);
                    report.failed += 1;
                }
            }
        }

        for internship in self.internships.all()? {
            for entry in &internship.applications {
                report.scanned += 1;
                let key = (entry.student.clone(), internship.id.clone());
                if failing.contains(&key) {
                    continue;
                }

                match self.project(&entry.student, MirroredApplication::of(&internship.id, entry)) {
                    Ok(true) => report.repaired += 1,
                    Ok(false) => {}
                    Err(err) => {
                        self.outbox
                            .park(&entry.student, &internship.id, err.to_string());
                        failing.insert(key);
                        report.failed += 1;
                    }
                }
            }
        }

        if report.retried + report.repaired + report.failed > 0 {
            info!(
                scanned = report.scanned,
                retried = report.retried,
                repaired = report.repaired,
                failed = report.failed,
                "mirror reconciliation finished"
            );
        }

        Ok(report)
    }
}
