use super::common::*;
use std::sync::Arc;

use crate::workflows::internships::domain::{
    ApplicationRequest, Caller, InternshipId, MirroredApplication, ProfileUpdate, UserId,
};
use crate::workflows::internships::repository::{InternshipRepository, ProfileRepository};
use crate::workflows::internships::status::ApplicationStatus;

fn ana() -> UserId {
    UserId(ANA.to_string())
}

#[test]
fn apply_and_status_changes_keep_the_mirror_in_step() {
    let fixture = build_service();
    let internship = post_internship(&fixture, ACME);
    let receipt = fixture
        .service
        .apply(&Caller::student(ANA), &internship, ApplicationRequest::default())
        .expect("apply succeeds");

    let profile = fixture
        .profiles
        .fetch(&ana())
        .expect("fetch succeeds")
        .expect("profile created lazily");
    assert_eq!(profile.name, "Ana Silva");
    assert_eq!(
        profile.mirror_for(&internship).map(|mirror| mirror.status),
        Some(ApplicationStatus::Pending)
    );

    fixture
        .service
        .update_status(
            &Caller::company(ACME),
            &internship,
            &receipt.application_id,
            "reviewing",
        )
        .expect("pending -> reviewing");

    let mine = fixture
        .service
        .my_applications(&Caller::student(ANA))
        .expect("mirror loads");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, ApplicationStatus::Reviewing);
    assert!(fixture.service.pending_projections().is_empty());
}

#[test]
fn permanent_mirror_failure_never_fails_apply() {
    let fixture = build_service_with(Arc::new(UnavailableProfiles));
    let internship = fixture
        .service
        .create_internship(&Caller::company(ACME), new_posting())
        .expect("posting created")
        .id;

    let receipt = fixture
        .service
        .apply(&Caller::student(ANA), &internship, ApplicationRequest::default())
        .expect("apply succeeds despite mirror outage");
    fixture
        .service
        .update_status(
            &Caller::company(ACME),
            &internship,
            &receipt.application_id,
            "rejected",
        )
        .expect("status change succeeds despite mirror outage");

    let stored = stored(&fixture, &internship);
    assert_eq!(stored.applications[0].status, ApplicationStatus::Rejected);

    let parked = fixture.service.pending_projections();
    assert_eq!(parked.len(), 1, "one entry per (student, internship)");
    assert_eq!(parked[0].attempts, 2);
    assert!(parked[0].last_error.contains("profile store offline"));

    let report = fixture.service.reconcile().expect("reconcile runs");
    assert_eq!(report.failed, 1);
    assert_eq!(report.retried, 0);
    assert_eq!(fixture.service.pending_projections().len(), 1);
}

#[test]
fn reconcile_retries_parked_projections() {
    let profiles = Arc::new(FlakyProfiles::default());
    let fixture = build_service_with(profiles.clone());
    let internship = post_internship(&fixture, ACME);

    profiles.set_failing(true);
    let receipt = fixture
        .service
        .apply(&Caller::student(ANA), &internship, ApplicationRequest::default())
        .expect("apply succeeds");
    fixture
        .service
        .update_status(
            &Caller::company(ACME),
            &internship,
            &receipt.application_id,
            "reviewing",
        )
        .expect("status change succeeds");
    assert!(profiles.inner.fetch(&ana()).expect("fetch").is_none());
    assert_eq!(fixture.service.pending_projections().len(), 1);

    profiles.set_failing(false);
    let report = fixture.service.reconcile().expect("reconcile runs");
    assert_eq!(report.retried, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.scanned, 1);
    assert_eq!(report.repaired, 0, "retry already converged the mirror");
    assert!(fixture.service.pending_projections().is_empty());

    let profile = profiles
        .inner
        .fetch(&ana())
        .expect("fetch")
        .expect("profile written");
    assert_eq!(
        profile.mirror_for(&internship).map(|mirror| mirror.status),
        Some(ApplicationStatus::Reviewing)
    );
}

#[test]
fn reconcile_repairs_divergent_mirrors_and_is_idempotent() {
    let fixture = build_service();
    let internship = post_internship(&fixture, ACME);
    fixture
        .service
        .apply(&Caller::student(ANA), &internship, ApplicationRequest::default())
        .expect("apply succeeds");

    // simulate drift written by something other than the service
    let mut profile = fixture
        .profiles
        .fetch(&ana())
        .expect("fetch")
        .expect("profile present");
    profile.applications = vec![MirroredApplication {
        internship: internship.clone(),
        applied_at: profile.applications[0].applied_at,
        status: ApplicationStatus::Accepted,
    }];
    fixture.profiles.save(profile).expect("save drift");

    let first = fixture.service.reconcile().expect("reconcile runs");
    assert_eq!(first.repaired, 1);
    let second = fixture.service.reconcile().expect("reconcile runs");
    assert_eq!(second.repaired, 0);

    let source = fixture
        .internships
        .fetch(&internship)
        .expect("fetch")
        .expect("internship present");
    let mirror = fixture
        .profiles
        .fetch(&ana())
        .expect("fetch")
        .expect("profile present");
    assert_eq!(
        mirror.mirror_for(&internship),
        Some(&MirroredApplication::of(
            &internship,
            &source.applications[0]
        ))
    );
}

#[test]
fn unreadable_postings_keep_every_parked_projection() {
    let internships = Arc::new(ScriptedInternships::default());
    let profiles = Arc::new(FlakyProfiles::default());
    let service = service_over(internships.clone(), profiles.clone());
    let internship = service
        .create_internship(&Caller::company(ACME), new_posting())
        .expect("posting created")
        .id;

    profiles.set_failing(true);
    for student in [ANA, BEN] {
        service
            .apply(&Caller::student(student), &internship, ApplicationRequest::default())
            .expect("apply succeeds");
    }
    assert_eq!(service.pending_projections().len(), 2);

    profiles.set_failing(false);
    internships.set_unreadable(true);
    assert!(service.reconcile().is_err());

    let parked = service.pending_projections();
    assert_eq!(parked.len(), 2, "nothing is lost when the source is unreadable");
    assert!(parked
        .iter()
        .all(|entry| entry.attempts == 2 && entry.last_error.contains("read replica lagging")));

    internships.set_unreadable(false);
    let report = service.reconcile().expect("reconcile runs");
    assert_eq!(report.retried, 2);
    assert_eq!(report.failed, 0);
    assert!(service.pending_projections().is_empty());
    for student in [ANA, BEN] {
        let profile = profiles
            .inner
            .fetch(&UserId(student.to_string()))
            .expect("fetch")
            .expect("profile written");
        assert_eq!(
            profile.mirror_for(&internship).map(|mirror| mirror.status),
            Some(ApplicationStatus::Pending)
        );
    }
}

#[test]
fn profile_edits_survive_concurrent_mirror_writes() {
    let fixture = build_service();
    let postings: Vec<InternshipId> = (0..8).map(|_| post_internship(&fixture, ACME)).collect();
    let student = Caller::student(ANA);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for posting in &postings {
                fixture
                    .service
                    .apply(&student, posting, ApplicationRequest::default())
                    .expect("apply succeeds");
            }
        });
        scope.spawn(|| {
            for (round, posting) in postings.iter().enumerate() {
                fixture
                    .service
                    .upsert_profile(
                        &student,
                        ProfileUpdate {
                            bio: Some(format!("draft {round}")),
                            ..ProfileUpdate::default()
                        },
                    )
                    .expect("profile saved");
                fixture
                    .service
                    .toggle_bookmark(&student, posting)
                    .expect("bookmark toggled");
            }
        });
    });

    let profile = fixture
        .profiles
        .fetch(&ana())
        .expect("fetch")
        .expect("profile present");
    assert_eq!(profile.bio.as_deref(), Some("draft 7"));
    assert_eq!(profile.bookmarks.len(), postings.len());
    assert_eq!(profile.applications.len(), postings.len());
    assert!(fixture.service.pending_projections().is_empty());
}
