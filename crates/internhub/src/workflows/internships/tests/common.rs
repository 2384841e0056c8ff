use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::http::{with_token_verifier, StaticTokenVerifier, TokenVerifier};
use crate::workflows::internships::domain::{
    ApplicationEntry, ApplicationId, Caller, Internship, InternshipId, NewInternship, Role,
    StudentProfile, User, UserId, WorkType,
};
use crate::workflows::internships::status::ApplicationStatus;
use crate::workflows::internships::memory::{
    MemoryInternshipStore, MemoryProfileStore, MemoryUserDirectory,
};
use crate::workflows::internships::repository::{
    InternshipRepository, ProfileRepository, RepositoryError,
};
use crate::workflows::internships::{internship_router, ApplicationService};
use crate::workflows::notifications::{
    notification_router, MemoryNotificationStore, NotificationCenter,
};

pub(super) const ACME: &str = "acme";
pub(super) const GLOBEX: &str = "globex";
pub(super) const ANA: &str = "stu-ana";
pub(super) const BEN: &str = "stu-ben";

pub(super) struct Fixture<P> {
    pub(super) service: Arc<ApplicationService<MemoryInternshipStore, P>>,
    pub(super) internships: Arc<MemoryInternshipStore>,
    pub(super) profiles: Arc<P>,
    pub(super) center: Arc<NotificationCenter>,
}

fn user(id: &str, name: &str, role: Role) -> User {
    User {
        id: UserId(id.to_string()),
        email: format!("{id}@example.test"),
        name: name.to_string(),
        role,
        skills: match role {
            Role::Student => vec!["rust".to_string(), "sql".to_string()],
            Role::Company => Vec::new(),
        },
    }
}

pub(super) fn directory() -> Arc<MemoryUserDirectory> {
    let users = Arc::new(MemoryUserDirectory::default());
    for user in [
        user(ACME, "Acme Corp", Role::Company),
        user(GLOBEX, "Globex", Role::Company),
        user(ANA, "Ana Silva", Role::Student),
        user(BEN, "Ben Okafor", Role::Student),
    ] {
        users.insert(user).expect("seed user");
    }
    users
}

pub(super) fn build_service() -> Fixture<MemoryProfileStore> {
    build_service_with(Arc::new(MemoryProfileStore::default()))
}

pub(super) fn build_service_with<P>(profiles: Arc<P>) -> Fixture<P>
where
    P: ProfileRepository + 'static,
{
    let internships = Arc::new(MemoryInternshipStore::default());
    let center = Arc::new(NotificationCenter::new(
        Arc::new(MemoryNotificationStore::default()),
        50,
    ));
    let service = Arc::new(ApplicationService::new(
        internships.clone(),
        profiles.clone(),
        directory(),
        center.clone(),
    ));
    Fixture {
        service,
        internships,
        profiles,
        center,
    }
}

pub(super) fn new_posting() -> NewInternship {
    NewInternship {
        title: "Backend Intern".to_string(),
        description: "Build Rust services for the payments team.".to_string(),
        location: "Lisbon".to_string(),
        duration: "3 months".to_string(),
        stipend: 1200.0,
        work_type: WorkType::Hybrid,
        category: "engineering".to_string(),
        tags: vec!["rust".to_string()],
        requirements: vec!["Ownership and borrowing".to_string()],
        responsibilities: vec!["Ship features".to_string()],
    }
}

pub(super) fn post_internship<P>(fixture: &Fixture<P>, company: &str) -> InternshipId
where
    P: ProfileRepository + 'static,
{
    fixture
        .service
        .create_internship(&Caller::company(company), new_posting())
        .expect("posting created")
        .id
}

pub(super) fn stored<P>(fixture: &Fixture<P>, id: &InternshipId) -> Internship {
    fixture
        .internships
        .fetch(id)
        .expect("fetch succeeds")
        .expect("internship present")
}

/// Profile store that rejects every call.
pub(super) struct UnavailableProfiles;

impl ProfileRepository for UnavailableProfiles {
    fn fetch(&self, _user: &UserId) -> Result<Option<StudentProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn save(&self, _profile: StudentProfile) -> Result<StudentProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn update(
        &self,
        _user: &UserId,
        _seed: StudentProfile,
        _change: &mut dyn FnMut(&mut StudentProfile) -> bool,
    ) -> Result<(StudentProfile, bool), RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }
}

/// Memory profile store whose writes can be switched off.
#[derive(Default)]
pub(super) struct FlakyProfiles {
    pub(super) inner: MemoryProfileStore,
    failing: AtomicBool,
}

impl FlakyProfiles {
    pub(super) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ProfileRepository for FlakyProfiles {
    fn fetch(&self, user: &UserId) -> Result<Option<StudentProfile>, RepositoryError> {
        self.inner.fetch(user)
    }

    fn save(&self, profile: StudentProfile) -> Result<StudentProfile, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.save(profile)
    }

    fn update(
        &self,
        user: &UserId,
        seed: StudentProfile,
        change: &mut dyn FnMut(&mut StudentProfile) -> bool,
    ) -> Result<(StudentProfile, bool), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.update(user, seed, change)
    }
}

/// Memory posting store with switchable read outages and a scripted concurrent status write.
#[derive(Default)]
pub(super) struct ScriptedInternships {
    pub(super) inner: MemoryInternshipStore,
    unreadable: AtomicBool,
    interleaved: Mutex<Option<ApplicationStatus>>,
}

impl ScriptedInternships {
    pub(super) fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }

    /// The next status write first lands `status` as if another operator got there earlier.
    pub(super) fn interleave_status(&self, status: ApplicationStatus) {
        *self.interleaved.lock().expect("script mutex") = Some(status);
    }

    fn check_readable(&self) -> Result<(), RepositoryError> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("read replica lagging".to_string()));
        }
        Ok(())
    }
}

impl InternshipRepository for ScriptedInternships {
    fn insert(&self, internship: Internship) -> Result<Internship, RepositoryError> {
        self.inner.insert(internship)
    }

    fn fetch(&self, id: &InternshipId) -> Result<Option<Internship>, RepositoryError> {
        self.check_readable()?;
        self.inner.fetch(id)
    }

    fn save_details(&self, internship: &Internship) -> Result<(), RepositoryError> {
        self.inner.save_details(internship)
    }

    fn append_application(
        &self,
        id: &InternshipId,
        entry: ApplicationEntry,
    ) -> Result<u32, RepositoryError> {
        self.inner.append_application(id, entry)
    }

    fn set_application_status(
        &self,
        id: &InternshipId,
        application: &ApplicationId,
        expected: Option<ApplicationStatus>,
        status: ApplicationStatus,
    ) -> Result<ApplicationEntry, RepositoryError> {
        let earlier = self.interleaved.lock().expect("script mutex").take();
        if let Some(earlier) = earlier {
            self.inner
                .set_application_status(id, application, None, earlier)?;
        }
        self.inner
            .set_application_status(id, application, expected, status)
    }

    fn list_active(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Internship>, usize), RepositoryError> {
        self.check_readable()?;
        self.inner.list_active(offset, limit)
    }

    fn all(&self) -> Result<Vec<Internship>, RepositoryError> {
        self.check_readable()?;
        self.inner.all()
    }
}

/// Service over arbitrary stores, sharing the seeded directory.
pub(super) fn service_over<R, P>(
    internships: Arc<R>,
    profiles: Arc<P>,
) -> Arc<ApplicationService<R, P>>
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let center = Arc::new(NotificationCenter::new(
        Arc::new(MemoryNotificationStore::default()),
        50,
    ));
    Arc::new(ApplicationService::new(
        internships,
        profiles,
        directory(),
        center,
    ))
}

pub(super) fn verifier() -> Arc<dyn TokenVerifier> {
    let verifier = StaticTokenVerifier::default();
    verifier.issue("acme-token", Caller::company(ACME));
    verifier.issue("globex-token", Caller::company(GLOBEX));
    verifier.issue("ana-token", Caller::student(ANA));
    verifier.issue("ben-token", Caller::student(BEN));
    Arc::new(verifier)
}

pub(super) fn app<P>(fixture: &Fixture<P>) -> Router
where
    P: ProfileRepository + 'static,
{
    let router = internship_router(fixture.service.clone())
        .merge(notification_router(fixture.center.clone()));
    with_token_verifier(router, verifier())
}

pub(super) fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            axum::body::Body::from(serde_json::to_vec(&json).expect("serialize body"))
        }
        None => axum::body::Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
