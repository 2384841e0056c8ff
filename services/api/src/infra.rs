use internhub::http::StaticTokenVerifier;
use internhub::workflows::internships::{
    ApplicationService, ApplicationServiceError, Caller, MemoryInternshipStore,
    MemoryProfileStore, MemoryUserDirectory, Role, User, UserId,
};
use internhub::workflows::notifications::{MemoryNotificationStore, NotificationCenter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ApiService = ApplicationService<MemoryInternshipStore, MemoryProfileStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process wiring of the stores, the notification center, and the token table.
pub(crate) struct Platform {
    pub(crate) service: Arc<ApiService>,
    pub(crate) notifications: Arc<NotificationCenter>,
    pub(crate) users: Arc<MemoryUserDirectory>,
    pub(crate) tokens: StaticTokenVerifier,
}

impl Platform {
    pub(crate) fn in_memory(retention: usize) -> Self {
        let users = Arc::new(MemoryUserDirectory::default());
        let notifications = Arc::new(NotificationCenter::new(
            Arc::new(MemoryNotificationStore::default()),
            retention,
        ));
        let service = Arc::new(ApplicationService::new(
            Arc::new(MemoryInternshipStore::default()),
            Arc::new(MemoryProfileStore::default()),
            users.clone(),
            notifications.clone(),
        ));

        Self {
            service,
            notifications,
            users,
            tokens: StaticTokenVerifier::default(),
        }
    }
}

pub(crate) struct DemoAccount {
    pub(crate) user_id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) role: Role,
    pub(crate) token: &'static str,
}

pub(crate) static DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        user_id: "company-northwind",
        name: "Northwind Robotics",
        role: Role::Company,
        token: "demo-company-token",
    },
    DemoAccount {
        user_id: "student-ada",
        name: "Ada Fernandes",
        role: Role::Student,
        token: "demo-student-token",
    },
    DemoAccount {
        user_id: "student-kenji",
        name: "Kenji Sato",
        role: Role::Student,
        token: "demo-student-2-token",
    },
];

impl DemoAccount {
    pub(crate) fn caller(&self) -> Caller {
        Caller {
            user_id: UserId(self.user_id.to_string()),
            role: self.role,
        }
    }

    fn user(&self) -> User {
        User {
            id: UserId(self.user_id.to_string()),
            email: format!("{}@demo.internhub.test", self.user_id),
            name: self.name.to_string(),
            role: self.role,
            skills: match self.role {
                Role::Student => vec!["rust".to_string(), "embedded".to_string()],
                Role::Company => Vec::new(),
            },
        }
    }
}

/// Register the demo accounts and issue their bearer tokens.
pub(crate) fn seed_demo(platform: &Platform) -> Result<(), ApplicationServiceError> {
    for account in &DEMO_ACCOUNTS {
        platform.users.insert(account.user())?;
        platform.tokens.issue(account.token, account.caller());
    }
    Ok(())
}

pub(crate) fn demo_account(role: Role) -> &'static DemoAccount {
    DEMO_ACCOUNTS
        .iter()
        .find(|account| account.role == role)
        .unwrap_or(&DEMO_ACCOUNTS[0])
}
