use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    ApplicationEntry, ApplicationId, Internship, InternshipId, StudentProfile, User, UserId,
};
use super::repository::{InternshipRepository, ProfileRepository, RepositoryError, UserDirectory};
use super::status::ApplicationStatus;

/// Process-local posting store. Each mutation holds the map lock for its full duration.
#[derive(Default, Clone)]
pub struct MemoryInternshipStore {
    records: Arc<Mutex<HashMap<InternshipId, Internship>>>,
}

impl InternshipRepository for MemoryInternshipStore {
    fn insert(&self, internship: Internship) -> Result<Internship, RepositoryError> {
        let mut guard = self.records.lock().expect("internship mutex poisoned");
        if guard.contains_key(&internship.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(internship.id.clone(), internship.clone());
        Ok(internship)
    }

    fn fetch(&self, id: &InternshipId) -> Result<Option<Internship>, RepositoryError> {
        let guard = self.records.lock().expect("internship mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save_details(&self, internship: &Internship) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("internship mutex poisoned");
        let stored = guard
            .get_mut(&internship.id)
            .ok_or(RepositoryError::NotFound)?;

        let applications = std::mem::take(&mut stored.applications);
        let applicants = stored.applicants;
        *stored = internship.clone();
        stored.applications = applications;
        stored.applicants = applicants;
        Ok(())
    }

    fn append_application(
        &self,
        id: &InternshipId,
        entry: ApplicationEntry,
    ) -> Result<u32, RepositoryError> {
        let mut guard = self.records.lock().expect("internship mutex poisoned");
        let stored = guard
            .get_mut(id)
            .filter(|stored| stored.is_active)
            .ok_or(RepositoryError::NotFound)?;

        if stored.application_from(&entry.student).is_some() {
            return Err(RepositoryError::Conflict);
        }

        stored.updated_at = entry.applied_at;
        stored.applications.push(entry);
        stored.applicants += 1;
        Ok(stored.applicants)
    }

    fn set_application_status(
        &self,
        id: &InternshipId,
        application: &ApplicationId,
        expected: Option<ApplicationStatus>,
        status: ApplicationStatus,
    ) -> Result<ApplicationEntry, RepositoryError> {
        let mut guard = self.records.lock().expect("internship mutex poisoned");
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let entry = stored
            .applications
            .iter_mut()
            .find(|entry| &entry.id == application)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(expected) = expected {
            if entry.status != expected {
                return Err(RepositoryError::Stale {
                    current: entry.status,
                });
            }
        }

        entry.status = status;
        Ok(entry.clone())
    }

    fn list_active(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Internship>, usize), RepositoryError> {
        let guard = self.records.lock().expect("internship mutex poisoned");
        let mut active: Vec<&Internship> = guard.values().filter(|i| i.is_active).collect();
        active.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = active.len();
        let page = active
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    fn all(&self) -> Result<Vec<Internship>, RepositoryError> {
        let guard = self.records.lock().expect("internship mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Process-local profile store keyed by the owning user.
#[derive(Default, Clone)]
pub struct MemoryProfileStore {
    records: Arc<Mutex<HashMap<UserId, StudentProfile>>>,
}

impl ProfileRepository for MemoryProfileStore {
    fn fetch(&self, user: &UserId) -> Result<Option<StudentProfile>, RepositoryError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        Ok(guard.get(user).cloned())
    }

    fn save(&self, profile: StudentProfile) -> Result<StudentProfile, RepositoryError> {
        let mut guard = self.records.lock().expect("profile mutex poisoned");
        guard.insert(profile.user.clone(), profile.clone());
        Ok(profile)
    }

    fn update(
        &self,
        user: &UserId,
        seed: StudentProfile,
        change: &mut dyn FnMut(&mut StudentProfile) -> bool,
    ) -> Result<(StudentProfile, bool), RepositoryError> {
        let mut guard = self.records.lock().expect("profile mutex poisoned");
        let mut profile = guard.get(user).cloned().unwrap_or(seed);
        if !change(&mut profile) {
            return Ok((profile, false));
        }
        guard.insert(user.clone(), profile.clone());
        Ok((profile, true))
    }
}

#[derive(Default, Clone)]
pub struct MemoryUserDirectory {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserDirectory {
    /// Register a user; emails are unique across the directory.
    pub fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.users.lock().expect("user mutex poisoned");
        let email_taken = guard
            .values()
            .any(|existing| existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email));
        if email_taken || guard.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.lock().expect("user mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}
