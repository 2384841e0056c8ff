use chrono::Utc;

use super::access::{authorize, Permission};
use super::domain::{
    Caller, InternshipId, MirroredApplication, ProfileUpdate, StudentProfile, UserId,
};
use super::repository::{InternshipRepository, ProfileRepository};
use super::service::{ApplicationService, ApplicationServiceError};

impl<R, P> ApplicationService<R, P>
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    /// The caller's profile; a blank one (not persisted) if none was written yet.
    pub fn my_profile(&self, caller: &Caller) -> Result<StudentProfile, ApplicationServiceError> {
        authorize(caller, Permission::ManageOwnProfile, None)?;
        self.load_or_blank(caller)
    }

    pub fn upsert_profile(
        &self,
        caller: &Caller,
        mut update: ProfileUpdate,
    ) -> Result<StudentProfile, ApplicationServiceError> {
        authorize(caller, Permission::ManageOwnProfile, None)?;

        if let Some(gpa) = update.gpa {
            if !gpa.is_finite() || !(0.0..=10.0).contains(&gpa) {
                return Err(ApplicationServiceError::Validation(
                    "gpa must be between 0 and 10".to_string(),
                ));
            }
        }
        if matches!(update.year, Some(0)) {
            return Err(ApplicationServiceError::Validation(
                "year must be at least 1".to_string(),
            ));
        }
        if let Some(name) = update.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApplicationServiceError::Validation(
                    "name cannot be blank".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let seed = self.blank_profile(&caller.user_id);
        let (profile, _) = self.profiles.update(
            &caller.user_id,
            seed,
            &mut |profile: &mut StudentProfile| {
                if let Some(name) = update.name.take() {
                    profile.name = name;
                }
                if let Some(university) = update.university.take() {
                    profile.university = Some(university);
                }
                if let Some(degree) = update.degree.take() {
                    profile.degree = Some(degree);
                }
                if let Some(year) = update.year {
                    profile.year = Some(year);
                }
                if let Some(gpa) = update.gpa {
                    profile.gpa = Some(gpa);
                }
                if let Some(bio) = update.bio.take() {
                    profile.bio = Some(bio);
                }
                if let Some(skills) = update.skills.take() {
                    profile.skills = skills;
                }
                if let Some(languages) = update.languages.take() {
                    profile.languages = languages;
                }
                if let Some(experience) = update.experience.take() {
                    profile.experience = experience;
                }
                if let Some(education) = update.education.take() {
                    profile.education = education;
                }
                if let Some(resume) = update.resume.take() {
                    profile.resume = Some(resume);
                }
                profile.updated_at = now;
                true
            },
        )?;
        Ok(profile)
    }

    /// Student's own application list, served from the mirror.
    pub fn my_applications(
        &self,
        caller: &Caller,
    ) -> Result<Vec<MirroredApplication>, ApplicationServiceError> {
        authorize(caller, Permission::ManageOwnProfile, None)?;
        Ok(self
            .profiles
            .fetch(&caller.user_id)?
            .map(|profile| profile.applications)
            .unwrap_or_default())
    }

    /// Add or remove a bookmark. Returns whether the posting is bookmarked afterwards.
    pub fn toggle_bookmark(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
    ) -> Result<bool, ApplicationServiceError> {
        authorize(caller, Permission::ManageOwnProfile, None)?;
        if self.internships.fetch(internship_id)?.is_none() {
            return Err(ApplicationServiceError::NotFound("internship"));
        }

        let mut bookmarked = false;
        self.profiles.update(
            &caller.user_id,
            self.blank_profile(&caller.user_id),
            &mut |profile: &mut StudentProfile| {
                match profile
                    .bookmarks
                    .iter()
                    .position(|bookmark| bookmark == internship_id)
                {
                    Some(index) => {
                        profile.bookmarks.remove(index);
                        bookmarked = false;
                    }
                    None => {
                        profile.bookmarks.push(internship_id.clone());
                        bookmarked = true;
                    }
                }
                profile.updated_at = Utc::now();
                true
            },
        )?;
        Ok(bookmarked)
    }

    /// Unsaved profile for a user with no document yet, named from the user directory.
    pub(super) fn blank_profile(&self, user: &UserId) -> StudentProfile {
        let mut profile = StudentProfile::blank(user.clone(), Utc::now());
        profile.name = self.display_name(user).unwrap_or_default();
        profile
    }

    fn load_or_blank(&self, caller: &Caller) -> Result<StudentProfile, ApplicationServiceError> {
        Ok(self
            .profiles
            .fetch(&caller.user_id)?
            .unwrap_or_else(|| self.blank_profile(&caller.user_id)))
    }
}
