use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::info;

use super::access::{authorize, Permission};
use super::domain::{
    Caller, Internship, InternshipId, InternshipPage, InternshipUpdate, NewInternship,
    PostingView,
};
use super::repository::{InternshipRepository, ProfileRepository};
use super::service::{ApplicationService, ApplicationServiceError};

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

static INTERNSHIP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_internship_id() -> InternshipId {
    let id = INTERNSHIP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InternshipId(format!("int-{id:06}"))
}

fn required(field: &str, value: &str) -> Result<String, ApplicationServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApplicationServiceError::Validation(format!(
            "{field} is required"
        )));
    }
    Ok(trimmed.to_string())
}

fn valid_stipend(stipend: f64) -> Result<f64, ApplicationServiceError> {
    if stipend.is_finite() && stipend >= 0.0 {
        Ok(stipend)
    } else {
        Err(ApplicationServiceError::Validation(
            "stipend must be a non-negative number".to_string(),
        ))
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

impl<R, P> ApplicationService<R, P>
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    /// Post a new internship. Company name and email are copied from the caller's account.
    pub fn create_internship(
        &self,
        caller: &Caller,
        posting: NewInternship,
    ) -> Result<PostingView, ApplicationServiceError> {
        authorize(caller, Permission::PostInternship, None)?;

        let company = self
            .users
            .fetch(&caller.user_id)?
            .ok_or(ApplicationServiceError::NotFound("company account"))?;

        let now = Utc::now();
        let internship = Internship {
            id: next_internship_id(),
            posted_by: caller.user_id.clone(),
            company: company.name,
            company_email: company.email,
            title: required("title", &posting.title)?,
            description: required("description", &posting.description)?,
            location: required("location", &posting.location)?,
            duration: posting.duration.trim().to_string(),
            stipend: valid_stipend(posting.stipend)?,
            work_type: posting.work_type,
            category: posting.category.trim().to_string(),
            tags: clean_list(posting.tags),
            requirements: clean_list(posting.requirements),
            responsibilities: clean_list(posting.responsibilities),
            is_active: true,
            applicants: 0,
            applications: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.internships.insert(internship)?;
        info!(internship = %stored.id.0, company = %caller.user_id.0, "internship posted");
        Ok(PostingView::from(&stored))
    }

    /// Public lookup. Deactivated postings are hidden.
    pub fn get_internship(
        &self,
        internship_id: &InternshipId,
    ) -> Result<PostingView, ApplicationServiceError> {
        self.internships
            .fetch(internship_id)?
            .filter(|internship| internship.is_active)
            .map(|internship| PostingView::from(&internship))
            .ok_or(ApplicationServiceError::NotFound("internship"))
    }

    pub fn update_internship(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
        update: InternshipUpdate,
    ) -> Result<PostingView, ApplicationServiceError> {
        let mut internship = self.owned_posting(caller, internship_id)?;

        if let Some(title) = update.title {
            internship.title = required("title", &title)?;
        }
        if let Some(description) = update.description {
            internship.description = required("description", &description)?;
        }
        if let Some(location) = update.location {
            internship.location = required("location", &location)?;
        }
        if let Some(duration) = update.duration {
            internship.duration = duration.trim().to_string();
        }
        if let Some(stipend) = update.stipend {
            internship.stipend = valid_stipend(stipend)?;
        }
        if let Some(work_type) = update.work_type {
            internship.work_type = work_type;
        }
        if let Some(category) = update.category {
            internship.category = category.trim().to_string();
        }
        if let Some(tags) = update.tags {
            internship.tags = clean_list(tags);
        }
        if let Some(requirements) = update.requirements {
            internship.requirements = clean_list(requirements);
        }
        if let Some(responsibilities) = update.responsibilities {
            internship.responsibilities = clean_list(responsibilities);
        }
        internship.updated_at = Utc::now();

        self.internships.save_details(&internship)?;
        Ok(PostingView::from(&internship))
    }

    /// Soft delete. Applications stay attached and visible to the owner.
    pub fn deactivate_internship(
        &self,
        caller: &Caller,
        internship_id: &InternshipId,
    ) -> Result<PostingView, ApplicationServiceError> {
        let mut internship = self.owned_posting(caller, internship_id)?;
        if internship.is_active {
            internship.is_active = false;
            internship.updated_at = Utc::now();
            self.internships.save_details(&internship)?;
            info!(internship = %internship_id.0, "internship deactivated");
        }
        Ok(PostingView::from(&internship))
    }

    /// Active postings, newest first. `page` is 1-based; `limit` is clamped.
    pub fn list_internships(
        &self,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<InternshipPage, ApplicationServiceError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = (page - 1).saturating_mul(limit);

        let (items, total) = self.internships.list_active(offset, limit)?;
        Ok(InternshipPage {
            items: items.iter().map(PostingView::from).collect(),
            page,
            limit,
            total,
        })
    }
}
