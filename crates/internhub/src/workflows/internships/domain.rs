use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ApplicationStatus;

/// Identifier wrapper for platform users (students and companies).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Identifier wrapper for internship postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternshipId(pub String);

/// Identifier of an application sub-document embedded on an internship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
        }
    }
}

/// Identity resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn student(id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(id.into()),
            role: Role::Student,
        }
    }

    pub fn company(id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(id.into()),
            role: Role::Company,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkType {
    OnSite,
    Remote,
    Hybrid,
}

/// A posting plus its embedded applications. The embedded list is authoritative for status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: InternshipId,
    pub posted_by: UserId,
    pub company: String,
    pub company_email: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration: String,
    pub stipend: f64,
    pub work_type: WorkType,
    pub category: String,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub is_active: bool,
    pub applicants: u32,
    pub applications: Vec<ApplicationEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Internship {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.posted_by == user
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&ApplicationEntry> {
        self.applications.iter().find(|entry| &entry.id == id)
    }

    pub fn application_from(&self, student: &UserId) -> Option<&ApplicationEntry> {
        self.applications
            .iter()
            .find(|entry| &entry.student == student)
    }

    pub fn summary(&self) -> InternshipSummary {
        InternshipSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            posted_by: self.posted_by.clone(),
        }
    }
}

/// The application sub-document stored on an internship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEntry {
    pub id: ApplicationId,
    pub student: UserId,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub resume: Option<String>,
    pub cover_letter: Option<String>,
}

/// Lightweight posting reference carried into notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipSummary {
    pub id: InternshipId,
    pub title: String,
    pub company: String,
    pub posted_by: UserId,
}

/// Payload a student submits when applying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

/// Result of a successful apply call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReceipt {
    pub internship_id: InternshipId,
    pub application_id: ApplicationId,
    pub applicants: u32,
}

/// Denormalized student identity shown to the posting owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub resume: Option<String>,
    pub cover_letter: Option<String>,
    pub student: Option<StudentSnapshot>,
}

impl ApplicationView {
    pub fn from_entry(entry: &ApplicationEntry, student: Option<StudentSnapshot>) -> Self {
        Self {
            id: entry.id.clone(),
            status: entry.status,
            applied_at: entry.applied_at,
            resume: entry.resume.clone(),
            cover_letter: entry.cover_letter.clone(),
            student,
        }
    }
}

/// Status response returned after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub internship_id: InternshipId,
    pub application_id: ApplicationId,
    pub previous_status: ApplicationStatus,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeMetadata {
    pub file_name: String,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Student-side copy of an application. Read optimization only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredApplication {
    pub internship: InternshipId,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

impl MirroredApplication {
    pub fn of(internship: &InternshipId, entry: &ApplicationEntry) -> Self {
        Self {
            internship: internship.clone(),
            applied_at: entry.applied_at,
            status: entry.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub user: UserId,
    pub name: String,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub year: Option<u8>,
    pub gpa: Option<f32>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub resume: Option<ResumeMetadata>,
    pub bookmarks: Vec<InternshipId>,
    pub applications: Vec<MirroredApplication>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfile {
    /// Empty profile created lazily on first write.
    pub fn blank(user: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user,
            name: String::new(),
            university: None,
            degree: None,
            year: None,
            gpa: None,
            bio: None,
            skills: Vec::new(),
            languages: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            resume: None,
            bookmarks: Vec::new(),
            applications: Vec::new(),
            updated_at: now,
        }
    }

    pub fn mirror_for(&self, internship: &InternshipId) -> Option<&MirroredApplication> {
        self.applications
            .iter()
            .find(|mirror| &mirror.internship == internship)
    }
}

/// Student-editable profile fields. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub university: Option<String>,
    pub degree: Option<String>,
    pub year: Option<u8>,
    pub gpa: Option<f32>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub experience: Option<Vec<ExperienceEntry>>,
    pub education: Option<Vec<EducationEntry>>,
    pub resume: Option<ResumeMetadata>,
}

/// Fields a company supplies when posting an internship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInternship {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub stipend: f64,
    pub work_type: WorkType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

/// Partial edit of a posting. Applications and the applicant counter are not editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub stipend: Option<f64>,
    pub work_type: Option<WorkType>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
}

/// Public projection of a posting; embedded applications stay private to the owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingView {
    pub id: InternshipId,
    pub posted_by: UserId,
    pub company: String,
    pub company_email: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub duration: String,
    pub stipend: f64,
    pub work_type: WorkType,
    pub category: String,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub is_active: bool,
    pub applicants: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Internship> for PostingView {
    fn from(internship: &Internship) -> Self {
        Self {
            id: internship.id.clone(),
            posted_by: internship.posted_by.clone(),
            company: internship.company.clone(),
            company_email: internship.company_email.clone(),
            title: internship.title.clone(),
            description: internship.description.clone(),
            location: internship.location.clone(),
            duration: internship.duration.clone(),
            stipend: internship.stipend,
            work_type: internship.work_type,
            category: internship.category.clone(),
            tags: internship.tags.clone(),
            requirements: internship.requirements.clone(),
            responsibilities: internship.responsibilities.clone(),
            is_active: internship.is_active,
            applicants: internship.applicants,
            created_at: internship.created_at,
            updated_at: internship.updated_at,
        }
    }
}

/// Public listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipPage {
    pub items: Vec<PostingView>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}
