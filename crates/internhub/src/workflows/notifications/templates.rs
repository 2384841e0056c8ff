use crate::workflows::internships::domain::InternshipSummary;
use crate::workflows::internships::status::ApplicationStatus;

use super::domain::ApplicationSummary;

/// Applicant counts at which the posting owner gets a milestone notice.
pub const APPLICANT_MILESTONES: [u32; 5] = [5, 10, 25, 50, 100];

pub fn is_applicant_milestone(applicants: u32) -> bool {
    APPLICANT_MILESTONES.contains(&applicants)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub title: String,
    pub message: String,
}

pub fn application_submitted(internship: &InternshipSummary) -> Rendered {
    Rendered {
        title: "Application Submitted".to_string(),
        message: format!(
            "Your application for {} at {} has been submitted. We'll let you know when the status changes.",
            internship.title, internship.company
        ),
    }
}

pub fn new_application(summary: &ApplicationSummary) -> Rendered {
    Rendered {
        title: "New Application Received".to_string(),
        message: format!(
            "{} applied for {}.",
            summary.student_name, summary.internship.title
        ),
    }
}

/// Student-facing copy keyed by the new status, with a generic fallback.
pub fn status_change(
    internship: &InternshipSummary,
    new_status: ApplicationStatus,
) -> Rendered {
    let InternshipSummary { title, company, .. } = internship;
    let (heading, message) = match new_status {
        ApplicationStatus::Reviewing => (
            "Application Under Review",
            format!("{company} is now reviewing your application for {title}."),
        ),
        ApplicationStatus::Interview => (
            "Interview Invitation",
            format!("Good news! {company} would like to interview you for {title}."),
        ),
        ApplicationStatus::Accepted => (
            "Application Accepted",
            format!("Congratulations! Your application for {title} at {company} has been accepted."),
        ),
        ApplicationStatus::Rejected => (
            "Application Not Selected",
            format!("Your application for {title} at {company} was not selected this time."),
        ),
        ApplicationStatus::Pending => (
            "Application Status Updated",
            format!("The status of your application for {title} is now {new_status}."),
        ),
    };

    Rendered {
        title: heading.to_string(),
        message,
    }
}

pub fn applicant_milestone(internship: &InternshipSummary, applicants: u32) -> Rendered {
    Rendered {
        title: "Applicant Milestone".to_string(),
        message: format!("{} has reached {applicants} applicants.", internship.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::internships::domain::{InternshipId, UserId};

    fn summary() -> InternshipSummary {
        InternshipSummary {
            id: InternshipId("int-7".to_string()),
            title: "Data Intern".to_string(),
            company: "Globex".to_string(),
            posted_by: UserId("globex".to_string()),
        }
    }

    #[test]
    fn interview_copy_mentions_interview() {
        let rendered = status_change(&summary(), ApplicationStatus::Interview);
        assert!(rendered.title.contains("Interview"));
        assert!(rendered.message.contains("Globex"));
    }

    #[test]
    fn pending_falls_back_to_generic_copy() {
        let rendered = status_change(&summary(), ApplicationStatus::Pending);
        assert_eq!(rendered.title, "Application Status Updated");
        assert!(rendered.message.ends_with("is now pending."));
    }

    #[test]
    fn milestones_are_sparse() {
        assert!(is_applicant_milestone(5));
        assert!(is_applicant_milestone(100));
        assert!(!is_applicant_milestone(1));
        assert!(!is_applicant_milestone(6));
    }
}
