use crate::infra::{demo_account, seed_demo, Platform};
use clap::Args;
use internhub::error::AppError;
use internhub::workflows::internships::{
    ApplicationRequest, ApplicationServiceError, ApplicationView, ApplyReceipt, Caller,
    MirroredApplication, NewInternship, PostingView, ReconciliationReport, Role, StatusView,
    WorkType,
};
use internhub::workflows::notifications::{InboxKey, Notification};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Total applicants to put on the demo posting (5 triggers a milestone notice)
    #[arg(long, default_value_t = 5)]
    pub(crate) applicants: u32,
    /// Jump straight to `interview` with a forced status change
    #[arg(long)]
    pub(crate) force: bool,
    /// Inbox retention used for the walkthrough
    #[arg(long, default_value_t = 50)]
    pub(crate) retention: usize,
}

#[derive(Args, Debug)]
pub(crate) struct ReconcileArgs {
    /// Applications to create before the reconciliation pass
    #[arg(long, default_value_t = 3)]
    pub(crate) applicants: u32,
}

pub(crate) struct DemoOutcome {
    pub(crate) posting: PostingView,
    pub(crate) receipt: ApplyReceipt,
    pub(crate) duplicate: Option<String>,
    pub(crate) transitions: Vec<StatusView>,
    pub(crate) applications: Vec<ApplicationView>,
    pub(crate) mirror: Vec<MirroredApplication>,
    pub(crate) student_inbox: Vec<Notification>,
    pub(crate) company_inbox: Vec<Notification>,
}

pub(crate) fn demo_posting() -> NewInternship {
    NewInternship {
        title: "Robotics Software Intern".to_string(),
        description: "Motion planning and firmware tooling for warehouse robots.".to_string(),
        location: "Porto".to_string(),
        duration: "4 months".to_string(),
        stipend: 1200.0,
        work_type: WorkType::Hybrid,
        category: "engineering".to_string(),
        tags: vec!["rust".to_string(), "robotics".to_string()],
        requirements: vec!["Comfortable with async Rust".to_string()],
        responsibilities: vec!["Own a small planner component".to_string()],
    }
}

/// Fill the demo posting with the seeded student plus anonymous applicants.
fn populate(
    platform: &Platform,
    applicants: u32,
) -> Result<(PostingView, ApplyReceipt), ApplicationServiceError> {
    let company = demo_account(Role::Company).caller();
    let student = demo_account(Role::Student).caller();

    let posting = platform
        .service
        .create_internship(&company, demo_posting())?;
    let receipt = platform.service.apply(
        &student,
        &posting.id,
        ApplicationRequest {
            resume: Some("https://files.demo.internhub.test/ada-cv.pdf".to_string()),
            cover_letter: Some("I build small robots on weekends.".to_string()),
        },
    )?;

    for n in 1..applicants.max(1) {
        platform.service.apply(
            &Caller::student(format!("student-walkin-{n:02}")),
            &posting.id,
            ApplicationRequest::default(),
        )?;
    }

    Ok((posting, receipt))
}

pub(crate) fn walkthrough(args: &DemoArgs) -> Result<DemoOutcome, AppError> {
    let platform = Platform::in_memory(args.retention);
    seed_demo(&platform)?;
    let company = demo_account(Role::Company).caller();
    let student = demo_account(Role::Student).caller();

    let (posting, receipt) = populate(&platform, args.applicants)?;

    let duplicate = match platform
        .service
        .apply(&student, &posting.id, ApplicationRequest::default())
    {
        Err(err @ ApplicationServiceError::DuplicateApplication) => Some(err.to_string()),
        Err(err) => return Err(err.into()),
        Ok(_) => None,
    };

    let transitions = if args.force {
        vec![platform.service.force_status(
            &company,
            &posting.id,
            &receipt.application_id,
            "interview",
        )?]
    } else {
        ["reviewing", "interview"]
            .into_iter()
            .map(|status| {
                platform
                    .service
                    .update_status(&company, &posting.id, &receipt.application_id, status)
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let applications = platform.service.list_applications(&company, &posting.id)?;
    let mirror = platform.service.my_applications(&student)?;
    let posting = platform.service.get_internship(&posting.id)?;

    // inbox reads only fail on store outages; the demo store never has one
    let student_inbox = platform
        .notifications
        .list(&InboxKey::student(&student.user_id))
        .unwrap_or_default();
    let company_inbox = platform
        .notifications
        .list(&InboxKey::company(&company.user_id))
        .unwrap_or_default();

    Ok(DemoOutcome {
        posting,
        receipt,
        duplicate,
        transitions,
        applications,
        mirror,
        student_inbox,
        company_inbox,
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let outcome = walkthrough(&args)?;

    println!("== Posting ==");
    println!(
        "  {} at {} ({}, stipend {:.0})",
        outcome.posting.title, outcome.posting.company, outcome.posting.location, outcome.posting.stipend
    );
    println!("  Applicants: {}", outcome.posting.applicants);

    println!();
    println!("== Application ==");
    println!(
        "  {} submitted; applicant #{}",
        outcome.receipt.application_id.0, outcome.receipt.applicants
    );
    match &outcome.duplicate {
        Some(reason) => println!("  Second apply rejected: {reason}"),
        None => println!("  Second apply was unexpectedly accepted"),
    }

    println!();
    println!("== Status changes ==");
    for view in &outcome.transitions {
        println!("  {} -> {}", view.previous_status, view.status);
    }

    println!();
    println!("== Company view ==");
    for application in &outcome.applications {
        let who = application
            .student
            .as_ref()
            .map(|student| student.name.as_str())
            .unwrap_or("unregistered applicant");
        println!("  {} [{}] {}", application.id.0, application.status, who);
    }

    println!();
    println!("== Student mirror ==");
    for mirrored in &outcome.mirror {
        println!("  {} -> {}", mirrored.internship.0, mirrored.status);
    }

    print_inbox("Student inbox", &outcome.student_inbox);
    print_inbox("Company inbox", &outcome.company_inbox);

    Ok(())
}

fn print_inbox(heading: &str, inbox: &[Notification]) {
    println!();
    let unread = inbox.iter().filter(|notification| !notification.read).count();
    println!("== {heading} ({unread} unread) ==");
    for notification in inbox {
        println!(
            "  [{}] {}: {}",
            notification.kind.label(),
            notification.title,
            notification.message
        );
    }
}

pub(crate) fn reconcile_demo(args: &ReconcileArgs) -> Result<ReconciliationReport, AppError> {
    let platform = Platform::in_memory(50);
    seed_demo(&platform)?;
    populate(&platform, args.applicants)?;
    Ok(platform.service.reconcile()?)
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let report = reconcile_demo(&args)?;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Reconciliation report unavailable: {err}"),
    }
    Ok(())
}
