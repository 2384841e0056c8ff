pub mod internships;
pub mod notifications;
