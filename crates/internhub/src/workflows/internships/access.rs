use super::domain::{Caller, Internship, Role};

/// Operations guarded by the role/ownership predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Apply,
    PostInternship,
    ManagePosting,
    ManageOwnProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("only {required} accounts may perform this action")]
    Role { required: &'static str },
    #[error("only the company that posted this internship may perform this action")]
    NotOwner,
}

/// Single authorization predicate applied by every service entry point.
///
/// `ManagePosting` needs the posting; a missing one is treated as not owned.
pub fn authorize(
    caller: &Caller,
    permission: Permission,
    posting: Option<&Internship>,
) -> Result<(), AccessDenied> {
    let required = match permission {
        Permission::Apply | Permission::ManageOwnProfile => Role::Student,
        Permission::PostInternship | Permission::ManagePosting => Role::Company,
    };

    if caller.role != required {
        return Err(AccessDenied::Role {
            required: required.label(),
        });
    }

    if permission == Permission::ManagePosting {
        match posting {
            Some(posting) if posting.is_owned_by(&caller.user_id) => {}
            _ => return Err(AccessDenied::NotOwner),
        }
    }

    Ok(())
}
