use crate::workflows::marriage::domain::{Actor, RegistrationStatus, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("role '{}' may not {action}", role.label())]
    Role { action: &'static str, role: Role },
    #[error("only the officiant assigned to this registration may review it")]
    NotAssignedOfficiant,
    #[error("only the applicant who submitted this registration may {action}")]
    NotOwner { action: &'static str },
    #[error("status '{target}' can only be set through officiant assignment")]
    AssignmentOnly { target: RegistrationStatus },
}

pub(super) const OFFICE: [Role; 2] = [Role::Staff, Role::HeadOfOffice];
pub(super) const HEAD_OF_OFFICE: [Role; 1] = [Role::HeadOfOffice];
pub(super) const OVERRIDE: [Role; 3] = [Role::Staff, Role::Officiant, Role::HeadOfOffice];

pub(super) fn require_role(
    actor: &Actor,
    allowed: &[Role],
    action: &'static str,
) -> Result<(), AccessDenied> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AccessDenied::Role {
            action,
            role: actor.role,
        })
    }
}
