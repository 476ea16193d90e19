// Authorization engine - pure role- and ownership-based access decisions.
// Never touches the store and never fails; callers translate a denial into
// the right user-facing error.

use crate::core::types::UserId;
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// The authenticated identity performing an action, with its role already
/// resolved by the transport layer. The engines trust this and never
/// re-validate credentials.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// What the actor is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Delete,
    Moderate,
    Unlike,
}

/// The thing being acted on, with just enough context to decide.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef {
    User { id: UserId, role: Role },
    Post { owner: UserId },
    Like { owner: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Self-targeting through an endpoint meant for managing others.
    /// Rejected before any role rule, including for owners.
    SelfAction,
    /// Only another owner may act on an owner-tier account.
    TargetIsOwner,
    PermissionDenied,
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// Rules, in order: self-targeting a user-tier resource is always denied;
/// an owner may do anything else; an owner-tier target is off limits to
/// non-owners; admins may delete/moderate user-tier accounts; post and
/// like ownership grants delete/unlike on one's own resource. Moderation
/// of content requires admin or above regardless of ownership.
pub fn authorize(actor: &Actor, resource: ResourceRef, action: ActionKind) -> Decision {
    match resource {
        ResourceRef::User { id, role } => {
            if id == actor.id {
                return Decision::Deny(DenyReason::SelfAction);
            }
            if actor.role == Role::Owner {
                return Decision::Allow;
            }
            if role == Role::Owner {
                return Decision::Deny(DenyReason::TargetIsOwner);
            }
            match (actor.role, action) {
                (Role::Admin, ActionKind::Delete | ActionKind::Moderate) => Decision::Allow,
                _ => Decision::Deny(DenyReason::PermissionDenied),
            }
        }
        ResourceRef::Post { owner } => {
            if actor.role >= Role::Admin {
                return Decision::Allow;
            }
            if owner == actor.id && action == ActionKind::Delete {
                return Decision::Allow;
            }
            Decision::Deny(DenyReason::PermissionDenied)
        }
        ResourceRef::Like { owner } => {
            if actor.role >= Role::Admin {
                return Decision::Allow;
            }
            if owner == actor.id && action == ActionKind::Unlike {
                return Decision::Allow;
            }
            Decision::Deny(DenyReason::PermissionDenied)
        }
    }
}

impl DenyReason {
    /// Error for this denial; `verb` names the attempted action in
    /// user-facing messages ("deactivate", "delete this post", ...).
    pub fn into_error(self, verb: &str) -> AppError {
        match self {
            DenyReason::SelfAction => {
                AppError::SelfReference(format!("Cannot {verb} your own account"))
            }
            DenyReason::TargetIsOwner => {
                AppError::Forbidden(format!("Only the owner can {verb} an owner account"))
            }
            DenyReason::PermissionDenied => {
                AppError::Forbidden(format!("Not authorized to {verb}"))
            }
        }
    }
}

/// `authorize`, with denials converted into errors.
pub fn ensure(actor: &Actor, resource: ResourceRef, action: ActionKind, verb: &str) -> AppResult<()> {
    match authorize(actor, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(reason.into_error(verb)),
    }
}
