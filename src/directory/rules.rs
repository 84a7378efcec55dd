//! Access rules the directory enforces on every write.
//!
//! These run inside the directory, after the session has been verified,
//! so a client that skips its own checks still cannot:
//! - change roles without being an Admin
//! - demote itself from Admin
//! - demote any Admin at all (that is an out-of-band operation)
//! - edit someone else's profile
//! - write a review in someone else's name, or modify a stored review

use super::{Document, REVIEWS, USERS};
use crate::model::Role;

/// Profile field holding the user's role.
const ROLE_FIELD: &str = "role";

/// Kind of write being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// Verified identity performing a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

/// Reason a write was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Only an Admin can change roles.")]
    NotAdmin,

    #[error("You cannot remove your own Admin role.")]
    SelfDemotion,

    #[error("Admin roles can only be changed out of band.")]
    AdminImmutable,

    #[error("Users may only edit their own profile.")]
    NotOwner,

    #[error("New profiles start with the Regular role.")]
    RoleOnCreate,

    #[error("Invalid role value: {0}")]
    InvalidRole(String),

    #[error("Reviews must be written by their author.")]
    NotAuthor,

    #[error("Reviews cannot be modified or deleted.")]
    ReviewImmutable,

    #[error("No write access to collection {0}.")]
    UnknownCollection(String),
}

/// Role transition check shared by the directory and the admin console.
pub fn check_role_change(
    actor: &Actor,
    target_id: &str,
    current: Role,
    requested: Role,
) -> Result<(), Denial> {
    if actor.role != Role::Admin {
        return Err(Denial::NotAdmin);
    }
    if target_id == actor.user_id && requested != Role::Admin {
        return Err(Denial::SelfDemotion);
    }
    if current == Role::Admin && requested != Role::Admin {
        return Err(Denial::AdminImmutable);
    }
    Ok(())
}

/// Decide whether `actor` may apply `op` with `fields` to `collection/id`.
///
/// `current` is the stored document, if any.
pub fn check_write(
    actor: &Actor,
    collection: &str,
    id: &str,
    op: WriteOp,
    current: Option<&Document>,
    fields: &Document,
) -> Result<(), Denial> {
    match collection {
        USERS => check_user_write(actor, id, op, current, fields),
        REVIEWS => check_review_write(actor, op, fields),
        other => Err(Denial::UnknownCollection(other.to_string())),
    }
}

fn check_user_write(
    actor: &Actor,
    id: &str,
    op: WriteOp,
    current: Option<&Document>,
    fields: &Document,
) -> Result<(), Denial> {
    let is_owner = actor.user_id == id;

    match op {
        WriteOp::Delete => {
            if is_owner {
                Ok(())
            } else {
                Err(Denial::NotOwner)
            }
        }
        WriteOp::Create => {
            if !is_owner {
                return Err(Denial::NotOwner);
            }
            match fields.get(ROLE_FIELD) {
                None => Ok(()),
                Some(value) if parse_role(value)? == Role::Regular => Ok(()),
                Some(_) => Err(Denial::RoleOnCreate),
            }
        }
        WriteOp::Update => {
            let touches_profile = fields.keys().any(|k| k != ROLE_FIELD);
            if touches_profile && !is_owner {
                return Err(Denial::NotOwner);
            }

            let Some(value) = fields.get(ROLE_FIELD) else {
                return Ok(());
            };
            let requested = parse_role(value)?;
            let current_role = current
                .and_then(|doc| doc.get(ROLE_FIELD))
                .map(parse_role)
                .transpose()?
                .unwrap_or_default();

            if requested == current_role {
                return Ok(());
            }
            check_role_change(actor, id, current_role, requested)
        }
    }
}

fn check_review_write(actor: &Actor, op: WriteOp, fields: &Document) -> Result<(), Denial> {
    match op {
        WriteOp::Create => {
            let author = fields.get("userId").and_then(|v| v.as_str());
            if author == Some(actor.user_id.as_str()) {
                Ok(())
            } else {
                Err(Denial::NotAuthor)
            }
        }
        WriteOp::Update | WriteOp::Delete => Err(Denial::ReviewImmutable),
    }
}

fn parse_role(value: &serde_json::Value) -> Result<Role, Denial> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Denial::InvalidRole(value.to_string()))
}
