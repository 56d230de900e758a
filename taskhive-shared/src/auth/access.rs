/// Project authorization
///
/// One function, [`effective_role`], answers "what is this user to this
/// project": owner, admin member, plain member, or nothing. Every
/// authorization site in the system derives its answer from this value so
/// the owner special case lives in exactly one place. Results are computed
/// from current rows on every call; nothing is cached across requests.
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::MemberRole;

/// A user's effective standing toward a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveRole {
    /// No relationship, or the project does not exist
    None,

    /// Membership row with role = member
    Member,

    /// Membership row with role = admin
    Admin,

    /// The project's owner; never has a membership row and outranks admin
    Owner,
}

impl EffectiveRole {
    /// The owner-or-member predicate guarding task and project reads
    pub fn has_access(&self) -> bool {
        !matches!(self, EffectiveRole::None)
    }

    /// Whether this standing may send invitations
    pub fn can_invite(&self) -> bool {
        matches!(self, EffectiveRole::Admin | EffectiveRole::Owner)
    }
}

/// Computes the acting user's effective role for a project
///
/// A missing project yields `EffectiveRole::None`, indistinguishable from
/// having no access; callers that must treat "project absent" differently
/// resolve the project first.
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn effective_role(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<EffectiveRole, sqlx::Error> {
    let row: Option<(bool, Option<MemberRole>)> = sqlx::query_as(
        r#"
        SELECT p.owner_id = $2, m.role
        FROM projects p
        LEFT JOIN project_members m
            ON m.project_id = p.id AND m.user_id = $2
        WHERE p.id = $1
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(role_from_row(row))
}

/// True iff the user is the project's owner or has any membership row
///
/// The single source of truth for "can this user see or touch this
/// project's tasks".
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn authorize_access(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    Ok(effective_role(pool, project_id, user_id).await?.has_access())
}

fn role_from_row(row: Option<(bool, Option<MemberRole>)>) -> EffectiveRole {
    match row {
        None => EffectiveRole::None,
        Some((true, _)) => EffectiveRole::Owner,
        Some((false, Some(MemberRole::Admin))) => EffectiveRole::Admin,
        Some((false, Some(MemberRole::Member))) => EffectiveRole::Member,
        Some((false, None)) => EffectiveRole::None,
    }
}
