/// Project membership model and database operations
///
/// A membership row links a user to a project with a role. Rows are created
/// exclusively by accepting an invitation; the project owner never has a row
/// here and is special-cased as admin-equivalent by
/// [`crate::auth::access::effective_role`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('member', 'admin');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::access;
use crate::models::user::UserSummary;

/// Roles a member can hold within a project
///
/// Admin members may invite others; plain members may not. Both may read
/// and mutate the project's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Can read and mutate tasks
    Member,

    /// Member privileges plus inviting users
    Admin,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }

    /// Whether this role may send invitations
    pub fn can_invite(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

/// Membership row linking a user to a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Row ID
    pub id: Uuid,

    /// Project the membership belongs to
    pub project_id: Uuid,

    /// The member
    pub user_id: Uuid,

    /// Role within the project
    pub role: MemberRole,

    /// When the invitation was accepted
    pub joined_at: DateTime<Utc>,
}

/// One entry of a member listing
///
/// The owner appears as a synthesized first entry: no membership row id,
/// admin role, `joined_at` equal to the project's creation time, and
/// `is_owner` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    /// Membership row ID; None for the synthesized owner entry
    pub id: Option<Uuid>,
    pub user: UserSummary,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub is_owner: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberEntryRow {
    id: Uuid,
    role: MemberRole,
    joined_at: DateTime<Utc>,
    user_id: Uuid,
    email: String,
    display_name: String,
    avatar_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct OwnerEntryRow {
    project_created_at: DateTime<Utc>,
    user_id: Uuid,
    email: String,
    display_name: String,
    avatar_url: Option<String>,
}

impl ProjectMember {
    /// Checks whether a user has a membership row for a project (any role)
    ///
    /// This is membership only; it does not treat the owner specially. Use
    /// [`crate::auth::access::authorize_access`] for the owner-or-member
    /// predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn exists(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists a project's members for a caller
    ///
    /// Requires owner-or-member access; unauthorized callers get an empty
    /// list, indistinguishable from a project they cannot see. The owner is
    /// prepended as a synthesized admin entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MemberEntry>, sqlx::Error> {
        if !access::authorize_access(pool, project_id, user_id).await? {
            return Ok(Vec::new());
        }

        let owner = sqlx::query_as::<_, OwnerEntryRow>(
            r#"
            SELECT p.created_at AS project_created_at,
                   u.id AS user_id, u.email, u.display_name, u.avatar_url
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

        let rows = sqlx::query_as::<_, MemberEntryRow>(
            r#"
            SELECT m.id, m.role, m.joined_at,
                   u.id AS user_id, u.email, u.display_name, u.avatar_url
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len() + 1);

        if let Some(owner) = owner {
            entries.push(MemberEntry {
                id: None,
                user: UserSummary {
                    id: owner.user_id,
                    email: owner.email,
                    display_name: owner.display_name,
                    avatar_url: owner.avatar_url,
                },
                // The owner holds no membership row; admin-equivalent
                role: MemberRole::Admin,
                joined_at: owner.project_created_at,
                is_owner: true,
            });
        }

        for row in rows {
            entries.push(MemberEntry {
                id: Some(row.id),
                user: UserSummary {
                    id: row.user_id,
                    email: row.email,
                    display_name: row.display_name,
                    avatar_url: row.avatar_url,
                },
                role: row.role,
                joined_at: row.joined_at,
                is_owner: false,
            });
        }

        Ok(entries)
    }
}
