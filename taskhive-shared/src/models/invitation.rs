/// Invitation model and lifecycle
///
/// Invitations move `pending -> accepted` or `pending -> declined`; both end
/// states are terminal. At most one pending invitation may exist per
/// (project, invited user) pair, enforced here by a pre-check and at the
/// database by a partial unique index, so the check-then-insert race
/// collapses to the same rejection.
///
/// Accepting writes the membership row and the status flip in one
/// transaction; a replayed or foreign accept matches no pending row and
/// returns false without side effects.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'declined');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     invited_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invited_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     responded_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX idx_invitations_one_pending
///     ON invitations (project_id, invited_user_id)
///     WHERE status = 'pending';
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::access;
use crate::models::membership::{MemberRole, ProjectMember};
use crate::models::project::Project;
use crate::models::user::{User, UserSummary};

/// Invitation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Awaiting a response from the invited user
    Pending,

    /// Accepted; a membership row exists (terminal)
    Accepted,

    /// Declined; no membership was created (terminal)
    Declined,
}

/// Invitation row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by_id: Uuid,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,

    /// Set exactly once, when the invitation is accepted or declined
    pub responded_at: Option<DateTime<Utc>>,
}

/// Invitation enriched for client payloads with project display fields and
/// both user summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationDetails {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub project_color: String,
    pub invited_user: UserSummary,
    pub invited_by: UserSummary,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// Rejections of the invite workflow
///
/// Message text is part of the API contract; clients display it verbatim.
#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Project not found")]
    ProjectNotFound,

    #[error("You don't have permission to invite users to this project")]
    NotPermitted,

    #[error("User with this email not found")]
    UserNotFound,

    #[error("User is the project owner")]
    UserIsOwner,

    #[error("User is already a member of this project")]
    AlreadyMember,

    #[error("User already has a pending invitation")]
    AlreadyPending,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct PendingRow {
    id: Uuid,
    project_id: Uuid,
    project_name: String,
    project_color: String,
    status: InvitationStatus,
    created_at: DateTime<Utc>,
    iu_id: Uuid,
    iu_email: String,
    iu_display_name: String,
    iu_avatar_url: Option<String>,
    ib_id: Uuid,
    ib_email: String,
    ib_display_name: String,
    ib_avatar_url: Option<String>,
}

impl From<PendingRow> for InvitationDetails {
    fn from(row: PendingRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            project_name: row.project_name,
            project_color: row.project_color,
            invited_user: UserSummary {
                id: row.iu_id,
                email: row.iu_email,
                display_name: row.iu_display_name,
                avatar_url: row.iu_avatar_url,
            },
            invited_by: UserSummary {
                id: row.ib_id,
                email: row.ib_email,
                display_name: row.ib_display_name,
                avatar_url: row.ib_avatar_url,
            },
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl Invitation {
    /// Invites a registered user to a project by email
    ///
    /// Guards, in order: the project must exist; the inviter must be its
    /// owner or an admin member; the email must belong to a registered user
    /// who is neither the owner, nor a member, nor already holding a
    /// pending invitation. Each rejection carries its client-facing message.
    ///
    /// # Errors
    ///
    /// Returns an [`InviteError`] naming the failed guard, or
    /// `InviteError::Database` for connection failures.
    pub async fn invite(
        pool: &PgPool,
        project_id: Uuid,
        email: &str,
        inviter_id: Uuid,
    ) -> Result<InvitationDetails, InviteError> {
        let project = Project::find_by_id(pool, project_id)
            .await?
            .ok_or(InviteError::ProjectNotFound)?;

        let role = access::effective_role(pool, project_id, inviter_id).await?;
        if !role.can_invite() {
            return Err(InviteError::NotPermitted);
        }

        let invited = User::find_by_email(pool, email)
            .await?
            .ok_or(InviteError::UserNotFound)?;

        if project.owner_id == invited.id {
            return Err(InviteError::UserIsOwner);
        }

        if ProjectMember::exists(pool, project_id, invited.id).await? {
            return Err(InviteError::AlreadyMember);
        }

        let pending_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM invitations
                WHERE project_id = $1 AND invited_user_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(project_id)
        .bind(invited.id)
        .fetch_one(pool)
        .await?;

        if pending_exists {
            return Err(InviteError::AlreadyPending);
        }

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (project_id, invited_user_id, invited_by_id)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, invited_user_id, invited_by_id, status,
                      created_at, responded_at
            "#,
        )
        .bind(project_id)
        .bind(invited.id)
        .bind(inviter_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            // Lost a concurrent-invite race against the partial unique index
            sqlx::Error::Database(db) if db.is_unique_violation() => InviteError::AlreadyPending,
            _ => InviteError::Database(e),
        })?;

        let inviter = User::find_by_id(pool, inviter_id)
            .await?
            .ok_or(InviteError::Database(sqlx::Error::RowNotFound))?;

        tracing::info!(
            invitation_id = %invitation.id,
            project_id = %project_id,
            invited_user_id = %invited.id,
            "Invitation sent"
        );

        Ok(InvitationDetails {
            id: invitation.id,
            project_id,
            project_name: project.name,
            project_color: project.color,
            invited_user: invited.summary(),
            invited_by: inviter.summary(),
            status: invitation.status,
            created_at: invitation.created_at,
        })
    }

    /// Lists a user's pending invitations, newest first, enriched for display
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn list_pending_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<InvitationDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT i.id, i.project_id, p.name AS project_name, p.color AS project_color,
                   i.status, i.created_at,
                   iu.id AS iu_id, iu.email AS iu_email,
                   iu.display_name AS iu_display_name, iu.avatar_url AS iu_avatar_url,
                   ib.id AS ib_id, ib.email AS ib_email,
                   ib.display_name AS ib_display_name, ib.avatar_url AS ib_avatar_url
            FROM invitations i
            JOIN projects p ON p.id = i.project_id
            JOIN users iu ON iu.id = i.invited_user_id
            JOIN users ib ON ib.id = i.invited_by_id
            WHERE i.invited_user_id = $1 AND i.status = 'pending'
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(InvitationDetails::from).collect())
    }

    /// Accepts an invitation, creating the membership
    ///
    /// Returns false when the invitation does not exist, belongs to another
    /// user, or is no longer pending; nothing is written in that case. On
    /// success the status flip and the membership insert commit together.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn accept(
        pool: &PgPool,
        invitation_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE invitations
            SET status = 'accepted', responded_at = NOW()
            WHERE id = $1 AND invited_user_id = $2 AND status = 'pending'
            RETURNING project_id
            "#,
        )
        .bind(invitation_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(project_id) = project_id else {
            // Not pending or not theirs; dropping the transaction rolls back
            return Ok(false);
        };

        // ON CONFLICT guards the invariant that a pair never gets two rows,
        // even if an out-of-band membership appeared since the invite.
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(MemberRole::Member)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation_id,
            project_id = %project_id,
            user_id = %user_id,
            "Invitation accepted"
        );

        Ok(true)
    }

    /// Declines an invitation
    ///
    /// Same preconditions as [`Invitation::accept`]; flips the status and
    /// stamps `responded_at`, creating no membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn decline(
        pool: &PgPool,
        invitation_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'declined', responded_at = NOW()
            WHERE id = $1 AND invited_user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(invitation_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
