/// Integration tests for the Taskhive API
///
/// These tests verify the full system works end-to-end:
/// - Login (identity token -> session token) and session enforcement
/// - Project CRUD with owner/member authorization
/// - Invitation lifecycle (send, accept, decline, terminality)
/// - Task ordering, status side effects, bulk reorder
/// - Realtime fan-out over the WebSocket feed
///
/// All tests require a running PostgreSQL reachable via `DATABASE_URL` and
/// are marked `#[ignore]`; run them with `cargo test -- --ignored`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tower::Service as _;
use uuid::Uuid;

/// Builds a request with optional authorization and JSON body
fn api_request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(header) = auth {
        builder = builder.header("authorization", header);
    }

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends a request through the router, returning status and parsed body
async fn call(ctx: &TestContext, request: Request<Body>) -> (StatusCode, Value) {
    let response = ctx.app.clone().call(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

/// Creates a project through the API and returns its body
async fn create_project(ctx: &TestContext, name: &str) -> Value {
    let (status, body) = call(
        ctx,
        api_request(
            "POST",
            "/api/projects",
            Some(&ctx.auth_header()),
            Some(json!({ "name": name })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create project: {body}");
    body
}

/// Creates a task through the API and returns its body
async fn create_task(ctx: &TestContext, project_id: &str, title: &str) -> Value {
    let (status, body) = call(
        ctx,
        api_request(
            "POST",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&ctx.auth_header()),
            Some(json!({ "title": title })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create task: {body}");
    body
}

/// Test the login exchange and that the issued session works
#[tokio::test]
#[ignore]
async fn test_login_exchanges_identity_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "token": common::IDENTITY_TOKEN })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login: {body}");
    assert!(body["token"].is_string());
    assert!(body["expires_at"].is_string());
    // The verifier vouches for the same identity the context registered,
    // so login resolves to the existing user instead of creating one
    assert_eq!(body["user"]["id"], ctx.user.id.to_string());

    // The fresh session token is accepted by guarded routes
    let fresh = format!("Bearer {}", body["token"].as_str().unwrap());
    let (status, me) = call(&ctx, api_request("GET", "/api/users/me", Some(&fresh), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ctx.user.email);

    ctx.cleanup().await.unwrap();
}

/// Test that unknown identity tokens are rejected
#[tokio::test]
#[ignore]
async fn test_login_rejects_unknown_identity_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "token": "not-a-real-token" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Invalid or expired token");

    ctx.cleanup().await.unwrap();
}

/// Test session enforcement on guarded routes
#[tokio::test]
#[ignore]
async fn test_requests_require_session() {
    let ctx = TestContext::new().await.unwrap();

    // No header at all
    let (status, _) = call(&ctx, api_request("GET", "/api/projects", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage bearer token
    let (status, _) = call(
        &ctx,
        api_request("GET", "/api/projects", Some("Bearer garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let (status, _) = call(
        &ctx,
        api_request("GET", "/api/projects", Some("Basic dXNlcjpwdw=="), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Test project create/read/update/delete through the API
#[tokio::test]
#[ignore]
async fn test_project_crud_roundtrip() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Website redesign").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    assert_eq!(project["name"], "Website redesign");
    assert_eq!(project["color"], "#3b82f6");
    assert_eq!(project["icon"], "folder");
    assert_eq!(project["is_owner"], true);
    assert_eq!(project["owner"]["id"], ctx.user.id.to_string());
    assert_eq!(project["task_count"], 0);

    // Shows up in the list
    let (status, list) = call(
        &ctx,
        api_request("GET", "/api/projects", Some(&ctx.auth_header()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["id"] == project_id.as_str()));

    // Rename
    let (status, updated) = call(
        &ctx,
        api_request(
            "PUT",
            &format!("/api/projects/{project_id}"),
            Some(&ctx.auth_header()),
            Some(json!({ "name": "Relaunch" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Relaunch");
    assert_eq!(updated["color"], "#3b82f6");

    // Delete, then reads collapse to 404
    let (status, _) = call(
        &ctx,
        api_request(
            "DELETE",
            &format!("/api/projects/{project_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    ctx.cleanup().await.unwrap();
}

/// Test that archiving hides a project from the list but not from direct reads
#[tokio::test]
#[ignore]
async fn test_archived_projects_leave_the_list() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Old initiative").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let (status, archived) = call(
        &ctx,
        api_request(
            "PUT",
            &format!("/api/projects/{project_id}"),
            Some(&ctx.auth_header()),
            Some(json!({ "is_archived": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["is_archived"], true);

    let (_, list) = call(
        &ctx,
        api_request("GET", "/api/projects", Some(&ctx.auth_header()), None),
    )
    .await;
    assert!(!list
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["id"] == project_id.as_str()));

    // Direct read still works for the owner
    let (status, _) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

/// Test that outsiders see 404, never 403, for someone else's project
#[tokio::test]
#[ignore]
async fn test_project_access_collapses_to_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let (outsider, outsider_token) = ctx.register_user("outsider").await.unwrap();
    let outsider_auth = format!("Bearer {outsider_token}");

    let project = create_project(&ctx, "Private roadmap").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let uri = format!("/api/projects/{project_id}");

    let (status, body) = call(&ctx, api_request("GET", &uri, Some(&outsider_auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    let (status, _) = call(
        &ctx,
        api_request(
            "PUT",
            &uri,
            Some(&outsider_auth),
            Some(json!({ "name": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&ctx, api_request("DELETE", &uri, Some(&outsider_auth), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
    ctx.delete_user(outsider.id).await.unwrap();
}

/// Test the invitation happy path end-to-end
#[tokio::test]
#[ignore]
async fn test_invitation_happy_path() {
    let ctx = TestContext::new().await.unwrap();
    let (invitee, invitee_token) = ctx.register_user("invitee").await.unwrap();
    let invitee_auth = format!("Bearer {invitee_token}");

    let project = create_project(&ctx, "Shared board").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // Owner sends the invitation
    let (status, invitation) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/projects/{project_id}/invitations"),
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "invite: {invitation}");
    assert_eq!(invitation["status"], "pending");
    assert_eq!(invitation["invited_user"]["id"], invitee.id.to_string());
    let invitation_id = invitation["id"].as_str().unwrap().to_string();

    // Invitee sees it pending
    let (status, pending) = call(
        &ctx,
        api_request("GET", "/api/invitations", Some(&invitee_auth), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(pending
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["id"] == invitation_id.as_str()));

    // Accept
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/invitations/{invitation_id}/accept"),
            Some(&invitee_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invitation accepted");

    // Membership grants project access
    let (status, seen) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}"),
            Some(&invitee_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["is_owner"], false);

    // Member list: synthesized owner entry first, then the new member
    let (status, members) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}/members"),
            Some(&invitee_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["is_owner"], true);
    assert_eq!(members[0]["role"], "admin");
    assert_eq!(members[0]["user"]["id"], ctx.user.id.to_string());
    assert_eq!(members[1]["is_owner"], false);
    assert_eq!(members[1]["role"], "member");
    assert_eq!(members[1]["user"]["id"], invitee.id.to_string());

    ctx.cleanup().await.unwrap();
    ctx.delete_user(invitee.id).await.unwrap();
}

/// Test every invite rejection and its status code
#[tokio::test]
#[ignore]
async fn test_invitation_rejections() {
    let ctx = TestContext::new().await.unwrap();
    let (invitee, invitee_token) = ctx.register_user("invitee").await.unwrap();
    let invitee_auth = format!("Bearer {invitee_token}");

    let project = create_project(&ctx, "Guarded board").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let invite_uri = format!("/api/projects/{project_id}/invitations");

    // Unknown email
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": "nobody@example.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User with this email not found");

    // Inviting the owner
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": ctx.user.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is the project owner");

    // Duplicate while one is pending
    let (status, _) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already has a pending invitation");

    // Accept, then inviting again is a member rejection
    let (_, pending) = call(
        &ctx,
        api_request("GET", "/api/invitations", Some(&invitee_auth), None),
    )
    .await;
    let invitation_id = pending[0]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/invitations/{invitation_id}/accept"),
            Some(&invitee_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already a member of this project");

    // Nonexistent project
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/projects/{}/invitations", Uuid::new_v4()),
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    ctx.cleanup().await.unwrap();
    ctx.delete_user(invitee.id).await.unwrap();
}

/// Test that responded invitations cannot be responded to again
#[tokio::test]
#[ignore]
async fn test_invitation_terminality() {
    let ctx = TestContext::new().await.unwrap();
    let (invitee, invitee_token) = ctx.register_user("invitee").await.unwrap();
    let invitee_auth = format!("Bearer {invitee_token}");

    let project = create_project(&ctx, "Revolving door").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let invite_uri = format!("/api/projects/{project_id}/invitations");

    let (_, invitation) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    let invitation_id = invitation["id"].as_str().unwrap().to_string();

    // Decline once
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/invitations/{invitation_id}/decline"),
            Some(&invitee_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invitation declined");

    // Any further response hits the terminal state
    for action in ["accept", "decline"] {
        let (status, body) = call(
            &ctx,
            api_request(
                "POST",
                &format!("/api/invitations/{invitation_id}/{action}"),
                Some(&invitee_auth),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invitation not found or already responded");
    }

    // A declined invitation does not block a fresh one
    let (status, _) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": invitee.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    ctx.cleanup().await.unwrap();
    ctx.delete_user(invitee.id).await.unwrap();
}

/// Test that only the owner or an admin member may invite
#[tokio::test]
#[ignore]
async fn test_invite_requires_admin_or_owner() {
    let ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.register_user("member").await.unwrap();
    let member_auth = format!("Bearer {member_token}");
    let (target, _) = ctx.register_user("target").await.unwrap();

    let project = create_project(&ctx, "Closed circle").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let invite_uri = format!("/api/projects/{project_id}/invitations");

    // Bring the member in
    let (_, invitation) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "email": member.email })),
        ),
    )
    .await;
    let invitation_id = invitation["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/invitations/{invitation_id}/accept"),
            Some(&member_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A plain member cannot invite
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &invite_uri,
            Some(&member_auth),
            Some(json!({ "email": target.email })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You don't have permission to invite users to this project"
    );

    ctx.cleanup().await.unwrap();
    ctx.delete_user(member.id).await.unwrap();
    ctx.delete_user(target.id).await.unwrap();
}

/// Test task creation ordering, status side effects, and partial updates
#[tokio::test]
#[ignore]
async fn test_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Sprint 12").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // Sequential creates take the next position each time
    let first = create_task(&ctx, &project_id, "Draft copy").await;
    let second = create_task(&ctx, &project_id, "Review copy").await;
    let third = create_task(&ctx, &project_id, "Publish").await;

    assert_eq!(first["sort_order"], 1);
    assert_eq!(second["sort_order"], 2);
    assert_eq!(third["sort_order"], 3);
    assert_eq!(first["status"], "todo");
    assert_eq!(first["priority"], "medium");
    assert!(first["completed_at"].is_null());
    assert_eq!(first["created_by"]["id"], ctx.user.id.to_string());

    let task_id = first["id"].as_str().unwrap().to_string();
    let task_uri = format!("/api/tasks/{task_id}");

    // Entering done stamps completed_at
    let (status, done) = call(
        &ctx,
        api_request(
            "PUT",
            &task_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "status": "done" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "done");
    assert!(done["completed_at"].is_string());

    // Leaving done clears it
    let (status, reopened) = call(
        &ctx,
        api_request(
            "PUT",
            &task_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "status": "in_progress" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "in_progress");
    assert!(reopened["completed_at"].is_null());

    // A title-only update leaves the rest alone
    let (status, renamed) = call(
        &ctx,
        api_request(
            "PUT",
            &task_uri,
            Some(&ctx.auth_header()),
            Some(json!({ "title": "Draft landing copy" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Draft landing copy");
    assert_eq!(renamed["status"], "in_progress");

    ctx.cleanup().await.unwrap();
}

/// Test bulk reorder rewrites positions
#[tokio::test]
#[ignore]
async fn test_reorder_tasks() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Backlog").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let a = create_task(&ctx, &project_id, "A").await;
    let b = create_task(&ctx, &project_id, "B").await;
    let c = create_task(&ctx, &project_id, "C").await;

    let (status, _) = call(
        &ctx,
        api_request(
            "PUT",
            "/api/tasks/reorder",
            Some(&ctx.auth_header()),
            Some(json!({
                "tasks": [
                    { "id": b["id"], "sort_order": 0 },
                    { "id": c["id"], "sort_order": 1 },
                    { "id": a["id"], "sort_order": 2 },
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["B", "C", "A"]);

    ctx.cleanup().await.unwrap();
}

/// Test that outsiders get empty lists and 404s for foreign tasks
#[tokio::test]
#[ignore]
async fn test_unauthorized_task_access() {
    let ctx = TestContext::new().await.unwrap();
    let (outsider, outsider_token) = ctx.register_user("outsider").await.unwrap();
    let outsider_auth = format!("Bearer {outsider_token}");

    let project = create_project(&ctx, "Hidden work").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let task = create_task(&ctx, &project_id, "Secret task").await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Listing yields an empty array, not an error
    let (status, list) = call(
        &ctx,
        api_request(
            "GET",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&outsider_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 0);

    // Creating into someone else's project reads as project-not-found
    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&outsider_auth),
            Some(json!({ "title": "Sneaky" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    // Updates and deletes collapse to task-not-found
    let (status, body) = call(
        &ctx,
        api_request(
            "PUT",
            &format!("/api/tasks/{task_id}"),
            Some(&outsider_auth),
            Some(json!({ "title": "Defaced" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    let (status, _) = call(
        &ctx,
        api_request(
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(&outsider_auth),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
    ctx.delete_user(outsider.id).await.unwrap();
}

/// Test task deletion and repeat-delete behavior
#[tokio::test]
#[ignore]
async fn test_task_delete() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Cleanup").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let task = create_task(&ctx, &project_id, "Ephemeral").await;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &ctx,
        api_request(
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(
        &ctx,
        api_request(
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");

    ctx.cleanup().await.unwrap();
}

/// Test that concurrent creates still take distinct consecutive positions
#[tokio::test]
#[ignore]
async fn test_concurrent_task_creation_orders_cleanly() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Rush hour").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let request_for = |title: &str| {
        api_request(
            "POST",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&ctx.auth_header()),
            Some(json!({ "title": title })),
        )
    };

    let (first, second, third) = tokio::join!(
        call(&ctx, request_for("One")),
        call(&ctx, request_for("Two")),
        call(&ctx, request_for("Three")),
    );

    let mut orders = Vec::new();
    for (status, body) in [first, second, third] {
        assert_eq!(status, StatusCode::CREATED, "concurrent create: {body}");
        orders.push(body["sort_order"].as_i64().unwrap());
    }
    orders.sort_unstable();
    assert_eq!(orders, vec![1, 2, 3]);

    ctx.cleanup().await.unwrap();
}

/// Test that validation failures come back as 400 with field details
#[tokio::test]
#[ignore]
async fn test_validation_errors_are_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            "/api/projects",
            Some(&ctx.auth_header()),
            Some(json!({ "name": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(!body["details"].as_array().unwrap().is_empty());

    let project = create_project(&ctx, "Valid project").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &ctx,
        api_request(
            "POST",
            &format!("/api/projects/{project_id}/tasks"),
            Some(&ctx.auth_header()),
            Some(json!({ "title": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    ctx.cleanup().await.unwrap();
}

/// Test the public health endpoint
#[tokio::test]
#[ignore]
async fn test_health_endpoint() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(&ctx, api_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["timestamp"].is_string());

    ctx.cleanup().await.unwrap();
}

/// Test the WebSocket feed end-to-end: join, receive fan-out, refusals
#[tokio::test]
#[ignore]
async fn test_realtime_feed_delivers_task_events() {
    let ctx = TestContext::new().await.unwrap();

    let project = create_project(&ctx, "Live board").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    let project_uuid: Uuid = project_id.parse().unwrap();

    // Serve the same router (same hub) on an ephemeral port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = ctx.app.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // A bad token is refused during the handshake
    let refused = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/tasks?token=garbage"))
        .await;
    assert!(refused.is_err());

    let (mut socket, _) = tokio_tungstenite::connect_async(format!(
        "ws://{addr}/ws/tasks?token={}",
        ctx.session_token
    ))
    .await
    .unwrap();

    // Joining a project the user cannot see is refused with an error frame
    socket
        .send(Message::Text(
            json!({ "action": "join", "project_id": Uuid::new_v4() }).to_string(),
        ))
        .await
        .unwrap();

    let frame = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let error: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(error["error"], "forbidden");

    // Join the real project and wait until the subscription is registered
    socket
        .send(Message::Text(
            json!({ "action": "join", "project_id": project_id }).to_string(),
        ))
        .await
        .unwrap();

    common::wait_for(
        || async { ctx.hub.subscriber_count(project_uuid).await > 0 },
        5,
    )
    .await
    .unwrap();

    // A task created over HTTP arrives as a task.created frame
    let task = create_task(&ctx, &project_id, "Realtime task").await;

    let frame = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let event: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(event["event_type"], "task.created");
    assert_eq!(event["project_id"], project_id.as_str());
    assert_eq!(event["payload"]["title"], "Realtime task");

    // Deletes arrive with an id-only payload
    let task_id = task["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        &ctx,
        api_request(
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(&ctx.auth_header()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let frame = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let event: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(event["event_type"], "task.deleted");
    assert_eq!(event["payload"]["id"], task_id.as_str());

    // Leaving stops delivery; the channel is pruned once idle
    socket
        .send(Message::Text(
            json!({ "action": "leave", "project_id": project_id }).to_string(),
        ))
        .await
        .unwrap();

    common::wait_for(
        || async { ctx.hub.subscriber_count(project_uuid).await == 0 },
        5,
    )
    .await
    .unwrap();

    server.abort();
    ctx.cleanup().await.unwrap();
}
