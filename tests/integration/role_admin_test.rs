//! Integration tests for role, catalog, and override administration.

mod helpers;

use warden_auth::{ActionTaken, PermissionSeed};
use warden_core::ErrorKind;
use warden_core::types::{OrgUnitId, UserId};
use warden_entity::action::{ActionKey, ActionRef, NewAction};

use helpers::TestApp;

#[tokio::test]
async fn test_duplicate_assignment_conflicts() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let roles = app.engine.roles();

    let err = roles
        .assign_role(user.id, "r1", None, app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));

    // Same role at a unit is a different assignment.
    let unit = OrgUnitId::new();
    roles.assign_role(user.id, "r1", Some(unit), app.admin.id).await.unwrap();
    let err = roles
        .assign_role(user.id, "r1", Some(unit), app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
}

#[tokio::test]
async fn test_assignment_references_must_exist() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let roles = app.engine.roles();

    let err = roles
        .assign_role(user.id, "nope", None, app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));

    let err = roles
        .assign_role(UserId::new(), "r1", None, app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_unassign_removes_exact_scope() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r2"]).await;
    let unit = OrgUnitId::new();
    app.assign(&user, "r2", Some(unit)).await;
    let roles = app.engine.roles();

    roles.unassign_role(user.id, "r2", None, app.admin.id).await.unwrap();
    // Unscoped checks still see the unit assignment.
    assert!(app.check(&user, "student", "DELETE").await);
    assert!(app.check_at(&user, "student", "DELETE", Some(unit)).await);

    roles.unassign_role(user.id, "r2", Some(unit), app.admin.id).await.unwrap();
    assert!(!app.check(&user, "student", "DELETE").await);

    let err = roles
        .unassign_role(user.id, "r2", Some(unit), app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_role_grants_take_effect_immediately() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["staff"]).await;
    let roles = app.engine.roles();
    let upload: ActionRef = "evidence:UPLOAD".parse().unwrap();
    assert!(!app.check(&user, "evidence", "UPLOAD").await);

    roles.grant_action_to_role("staff", &upload, app.admin.id).await.unwrap();
    assert!(app.check(&user, "evidence", "UPLOAD").await);
    assert_eq!(roles.role_actions("staff").await.unwrap().len(), 2);

    assert!(roles.revoke_action_from_role("staff", &upload, app.admin.id).await.unwrap());
    assert!(!roles.revoke_action_from_role("staff", &upload, app.admin.id).await.unwrap());
    assert!(!app.check(&user, "evidence", "UPLOAD").await);
}

#[tokio::test]
async fn test_create_role_and_action() {
    let app = TestApp::new().await;
    let roles = app.engine.roles();

    let role = roles
        .create_role("auditor", Some("Read-only reviewers".into()), app.admin.id)
        .await
        .unwrap();
    assert_eq!(role.name, "auditor");
    let err = roles.create_role("auditor", None, app.admin.id).await.unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
    let err = roles.create_role("  ", None, app.admin.id).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    let updated = roles
        .update_role_description("auditor", None, app.admin.id)
        .await
        .unwrap();
    assert!(updated.description.is_none());

    let key = ActionKey::new("Report", "export").unwrap();
    let action = roles
        .create_action(NewAction::new(key.clone(), "Export report"), app.admin.id)
        .await
        .unwrap();
    assert_eq!(action.identity(), "report:EXPORT");
    let err = roles
        .create_action(NewAction::new(key, "Again"), app.admin.id)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
}

#[tokio::test]
async fn test_available_actions_ignore_overrides_and_inactive() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1", "r2"]).await;
    let roles = app.engine.roles();
    app.engine
        .overrides()
        .grant(user.id, &"evidence:UPLOAD".parse::<ActionRef>().unwrap(), app.admin.id, None)
        .await
        .unwrap();
    roles
        .set_action_active(&"student:VIEW".parse::<ActionRef>().unwrap(), false, app.admin.id)
        .await
        .unwrap();

    let available: Vec<String> = roles
        .available_actions(user.id, None)
        .await
        .unwrap()
        .iter()
        .map(|a| a.identity())
        .collect();
    assert_eq!(available, vec!["activity:APPROVE", "student:DELETE"]);

    assert_eq!(roles.list_actions(false).await.unwrap().len(), 5);
    assert_eq!(roles.list_actions(true).await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_override_grant_outcomes() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let overrides = app.engine.overrides();
    let approve: ActionRef = "activity:APPROVE".parse().unwrap();
    let upload: ActionRef = "evidence:UPLOAD".parse().unwrap();

    let first = overrides.grant(user.id, &upload, app.admin.id, None).await.unwrap();
    assert_eq!(first.action_taken, ActionTaken::CreatedOverride);
    let again = overrides.grant(user.id, &upload, app.admin.id, None).await.unwrap();
    assert_eq!(again.action_taken, ActionTaken::None);

    // Already granted by r1: nothing is written.
    let via_role = overrides.grant(user.id, &approve, app.admin.id, None).await.unwrap();
    assert_eq!(via_role.action_taken, ActionTaken::None);
    assert!(via_role.override_row.is_none());

    overrides.revoke(user.id, &approve, app.admin.id, None).await.unwrap();
    let restored = overrides.grant(user.id, &approve, app.admin.id, None).await.unwrap();
    assert_eq!(restored.action_taken, ActionTaken::RemovedDenyOverride);
    assert!(app.check(&user, "activity", "APPROVE").await);

    let reset = overrides.reset(user.id, &approve, app.admin.id).await.unwrap();
    assert_eq!(reset.action_taken, ActionTaken::None);
}

#[tokio::test]
async fn test_override_references_must_exist() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let overrides = app.engine.overrides();

    let err = overrides
        .grant(user.id, &"report:EXPORT".parse::<ActionRef>().unwrap(), app.admin.id, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));

    let err = overrides
        .revoke(UserId::new(), &"student:VIEW".parse::<ActionRef>().unwrap(), app.admin.id, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_mutations_are_audited() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let upload: ActionRef = "evidence:UPLOAD".parse().unwrap();

    app.assign(&user, "r1", None).await;
    app.engine
        .overrides()
        .grant(user.id, &upload, app.admin.id, Some("Temporary".into()))
        .await
        .unwrap();
    app.engine
        .overrides()
        .reset(user.id, &upload, app.admin.id)
        .await
        .unwrap();

    let entries = app
        .engine
        .stores()
        .audit
        .list_for_target(user.id.into(), 10)
        .await
        .unwrap();
    let events: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(events, vec!["override.delete", "override.grant", "role.assign"]);
    assert!(entries.iter().all(|e| e.actor_id == app.admin.id));
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let app = TestApp::new().await;
    let seed = PermissionSeed::from_json(
        r#"{
            "actions": [
                { "resource": "activity", "action_code": "approve" },
                { "resource": "report", "action_code": "EXPORT" }
            ],
            "roles": [
                { "name": "r1", "actions": ["report:EXPORT"] }
            ],
            "principals": [
                { "username": "auditor", "roles": [{ "role": "r1" }] }
            ]
        }"#,
    )
    .unwrap();

    let first = app.engine.seed(&seed).await.unwrap();
    assert_eq!(first.actions_created, 1);
    assert_eq!(first.roles_created, 0);
    assert_eq!(first.grants_created, 1);
    assert_eq!(first.principals_created, 1);
    assert_eq!(first.assignments_created, 1);

    let second = app.engine.seed(&seed).await.unwrap();
    assert_eq!(second, warden_auth::SeedReport::default());

    let auditor = app
        .engine
        .stores()
        .principals
        .require_username("auditor")
        .await
        .unwrap();
    assert!(app.check(&auditor, "report", "EXPORT").await);
    assert!(app.check(&auditor, "activity", "APPROVE").await);
}
