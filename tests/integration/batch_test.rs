//! Integration tests for desired-state batch application.

mod helpers;

use warden_auth::{ActionTaken, PermissionChange};
use warden_core::ErrorKind;
use warden_core::config::EngineConfig;
use warden_core::types::{ActionId, UserId};
use warden_entity::action::{ActionKey, ActionRef};

use helpers::TestApp;

fn key(identity: &str) -> ActionKey {
    identity.parse().expect("Invalid identity")
}

#[tokio::test]
async fn test_desired_role_value_removes_revoke() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let approve = app.action("activity:APPROVE").await;
    app.engine
        .overrides()
        .revoke(user.id, &ActionRef::from(approve.id), app.admin.id, None)
        .await
        .unwrap();
    assert!(!app.check(&user, "activity", "APPROVE").await);

    let outcome = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![PermissionChange::new(key("activity:APPROVE"), true)],
            app.admin.id,
        )
        .await
        .unwrap();

    let result = &outcome.changes[0];
    assert!(result.success);
    assert_eq!(result.action_id, Some(approve.id));
    assert_eq!(result.action_taken, Some(ActionTaken::DeletedOverride));

    assert!(app.check(&user, "activity", "APPROVE").await);
    let remaining = app
        .engine
        .stores()
        .overrides
        .list_for_principal(user.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let entry = outcome.updated_matrix.entry(approve.id).unwrap();
    assert!(entry.effective);
    assert!(entry.override_type.is_none());
}

#[tokio::test]
async fn test_batch_matching_current_state_writes_nothing() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    app.engine
        .overrides()
        .grant(user.id, &ActionRef::from(key("evidence:UPLOAD")), app.admin.id, None)
        .await
        .unwrap();

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();
    let changes: Vec<_> = matrix
        .permissions
        .iter()
        .map(|e| PermissionChange::new(e.action_id, e.effective))
        .collect();
    let before = app.store.override_writes();

    let outcome = app
        .engine
        .apply_permission_changes(user.id, changes, app.admin.id)
        .await
        .unwrap();

    assert_eq!(app.store.override_writes(), before);
    assert_eq!(outcome.mutations(), 0);
    assert_eq!(outcome.failed(), 0);
    assert!(
        outcome
            .changes
            .iter()
            .all(|c| c.action_taken == Some(ActionTaken::None))
    );
}

#[tokio::test]
async fn test_redundant_grant_override_is_removed() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let view = app.action("student:VIEW").await;
    app.engine
        .overrides()
        .grant(user.id, &ActionRef::from(view.id), app.admin.id, None)
        .await
        .unwrap();

    // Desired deny matches the role-derived value, so the grant goes away
    // instead of flipping to a revoke.
    let outcome = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![PermissionChange::new(view.id, false)],
            app.admin.id,
        )
        .await
        .unwrap();

    assert_eq!(outcome.changes[0].action_taken, Some(ActionTaken::DeletedOverride));
    assert!(
        app.engine
            .stores()
            .overrides
            .get(user.id, view.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!app.check(&user, "student", "VIEW").await);
}

#[tokio::test]
async fn test_batch_creates_and_changes_overrides() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let overrides = app.engine.stores().overrides.clone();
    let upload = app.action("evidence:UPLOAD").await;
    let create = app.action("activity:CREATE").await;
    app.engine
        .overrides()
        .grant(user.id, &ActionRef::from(create.id), app.admin.id, None)
        .await
        .unwrap();

    let outcome = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![
                PermissionChange::new(upload.id, true).with_note("Evidence officer"),
                PermissionChange::new(key("student:VIEW"), false),
                PermissionChange::new(create.id, false),
            ],
            app.admin.id,
        )
        .await
        .unwrap();

    let taken: Vec<_> = outcome.changes.iter().map(|c| c.action_taken).collect();
    assert_eq!(
        taken,
        vec![
            Some(ActionTaken::CreatedOverride),
            Some(ActionTaken::CreatedOverride),
            Some(ActionTaken::DeletedOverride),
        ]
    );

    let upload_row = overrides.get(user.id, upload.id).await.unwrap().unwrap();
    assert!(upload_row.is_granted);
    assert_eq!(upload_row.note.as_deref(), Some("Evidence officer"));
    assert_eq!(upload_row.granted_by, app.admin.id);

    assert!(app.check(&user, "evidence", "UPLOAD").await);
    assert!(!app.check(&user, "student", "VIEW").await);
    assert!(!app.check(&user, "activity", "CREATE").await);
}

#[tokio::test]
async fn test_flipping_an_override_keeps_one_row() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r2"]).await;
    let upload = app.action("evidence:UPLOAD").await;
    let granted = app
        .engine
        .overrides()
        .grant(user.id, &ActionRef::from(upload.id), app.admin.id, None)
        .await
        .unwrap();
    let original_id = granted.override_row.unwrap().id;

    // r2 does not confer UPLOAD, so flipping back rewrites the row in place.
    app.engine
        .overrides()
        .revoke(user.id, &ActionRef::from(upload.id), app.admin.id, None)
        .await
        .unwrap();
    let outcome = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![PermissionChange::new(upload.id, true)],
            app.admin.id,
        )
        .await
        .unwrap();
    assert_eq!(outcome.changes[0].action_taken, Some(ActionTaken::OverrideChanged));

    let rows = app
        .engine
        .stores()
        .overrides
        .list_for_principal(user.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, original_id);
    assert!(rows[0].is_granted);
}

#[tokio::test]
async fn test_failed_items_do_not_stop_the_batch() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let upload = app.action("evidence:UPLOAD").await;
    let view = app.action("student:VIEW").await;
    let approve = app.action("activity:APPROVE").await;
    app.engine
        .roles()
        .set_action_active(&ActionRef::from(approve.id), false, app.admin.id)
        .await
        .unwrap();

    let outcome = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![
                PermissionChange::new(upload.id, true),
                PermissionChange::new(ActionId::new(), true),
                PermissionChange::new(approve.id, true),
                PermissionChange::new(view.id, true).with_note("x".repeat(501)),
                PermissionChange::new(key("attendance:VIEW"), true),
            ],
            app.admin.id,
        )
        .await
        .unwrap();

    let success: Vec<_> = outcome.changes.iter().map(|c| c.success).collect();
    assert_eq!(success, vec![true, false, false, false, true]);
    assert_eq!(outcome.failed(), 3);
    assert_eq!(outcome.mutations(), 2);
    assert!(outcome.changes[1].action_id.is_none());

    // Earlier successes are kept despite later failures.
    assert!(app.check(&user, "evidence", "UPLOAD").await);
    assert!(app.check(&user, "attendance", "VIEW").await);
    assert!(!app.check(&user, "student", "VIEW").await);
}

#[tokio::test]
async fn test_batch_for_unknown_principal_fails_whole() {
    let app = TestApp::new().await;
    let upload = app.action("evidence:UPLOAD").await;

    let err = app
        .engine
        .apply_permission_changes(
            UserId::new(),
            vec![PermissionChange::new(upload.id, true)],
            app.admin.id,
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_oversized_batch_is_rejected() {
    let config = EngineConfig {
        max_batch_size: 2,
        ..EngineConfig::default()
    };
    let app = TestApp::with_config(config).await;
    let user = app.create_user("u", &[]).await;
    let upload = app.action("evidence:UPLOAD").await;
    let before = app.store.override_writes();

    let err = app
        .engine
        .apply_permission_changes(
            user.id,
            vec![PermissionChange::new(upload.id, true); 3],
            app.admin.id,
        )
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Validation));
    assert_eq!(app.store.override_writes(), before);
}

#[tokio::test]
async fn test_changes_parse_from_json() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let approve = app.action("activity:APPROVE").await;

    let json = format!(
        r#"[
            {{ "action_id": "{}", "desired_effective": false, "note": "Suspended" }},
            {{ "action": "Evidence:upload", "desired_effective": true }}
        ]"#,
        approve.id
    );
    let changes: Vec<PermissionChange> = serde_json::from_str(&json).unwrap();

    let outcome = app
        .engine
        .apply_permission_changes(user.id, changes, app.admin.id)
        .await
        .unwrap();

    assert_eq!(outcome.failed(), 0);
    assert!(!app.check(&user, "activity", "APPROVE").await);
    assert!(app.check(&user, "evidence", "UPLOAD").await);
}
