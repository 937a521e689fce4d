//! Integration tests for the permission matrix read model.

mod helpers;

use warden_auth::rbac::MatrixEntry;
use warden_core::ErrorKind;
use warden_core::types::{ActionId, OrgUnitId, UserId};
use warden_entity::action::ActionRef;
use warden_entity::user_override::OverrideType;

use helpers::TestApp;

#[tokio::test]
async fn test_matrix_agrees_with_resolver() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1", "r2"]).await;
    let overrides = app.engine.overrides();
    let approve = ActionRef::from(app.action("activity:APPROVE").await.id);
    let upload = ActionRef::from(app.action("evidence:UPLOAD").await.id);
    overrides.revoke(user.id, &approve, app.admin.id, None).await.unwrap();
    overrides.grant(user.id, &upload, app.admin.id, None).await.unwrap();

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();

    for entry in &matrix.permissions {
        let expected = app.check(&user, &entry.resource, &entry.action_code).await;
        assert_eq!(
            entry.effective, expected,
            "{}:{} diverges from the resolver",
            entry.resource, entry.action_code
        );
    }
}

#[tokio::test]
async fn test_matrix_sections_per_role() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1", "r2"]).await;
    let delete = app.action("student:DELETE").await;
    let approve = app.action("activity:APPROVE").await;
    app.engine
        .overrides()
        .revoke(user.id, &ActionRef::from(approve.id), app.admin.id, Some("Audit".into()))
        .await
        .unwrap();

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();
    assert_eq!(matrix.permissions_by_role.len(), 2);

    let r1 = &matrix.permissions_by_role["r1"];
    let r2 = &matrix.permissions_by_role["r2"];
    assert_eq!(r1.len(), matrix.permissions.len());
    assert_eq!(r2.len(), matrix.permissions.len());

    let in_section = |section: &[MatrixEntry], id: ActionId| {
        section
            .iter()
            .find(|e| e.action_id == id)
            .cloned()
            .expect("Action missing from section")
    };

    // via_role is per section; effective is the single resolver answer.
    let delete_r1 = in_section(r1, delete.id);
    let delete_r2 = in_section(r2, delete.id);
    assert!(!delete_r1.via_role);
    assert!(delete_r2.via_role);
    assert!(delete_r1.effective && delete_r2.effective);

    let approve_r1 = in_section(r1, approve.id);
    let approve_r2 = in_section(r2, approve.id);
    assert!(approve_r1.via_role);
    assert!(!approve_r2.via_role);
    assert!(!approve_r1.effective && !approve_r2.effective);
    assert_eq!(approve_r1.override_type, Some(OverrideType::Revoke));
    assert_eq!(approve_r2.override_type, Some(OverrideType::Revoke));
    assert_eq!(approve_r2.note.as_deref(), Some("Audit"));
    assert_eq!(approve_r2.granted_by_name.as_deref(), Some("Administrator"));
}

#[tokio::test]
async fn test_matrix_summary_counts() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let overrides = app.engine.overrides();
    let view = ActionRef::from(app.action("student:VIEW").await.id);
    let upload = ActionRef::from(app.action("evidence:UPLOAD").await.id);
    let create = ActionRef::from(app.action("activity:CREATE").await.id);
    overrides.revoke(user.id, &view, app.admin.id, None).await.unwrap();
    overrides.grant(user.id, &upload, app.admin.id, None).await.unwrap();
    overrides.grant(user.id, &create, app.admin.id, None).await.unwrap();

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();
    let summary = &matrix.summary;

    assert_eq!(summary.total_actions, 6);
    assert_eq!(summary.override_count, 3);
    assert_eq!(summary.granted_count, 2);
    assert_eq!(summary.revoked_count, 1);
    // activity:APPROVE by role, plus the two grant overrides.
    assert_eq!(summary.effective_count, 3);
}

#[tokio::test]
async fn test_matrix_omits_inactive_actions() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let approve = app.action("activity:APPROVE").await;
    app.engine
        .roles()
        .set_action_active(&ActionRef::from(approve.id), false, app.admin.id)
        .await
        .unwrap();

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();
    assert_eq!(matrix.summary.total_actions, 5);
    assert!(matrix.entry(approve.id).is_none());
}

#[tokio::test]
async fn test_matrix_uses_scope_fallback() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let unit = OrgUnitId::new();

    let fallback = app
        .engine
        .build_permission_matrix(user.id, Some(unit))
        .await
        .unwrap();
    assert_eq!(fallback.roles.len(), 1);
    assert!(fallback.permissions_by_role.contains_key("r1"));

    app.assign(&user, "staff", Some(unit)).await;
    let scoped = app
        .engine
        .build_permission_matrix(user.id, Some(unit))
        .await
        .unwrap();
    assert_eq!(
        scoped.permissions_by_role.keys().cloned().collect::<Vec<_>>(),
        vec!["staff".to_string()]
    );
    let approve = app.action("activity:APPROVE").await;
    assert!(!scoped.entry(approve.id).unwrap().effective);
}

#[tokio::test]
async fn test_matrix_for_roleless_principal() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;

    let matrix = app.engine.build_permission_matrix(user.id, None).await.unwrap();
    assert!(matrix.roles.is_empty());
    assert!(matrix.permissions_by_role.is_empty());
    assert_eq!(matrix.summary.effective_count, 0);
    assert!(matrix.permissions.iter().all(|e| !e.via_role && !e.effective));
}

#[tokio::test]
async fn test_matrix_unknown_principal() {
    let app = TestApp::new().await;

    let err = app
        .engine
        .build_permission_matrix(UserId::new(), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}
