//! Integration tests for authorization checks.

mod helpers;

use warden_auth::DecisionSource;
use warden_core::ErrorKind;
use warden_core::types::OrgUnitId;
use warden_entity::action::{ActionKey, ActionRef};

use helpers::TestApp;

#[tokio::test]
async fn test_role_grant_allows() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;

    assert!(app.check(&user, "activity", "APPROVE").await);
    assert!(!app.check(&user, "student", "DELETE").await);
}

#[tokio::test]
async fn test_revoke_override_beats_role() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let approve = ActionRef::from(app.action("activity:APPROVE").await.id);

    app.engine
        .overrides()
        .revoke(user.id, &approve, app.admin.id, Some("On probation".into()))
        .await
        .expect("Revoke failed");

    assert!(!app.check(&user, "activity", "APPROVE").await);

    let decision = app
        .engine
        .resolver()
        .resolve(user.id, "activity", "APPROVE", None)
        .await
        .unwrap();
    assert_eq!(decision.source, DecisionSource::Override);
}

#[tokio::test]
async fn test_grant_override_without_role() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let upload = ActionRef::from(app.action("evidence:UPLOAD").await.id);

    app.engine
        .overrides()
        .grant(user.id, &upload, app.admin.id, None)
        .await
        .unwrap();

    assert!(app.check(&user, "evidence", "UPLOAD").await);
}

#[tokio::test]
async fn test_reset_reverts_to_role_value() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let approve = ActionRef::from(app.action("activity:APPROVE").await.id);
    let upload = ActionRef::from(app.action("evidence:UPLOAD").await.id);

    let overrides = app.engine.overrides();
    overrides.revoke(user.id, &approve, app.admin.id, None).await.unwrap();
    overrides.grant(user.id, &upload, app.admin.id, None).await.unwrap();
    assert!(!app.check(&user, "activity", "APPROVE").await);
    assert!(app.check(&user, "evidence", "UPLOAD").await);

    overrides.reset(user.id, &approve, app.admin.id).await.unwrap();
    overrides.reset(user.id, &upload, app.admin.id).await.unwrap();

    assert!(app.check(&user, "activity", "APPROVE").await);
    assert!(!app.check(&user, "evidence", "UPLOAD").await);
}

#[tokio::test]
async fn test_roleless_principal_is_denied_everything() {
    let app = TestApp::new().await;
    let user = app.create_user("u2", &[]).await;

    for action in app.engine.roles().list_actions(true).await.unwrap() {
        assert!(
            !app.check(&user, &action.resource, &action.action_code).await,
            "{} should be denied",
            action.identity()
        );
    }

    let decision = app
        .engine
        .resolver()
        .resolve(user.id, "student", "VIEW", None)
        .await
        .unwrap();
    assert_eq!(decision.source, DecisionSource::NoGrant);
}

#[tokio::test]
async fn test_any_role_suffices() {
    let app = TestApp::new().await;
    let user = app.create_user("u3", &["r1", "r2"]).await;

    assert!(app.check(&user, "student", "DELETE").await);
    assert!(app.check(&user, "student", "VIEW").await);

    let codes = app
        .engine
        .get_effective_actions(user.id, "Student", None)
        .await
        .unwrap();
    assert_eq!(
        codes.into_iter().collect::<Vec<_>>(),
        vec!["DELETE".to_string(), "VIEW".to_string()]
    );
}

#[tokio::test]
async fn test_global_role_applies_at_any_scope() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let unit = OrgUnitId::new();

    assert!(app.check_at(&user, "activity", "APPROVE", Some(unit)).await);
}

#[tokio::test]
async fn test_scoped_roles_hide_global_roles() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let unit = OrgUnitId::new();
    app.assign(&user, "staff", Some(unit)).await;

    // The unit has its own assignment, so the global r1 is not consulted.
    assert!(!app.check_at(&user, "activity", "APPROVE", Some(unit)).await);
    assert!(app.check_at(&user, "activity", "APPROVE", None).await);
    assert!(app.check_at(&user, "attendance", "VIEW", Some(unit)).await);
}

#[tokio::test]
async fn test_roles_at_other_units_never_apply() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &[]).await;
    let (home, other) = (OrgUnitId::new(), OrgUnitId::new());
    app.assign(&user, "r2", Some(home)).await;

    assert!(app.check_at(&user, "student", "DELETE", Some(home)).await);
    assert!(!app.check_at(&user, "student", "DELETE", Some(other)).await);
}

#[tokio::test]
async fn test_identity_casing_is_normalized() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;

    assert!(app.check(&user, "Activity", "approve").await);
    assert!(app.check(&user, " ACTIVITY ", "Approve").await);
}

#[tokio::test]
async fn test_unknown_and_malformed_actions_are_denied() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;

    assert!(!app.check(&user, "activity", "ARCHIVE").await);
    assert!(!app.check(&user, "", "APPROVE").await);
    assert!(!app.check(&user, "activity:x", "APPROVE").await);

    let decision = app
        .engine
        .resolver()
        .resolve(user.id, "nothing", "HERE", None)
        .await
        .unwrap();
    assert_eq!(decision.source, DecisionSource::Unresolvable);
}

#[tokio::test]
async fn test_inactive_action_denied_even_with_grant_override() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1"]).await;
    let upload = ActionRef::from(app.action("evidence:UPLOAD").await.id);

    app.engine
        .overrides()
        .grant(user.id, &upload, app.admin.id, None)
        .await
        .unwrap();
    app.engine
        .roles()
        .set_action_active(&upload, false, app.admin.id)
        .await
        .unwrap();
    app.engine
        .roles()
        .set_action_active(&"activity:APPROVE".parse::<ActionRef>().unwrap(), false, app.admin.id)
        .await
        .unwrap();

    assert!(!app.check(&user, "evidence", "UPLOAD").await);
    assert!(!app.check(&user, "activity", "APPROVE").await);
}

#[tokio::test]
async fn test_require_permission_is_forbidden_when_denied() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r2"]).await;
    let resolver = app.engine.resolver();

    let delete = ActionKey::new("student", "DELETE").unwrap();
    let approve = ActionKey::new("activity", "APPROVE").unwrap();

    resolver.require_permission(user.id, &delete, None).await.unwrap();
    let err = resolver
        .require_permission(user.id, &approve, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Authorization));

    let both = [delete.clone(), approve.clone()];
    assert!(resolver.has_any_permission(user.id, &both, None).await.unwrap());
    assert!(!resolver.has_all_permissions(user.id, &both, None).await.unwrap());
    assert!(!resolver.has_all_permissions(user.id, &[], None).await.unwrap());
}

#[tokio::test]
async fn test_effective_permissions_groups_by_resource() {
    let app = TestApp::new().await;
    let user = app.create_user("u", &["r1", "staff"]).await;
    let delete = ActionRef::from(app.action("student:DELETE").await.id);
    app.engine
        .overrides()
        .grant(user.id, &delete, app.admin.id, None)
        .await
        .unwrap();

    let grouped = app
        .engine
        .resolver()
        .effective_permissions(user.id, None)
        .await
        .unwrap();

    assert_eq!(grouped.len(), 3);
    assert!(grouped["activity"].contains("APPROVE"));
    assert!(grouped["attendance"].contains("VIEW"));
    assert_eq!(grouped["student"].len(), 2);
    assert!(!grouped.contains_key("evidence"));
}

#[tokio::test]
async fn test_unknown_principal_is_denied() {
    let app = TestApp::new().await;
    let ghost = warden_core::types::UserId::new();

    assert!(
        !app.engine
            .check_permission(ghost, "activity", "APPROVE", None)
            .await
            .unwrap()
    );
}
