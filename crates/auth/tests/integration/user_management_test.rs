use super::common::{unique_username, TestContext};
use taylordash_auth::dto::{CreateUserRequest, UpdateUserRequest};
use taylordash_core::Role;

#[tokio::test]
async fn creating_a_user_with_a_taken_username_is_a_conflict() {
    let ctx = TestContext::new().await;
    let username = unique_username("dupe");
    let actor = uuid::Uuid::new_v4();

    ctx.auth_service
        .create_user(CreateUserRequest { username: username.clone(), password: "Password123!".to_string(), role: Role::Viewer }, actor)
        .await
        .expect("first create should succeed");

    let second = ctx
        .auth_service
        .create_user(CreateUserRequest { username: username.clone(), password: "Password123!".to_string(), role: Role::Viewer }, actor)
        .await;

    assert!(second.is_err(), "a second user with the same username must be rejected");

    ctx.cleanup_user(&username).await;
}

#[tokio::test]
async fn demoting_the_last_admin_is_rejected() {
    let ctx = TestContext::new().await;
    let username = unique_username("sole_admin");
    let actor = uuid::Uuid::new_v4();

    let admin = ctx
        .auth_service
        .create_user(CreateUserRequest { username: username.clone(), password: "Password123!".to_string(), role: Role::Admin }, actor)
        .await
        .expect("admin user should be created");

    // Whether this admin is the *last* one depends on whatever else is in
    // the test database; the assertion only needs to hold when they are.
    let remaining_admins = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active AND id != $1",
    )
    .bind(admin.id)
    .fetch_one(ctx.db.pool())
    .await
    .expect("admin count query should succeed");

    let result = ctx
        .auth_service
        .update_user(admin.id, UpdateUserRequest { role: Some(Role::Viewer), default_view: None, single_view_mode: None, is_active: None })
        .await;

    if remaining_admins == 0 {
        assert!(result.is_err(), "demoting the only remaining admin must be rejected");
    } else {
        assert!(result.is_ok(), "demoting an admin while others remain should succeed");
    }

    ctx.cleanup_user(&username).await;
}

#[tokio::test]
async fn deleting_a_user_cascades_their_sessions() {
    let ctx = TestContext::new().await;
    let username = unique_username("deleted");
    let actor = uuid::Uuid::new_v4();

    let user = ctx
        .auth_service
        .create_user(CreateUserRequest { username: username.clone(), password: "Password123!".to_string(), role: Role::Viewer }, actor)
        .await
        .expect("user should be created");

    ctx.auth_service.delete_user(user.id).await.expect("delete should succeed");

    assert!(ctx.auth_service.get_user(user.id).await.is_err(), "deleted user must no longer be fetchable");
}
