use super::common::{unique_username, TestContext};
use taylordash_auth::dto::{CreateUserRequest, LoginRequest};
use taylordash_core::Role;

#[tokio::test]
async fn successful_login_returns_a_session_for_the_authenticated_user() {
    let ctx = TestContext::new().await;
    let username = unique_username("login_ok");

    ctx.auth_service
        .create_user(
            CreateUserRequest { username: username.clone(), password: "CorrectHorse1!".to_string(), role: Role::Viewer },
            uuid::Uuid::new_v4(),
        )
        .await
        .expect("seed user should be created");

    let (session, user) = ctx
        .auth_service
        .login(
            LoginRequest { username: username.clone(), password: "CorrectHorse1!".to_string(), remember_me: false },
            Some("127.0.0.1".to_string()),
            Some("integration-test".to_string()),
        )
        .await
        .expect("login should succeed with the right password");

    assert_eq!(user.username, username);
    assert_eq!(session.user_id, user.id);

    ctx.cleanup_user(&username).await;
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected_with_a_generic_message() {
    let ctx = TestContext::new().await;
    let username = unique_username("login_bad_pw");

    ctx.auth_service
        .create_user(
            CreateUserRequest { username: username.clone(), password: "CorrectHorse1!".to_string(), role: Role::Viewer },
            uuid::Uuid::new_v4(),
        )
        .await
        .expect("seed user should be created");

    let result = ctx
        .auth_service
        .login(
            LoginRequest { username: username.clone(), password: "WrongPassword1!".to_string(), remember_me: false },
            None,
            None,
        )
        .await;

    assert!(result.is_err(), "login with the wrong password must fail");

    ctx.cleanup_user(&username).await;
}

#[tokio::test]
async fn login_for_a_nonexistent_user_fails_with_the_same_message_as_a_bad_password() {
    let ctx = TestContext::new().await;

    let result = ctx
        .auth_service
        .login(
            LoginRequest { username: unique_username("does_not_exist"), password: "Whatever1!".to_string(), remember_me: false },
            None,
            None,
        )
        .await;

    // §4.5: generic failure message guards against username enumeration —
    // a nonexistent user and a wrong password must be indistinguishable to
    // the caller.
    match result {
        Err(err) => assert!(err.to_string().contains("invalid credentials")),
        Ok(_) => panic!("login for a nonexistent user must not succeed"),
    }
}

#[tokio::test]
async fn logout_invalidates_the_session_token() {
    let ctx = TestContext::new().await;
    let username = unique_username("logout");

    ctx.auth_service
        .create_user(
            CreateUserRequest { username: username.clone(), password: "CorrectHorse1!".to_string(), role: Role::Viewer },
            uuid::Uuid::new_v4(),
        )
        .await
        .expect("seed user should be created");

    let (session, _) = ctx
        .auth_service
        .login(
            LoginRequest { username: username.clone(), password: "CorrectHorse1!".to_string(), remember_me: false },
            None,
            None,
        )
        .await
        .expect("login should succeed");

    ctx.auth_service.validate(&session.token).await.expect("fresh session should validate");

    ctx.auth_service.logout(&session.token).await.expect("logout should succeed");

    assert!(ctx.auth_service.validate(&session.token).await.is_err(), "session must be invalid after logout");

    ctx.cleanup_user(&username).await;
}
