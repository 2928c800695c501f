use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use tempfile::TempDir;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, body_json};

use session_cell::{AuthService, SessionStore};
use shared_models::auth::AdminRole;
use shared_models::error::ApiError;
use shared_utils::test_utils::{JwtTestUtils, MockBackendResponses, TestAdmin, TestConfig};

fn create_service(mock_server: &MockServer, dir: &TempDir) -> AuthService {
    let mut config = TestConfig::with_base_url(&mock_server.uri());
    config.session_file = dir.path().join("session.json").to_string_lossy().into_owned();
    let app_config = config.to_app_config();
    let store = Arc::new(SessionStore::from_config(&app_config));
    AuthService::new(&app_config, store)
}

#[tokio::test]
async fn test_login_persists_session_with_token_role() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let token = JwtTestUtils::create_test_token(&TestAdmin::super_admin("head@clinic.ph"), Some(4));

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .and(body_json(json!({ "email": "head@clinic.ph", "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::login_response(&token)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    let session = service.login("head@clinic.ph", "s3cret").await.unwrap();

    assert_eq!(session.role, Some(AdminRole::SuperAdmin));
    assert_eq!(session.token, token);
    assert!(service.store().path().exists());
    assert_eq!(service.store().token(), Some(token));
}

#[tokio::test]
async fn test_bad_credentials_are_an_auth_failure() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            MockBackendResponses::error_response("Invalid email or password"),
        ))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    let err = service.login("head@clinic.ph", "wrong").await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized("Invalid email or password".to_string()));
    assert!(!service.store().is_signed_in());
    assert!(!service.store().path().exists());
}

#[tokio::test]
async fn test_login_response_without_token_is_refused() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Pending approval" })))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    assert_matches!(
        service.login("new@clinic.ph", "pw").await,
        Err(ApiError::Unauthorized(_))
    );
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let token = JwtTestUtils::create_test_token(&TestAdmin::admin("a@clinic.ph"), Some(4));

    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::login_response(&token)))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    service.login("a@clinic.ph", "pw").await.unwrap();
    service.logout().unwrap();

    assert!(!service.store().is_signed_in());
    assert!(!service.store().path().exists());
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/admin/forgot-password"))
        .and(body_json(json!({ "email": "a@clinic.ph" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OTP sent" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/verify-otp"))
        .and(body_json(json!({ "email": "a@clinic.ph", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/reset-password"))
        .and(body_json(json!({ "email": "a@clinic.ph", "new_password": "n3w" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Password updated" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    assert_eq!(service.request_otp("a@clinic.ph").await.unwrap(), "OTP sent");
    assert_eq!(service.verify_otp("a@clinic.ph", "123456").await.unwrap(), "OTP verified.");
    assert_eq!(service.reset_password("a@clinic.ph", "n3w").await.unwrap(), "Password updated");
}

#[tokio::test]
async fn test_wrong_otp_is_surfaced_verbatim() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/admin/verify-otp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            MockBackendResponses::error_response("Invalid or expired OTP"),
        ))
        .mount(&mock_server)
        .await;

    let service = create_service(&mock_server, &dir);
    let err = service.verify_otp("a@clinic.ph", "000000").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid or expired OTP");
}
