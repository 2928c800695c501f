use std::fs;

use assert_matches::assert_matches;
use serde_json::{json, Value};
use tempfile::TempDir;

use session_cell::SessionStore;
use shared_models::auth::AdminRole;
use shared_models::error::ApiError;
use shared_utils::test_utils::{JwtTestUtils, TestAdmin};

fn store_in(dir: &TempDir) -> SessionStore {
    SessionStore::new(dir.path().join("session.json"))
}

#[test]
fn test_missing_file_means_signed_out() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.load().unwrap(), None);
    assert!(!store.is_signed_in());
}

#[test]
fn test_save_then_load_restores_session() {
    let dir = TempDir::new().unwrap();
    let admin = TestAdmin::super_admin("head@clinic.ph");
    let session = admin.to_session();

    store_in(&dir).save(session.clone()).unwrap();

    let reopened = store_in(&dir);
    let loaded = reopened.load().unwrap().unwrap();
    assert_eq!(loaded, session);
    assert!(loaded.is_super_admin());
    assert_eq!(reopened.token(), Some(session.token));
}

#[test]
fn test_missing_role_is_decoded_and_persisted() {
    let dir = TempDir::new().unwrap();
    let admin = TestAdmin::super_admin("head@clinic.ph");
    let token = JwtTestUtils::create_test_token(&admin, Some(2));
    let store = store_in(&dir);

    fs::write(
        store.path(),
        json!({ "_id": admin.id, "email": admin.email, "token": token }).to_string(),
    )
    .unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.role, Some(AdminRole::SuperAdmin));

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk["role"], json!("super_admin"));
}

#[test]
fn test_token_without_role_defaults_to_admin() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    fs::write(
        store.path(),
        json!({ "token": JwtTestUtils::create_token_without_role("abc") }).to_string(),
    )
    .unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.role(), AdminRole::Admin);
    assert!(loaded.is_admin());
}

#[test]
fn test_expired_session_is_discarded() {
    let dir = TempDir::new().unwrap();
    let admin = TestAdmin::admin("nurse.lead@clinic.ph");
    let mut session = admin.to_session();
    session.token = JwtTestUtils::create_expired_token(&admin);

    let store = store_in(&dir);
    store.save(session).unwrap();

    assert_eq!(store.load().unwrap(), None);
    assert!(!store.path().exists());
}

#[test]
fn test_corrupt_file_is_a_session_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(store.path(), "{not json").unwrap();

    assert_matches!(store.load(), Err(ApiError::Session(_)));
}

#[test]
fn test_invalidate_removes_file_and_memory() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.save(TestAdmin::admin("a@clinic.ph").to_session()).unwrap();

    store.invalidate().unwrap();

    assert!(store.current().is_none());
    assert!(!store.path().exists());
    // A second logout is harmless.
    store.invalidate().unwrap();
}

#[test]
fn test_rotate_token_rederives_role() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.save(TestAdmin::admin("a@clinic.ph").to_session()).unwrap();

    let promoted = TestAdmin::super_admin("a@clinic.ph");
    let rotated = store
        .rotate_token(JwtTestUtils::create_test_token(&promoted, Some(8)))
        .unwrap();

    assert!(rotated.is_super_admin());
    assert_eq!(store_in(&dir).load().unwrap(), Some(rotated));
}

#[test]
fn test_rotate_without_session_fails() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert_matches!(store.rotate_token("t"), Err(ApiError::Session(_)));
}
