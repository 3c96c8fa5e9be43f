use rolegate::config::jwt::JwtConfig;
use rolegate::utils::jwt::{
    create_access_token, create_refresh_token, create_verification_token, extract_bearer_token,
    verify_access_token, verify_refresh_token, verify_verification_token,
};
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_secret: "test_refresh_secret_key".to_string(),
        refresh_token_expiry: 604800,
        verification_secret: "test_verification_secret_key".to_string(),
        verification_token_expiry: 3600,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let result = create_access_token(
        &jwt_config,
        user_id,
        Some("ADMIN".to_string()),
        Some(vec!["USERS_VIEW".to_string()]),
    );

    assert!(result.is_ok());
    assert!(!result.unwrap().is_empty());
}

#[test]
fn test_verify_access_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(
        &jwt_config,
        user_id,
        Some("USER".to_string()),
        Some(vec!["PROFILE_EDIT".to_string(), "FILE_STORAGE_VIEW".to_string()]),
    )
    .unwrap();
    let claims = verify_access_token(&jwt_config, &token).unwrap();

    assert_eq!(claims.id, user_id);
    assert_eq!(claims.role.as_deref(), Some("USER"));
    assert_eq!(
        claims.permissions,
        Some(vec![
            "PROFILE_EDIT".to_string(),
            "FILE_STORAGE_VIEW".to_string()
        ])
    );
}

#[test]
fn test_access_token_without_role_or_permissions() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(&jwt_config, user_id, None, None).unwrap();
    let claims = verify_access_token(&jwt_config, &token).unwrap();

    assert_eq!(claims.id, user_id);
    assert_eq!(claims.role, None);
    assert_eq!(claims.permissions, None);
}

#[test]
fn test_verify_access_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(&jwt_config, Uuid::new_v4(), None, None).unwrap();

    let mut wrong_config = get_test_jwt_config();
    wrong_config.secret = "different_secret_key".to_string();

    assert!(verify_access_token(&wrong_config, &token).is_err());
}

#[test]
fn test_refresh_token_roundtrip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_refresh_token(
        &jwt_config,
        user_id,
        Some("user@example.com".to_string()),
        Some("USER".to_string()),
    )
    .unwrap();
    let claims = verify_refresh_token(&jwt_config, &token).unwrap();

    assert_eq!(claims.id, user_id);
    assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    assert_eq!(claims.role.as_deref(), Some("USER"));
    assert_eq!(claims.exp - claims.iat, jwt_config.refresh_token_expiry);
}

#[test]
fn test_verification_token_roundtrip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_verification_token(&jwt_config, user_id, "verify@example.com").unwrap();
    let claims = verify_verification_token(&jwt_config, &token).unwrap();

    assert_eq!(claims.id, user_id);
    assert_eq!(claims.email, "verify@example.com");
    assert_eq!(claims.exp - claims.iat, jwt_config.verification_token_expiry);
}

#[test]
fn test_token_families_are_not_interchangeable() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let access = create_access_token(&jwt_config, user_id, None, None).unwrap();
    let refresh = create_refresh_token(&jwt_config, user_id, None, None).unwrap();
    let verification = create_verification_token(&jwt_config, user_id, "a@b.com").unwrap();

    assert!(verify_access_token(&jwt_config, &refresh).is_err());
    assert!(verify_access_token(&jwt_config, &verification).is_err());
    assert!(verify_refresh_token(&jwt_config, &access).is_err());
    assert!(verify_verification_token(&jwt_config, &access).is_err());
}

#[test]
fn test_verify_token_malformed() {
    let jwt_config = get_test_jwt_config();
    let malformed_tokens = vec![
        "",
        "not.enough.parts",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed_tokens {
        assert!(verify_access_token(&jwt_config, token).is_err());
    }
}

#[test]
fn test_access_token_expiry_is_set() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(&jwt_config, Uuid::new_v4(), None, None).unwrap();
    let claims = verify_access_token(&jwt_config, &token).unwrap();

    assert!(claims.exp > claims.iat);
    assert_eq!(claims.exp - claims.iat, jwt_config.access_token_expiry);
}

#[test]
fn test_extract_bearer_token() {
    assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    assert_eq!(extract_bearer_token("bearer abc"), None);
    assert_eq!(extract_bearer_token("Basic abc"), None);
    assert_eq!(extract_bearer_token("Bearer "), None);
}
