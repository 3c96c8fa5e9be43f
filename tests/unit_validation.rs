use rolegate::modules::auth::model::{ChangePasswordRequestDto, HasPermissionsQuery, HasRoleQuery};
use rolegate::modules::email_templates::model::render_template;
use rolegate::modules::roles::model::{CreateRoleDto, is_protected_role};
use rolegate::modules::users::model::{LoginDto, RegisterUserDto, RegisterUserInput};
use rolegate::utils::pagination::PaginationParams;
use std::collections::HashMap;
use validator::Validate;

fn register_dto(email: &str, password: Option<&str>, confirm: Option<&str>) -> RegisterUserDto {
    RegisterUserDto {
        user: RegisterUserInput {
            email: email.to_string(),
            username: None,
            first_name: None,
            last_name: None,
            phone_number: None,
            image_url: None,
        },
        password: password.map(str::to_string),
        confirm_password: confirm.map(str::to_string),
    }
}

#[test]
fn test_registration_accepts_valid_payload() {
    let dto = register_dto("user@example.com", Some("secret"), Some("secret"));
    assert!(dto.validate().is_ok());
}

#[test]
fn test_registration_rejects_bad_email() {
    let dto = register_dto("not-an-email", Some("secret"), Some("secret"));
    assert!(dto.validate().is_err());
}

#[test]
fn test_registration_rejects_password_mismatch() {
    let dto = register_dto("user@example.com", Some("secret"), Some("other"));
    assert!(dto.validate().is_err());
}

#[test]
fn test_registration_rejects_short_password() {
    let dto = register_dto("user@example.com", Some("abc"), Some("abc"));
    assert!(dto.validate().is_err());
}

#[test]
fn test_login_requires_email_and_password() {
    let dto = LoginDto {
        email: "user@example.com".to_string(),
        password: "".to_string(),
    };
    assert!(dto.validate().is_err());

    let dto = LoginDto {
        email: "user@example.com".to_string(),
        password: "secret".to_string(),
    };
    assert!(dto.validate().is_ok());
}

#[test]
fn test_reset_requires_matching_confirmation() {
    let dto = ChangePasswordRequestDto {
        token: "some.jwt.token".to_string(),
        password: "newpass".to_string(),
        confirm_password: "different".to_string(),
    };
    assert!(dto.validate().is_err());

    let dto = ChangePasswordRequestDto {
        token: "some.jwt.token".to_string(),
        password: "newpass".to_string(),
        confirm_password: "newpass".to_string(),
    };
    assert!(dto.validate().is_ok());
}

#[test]
fn test_role_name_must_not_be_empty() {
    let dto = CreateRoleDto {
        name: "".to_string(),
    };
    assert!(dto.validate().is_err());
}

#[test]
fn test_system_default_roles_are_protected() {
    assert!(is_protected_role("ADMIN", false));
    assert!(is_protected_role("USER", false));
    assert!(is_protected_role("ANY", true));
    assert!(!is_protected_role("MANAGER", false));
}

#[test]
fn test_csv_queries_tolerate_whitespace_and_empties() {
    let q = HasRoleQuery {
        roles: " ADMIN , MANAGER ,,".to_string(),
    };
    assert_eq!(q.names(), vec!["ADMIN", "MANAGER"]);

    let q = HasPermissionsQuery {
        permissions: "USERS_VIEW".to_string(),
    };
    assert_eq!(q.names(), vec!["USERS_VIEW"]);
}

#[test]
fn test_pagination_limit_capped_and_page_wins() {
    let params = PaginationParams {
        limit: Some(1000),
        offset: Some(7),
        page: Some(2),
    };
    assert_eq!(params.limit(), 100);
    assert_eq!(params.offset(), 100);
}

#[test]
fn test_template_rendering() {
    let mut vars = HashMap::new();
    vars.insert("name".to_string(), "Ada".to_string());
    assert_eq!(render_template("Hello {{name}}!", &vars), "Hello Ada!");
    assert_eq!(render_template("No placeholders", &vars), "No placeholders");
}
