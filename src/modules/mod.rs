pub mod auth;
pub mod email_templates;
pub mod role_permissions;
pub mod roles;
pub mod users;
