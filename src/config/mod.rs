//! Environment-derived configuration.
//!
//! Each submodule owns one aspect of configuration and exposes a
//! `from_env()` constructor with development-safe defaults:
//!
//! - [`app`]: client base URL, bcrypt cost, password-reset window
//! - [`database`]: PostgreSQL pool initialization
//! - [`email`]: SMTP transport settings
//! - [`jwt`]: token secrets and expirations

pub mod app;
pub mod database;
pub mod email;
pub mod jwt;
