pub mod controller;
pub mod email_verification;
pub mod model;
pub mod router;
pub mod service;
