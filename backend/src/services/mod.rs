//! Service layer between the HTTP controller and the repository.

pub mod user_service;

pub use user_service::UserService;
