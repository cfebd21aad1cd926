//! HTTP server module.
//!
//! Exposes the user service as a REST API behind HTTP Basic authentication.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Security filter (auth.rs)                                │
//! │  - HTTP Basic credentials, 401 challenge                  │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Router + handlers                                        │
//! │  - Path/method/Accept matching, body extraction           │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  UserController → UserService → UserRepository            │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod controller;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod negotiation;
pub mod router;
pub mod state;

pub use controller::UserController;
pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
