//! # User API
//!
//! A small secured REST service exposing a single `user` resource.
//!
//! Requests pass through HTTP Basic authentication, are routed by axum to a
//! controller, and reach a relational store through a repository trait. The
//! store is either PostgreSQL (Diesel over an r2d2 pool) or an in-memory
//! repository used for tests and local development.
//!
//! ## Architecture
//!
//! - [`models`]: the `User` entity and its typed identifier
//! - [`db`]: repository trait, error types and backends
//! - [`services`]: the service layer sitting between controller and repository
//! - [`security`]: credential store and the Basic authentication filter
//! - [`http`]: router, controller and axum handlers
//! - [`config`]: TOML and environment configuration
//!

// RepositoryError carries an ErrorContext on every variant
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod security;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
