//! Tests for db::repository::error module.

use user_api::db::repository::{ErrorContext, RepositoryError};

#[test]
fn test_error_context_new() {
    let ctx = ErrorContext::new("test_operation");
    assert_eq!(ctx.operation, Some("test_operation".to_string()));
    assert!(ctx.entity.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
}

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("save_user")
        .with_entity("user")
        .with_details("timeout occurred")
        .retryable();

    assert_eq!(ctx.operation, Some("save_user".to_string()));
    assert_eq!(ctx.entity, Some("user".to_string()));
    assert_eq!(ctx.details, Some("timeout occurred".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("find_user")
        .with_entity("user")
        .with_details("extra info");

    let display = format!("{}", ctx);
    assert!(display.contains("operation=find_user"));
    assert!(display.contains("entity=user"));
    assert!(display.contains("details=extra info"));
}

#[test]
fn test_connection_and_timeout_are_retryable() {
    assert!(RepositoryError::connection("refused").is_retryable());
    assert!(RepositoryError::timeout("slow").is_retryable());
    assert!(RepositoryError::connection_with_context("refused", ErrorContext::new("checkout"))
        .is_retryable());
}

#[test]
fn test_other_errors_are_not_retryable() {
    assert!(!RepositoryError::query("syntax error").is_retryable());
    assert!(!RepositoryError::configuration("bad url").is_retryable());
    assert!(!RepositoryError::internal("bug").is_retryable());
    assert!(!RepositoryError::blocking_not_allowed("save_user").is_retryable());
    assert!(!RepositoryError::row_count(1, 0, ErrorContext::new("save_user")).is_retryable());
}

#[test]
fn test_row_count_display() {
    let err = RepositoryError::row_count(1, 2, ErrorContext::new("save_user"));
    let msg = err.to_string();
    assert!(msg.contains("expected 1, got 2"));
    assert!(msg.contains("operation=save_user"));
}

#[test]
fn test_blocking_not_allowed_records_operation() {
    let err = RepositoryError::blocking_not_allowed("find_by_id");
    assert_eq!(err.context().operation, Some("find_by_id".to_string()));
    assert!(err.to_string().contains("Blocking call outside a blocking section"));
}

#[test]
fn test_with_operation_and_entity_update_context() {
    let err = RepositoryError::query("boom")
        .with_operation("delete_all")
        .with_entity("user");
    assert_eq!(err.context().operation, Some("delete_all".to_string()));
    assert_eq!(err.context().entity, Some("user".to_string()));
}

#[test]
fn test_retryable_context_display() {
    let err = RepositoryError::connection("refused").with_operation("get_connection");
    let msg = err.to_string();
    assert!(msg.starts_with("Connection error: refused"));
    assert!(msg.contains("operation=get_connection"));
    assert!(msg.contains("retryable=true"));
}
