//! Status codes and bodies for operation outcomes.

use super::{Endpoint, RouteError};
use crate::audit::services::AuditAccessError;
use crate::tracker::{domain::TaskStatus, services::OperationError};
use http::StatusCode;
use serde_json::{Value, json};

const NOT_FOUND_DETAIL: &str = "Not found.";
const FORBIDDEN_DETAIL: &str = "You do not have permission to perform this action.";
const SERVER_ERROR_DETAIL: &str = "A server error occurred.";

/// Returns the status for a successful call to `endpoint`.
#[must_use]
pub const fn success_status(endpoint: Endpoint) -> StatusCode {
    match endpoint {
        Endpoint::Create(_) => StatusCode::CREATED,
        Endpoint::Delete(..) => StatusCode::NO_CONTENT,
        Endpoint::List(_)
        | Endpoint::Retrieve(..)
        | Endpoint::Replace(..)
        | Endpoint::Patch(..)
        | Endpoint::Toggle(_)
        | Endpoint::ListLogs
        | Endpoint::Auth(_) => StatusCode::OK,
    }
}

/// Returns the status and body for a failed operation.
///
/// Store failures get a generic body; their detail only reaches the audit
/// log and diagnostics.
#[must_use]
pub fn error_response(err: &OperationError) -> (StatusCode, Value) {
    match err {
        OperationError::Rejected(errors) => (
            StatusCode::BAD_REQUEST,
            serde_json::to_value(errors).unwrap_or_default(),
        ),
        OperationError::NotFound => detail(StatusCode::NOT_FOUND, NOT_FOUND_DETAIL),
        OperationError::Forbidden => detail(StatusCode::FORBIDDEN, FORBIDDEN_DETAIL),
        OperationError::Failed(_) => detail(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_DETAIL),
    }
}

/// Returns the status and body for a failed audit maintenance call.
#[must_use]
pub fn audit_error_response(err: &AuditAccessError) -> (StatusCode, Value) {
    match err {
        AuditAccessError::Forbidden => detail(StatusCode::FORBIDDEN, FORBIDDEN_DETAIL),
        AuditAccessError::Repository(_) => {
            detail(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_DETAIL)
        }
    }
}

/// Returns the status and body for an unroutable request.
#[must_use]
pub fn route_error_response(err: RouteError) -> (StatusCode, Value) {
    match err {
        RouteError::NotFound => detail(StatusCode::NOT_FOUND, NOT_FOUND_DETAIL),
        RouteError::MethodNotAllowed => detail(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed for this endpoint.",
        ),
    }
}

/// Returns the body of a successful toggle.
#[must_use]
pub fn toggle_body(status: TaskStatus) -> Value {
    json!({ "status": status.as_str() })
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Value) {
    (status, json!({ "detail": message }))
}
