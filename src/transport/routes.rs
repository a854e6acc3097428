//! Route table for the versioned and legacy API paths.
//!
//! `/api/v1/...` and the unversioned `/api/...` aliases resolve to the same
//! endpoints; only [`Route::version`] differs.

use crate::tracker::domain::{EntityKind, TaskId};
use http::Method;
use thiserror::Error;
use uuid::Uuid;

/// Which path family a request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `/api/v1/...`.
    V1,
    /// Unversioned `/api/...`.
    Legacy,
}

/// Endpoints owned by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEndpoint {
    /// Account registration.
    Register,
    /// Credential exchange for an access/refresh token pair.
    ObtainToken,
    /// Refresh-token exchange.
    RefreshToken,
}

/// A resolved operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// List rows of a kind.
    List(EntityKind),
    /// Create a row of a kind.
    Create(EntityKind),
    /// Retrieve one row.
    Retrieve(EntityKind, Uuid),
    /// Replace one row.
    Replace(EntityKind, Uuid),
    /// Partially update one row.
    Patch(EntityKind, Uuid),
    /// Delete one row.
    Delete(EntityKind, Uuid),
    /// Toggle a task's completion.
    Toggle(TaskId),
    /// List audit records.
    ListLogs,
    /// Delegated to the identity collaborator.
    Auth(AuthEndpoint),
}

/// A request path resolved against the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// Path family used.
    pub version: ApiVersion,
    /// Target operation.
    pub endpoint: Endpoint,
}

/// Why a request could not be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route matches the path.
    #[error("no route matches the request path")]
    NotFound,
    /// The path exists but not for this method.
    #[error("method not allowed for this path")]
    MethodNotAllowed,
}

/// Resolves `method` and `path` to a [`Route`].
///
/// A trailing slash is optional. Identifiers must be UUIDs; anything else
/// does not match.
///
/// # Errors
///
/// Returns [`RouteError::NotFound`] for unknown paths and
/// [`RouteError::MethodNotAllowed`] when the path exists but `method` does
/// not apply to it.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use taskledger::tracker::domain::EntityKind;
/// use taskledger::transport::{ApiVersion, Endpoint, resolve};
///
/// let route = resolve(&Method::GET, "/api/v1/taskcomments/").unwrap();
/// assert_eq!(route.version, ApiVersion::V1);
/// assert_eq!(route.endpoint, Endpoint::List(EntityKind::TaskComment));
///
/// let legacy = resolve(&Method::GET, "/api/taskcomments/").unwrap();
/// assert_eq!(legacy.endpoint, route.endpoint);
/// ```
pub fn resolve(method: &Method, path: &str) -> Result<Route, RouteError> {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let Some((&"api", rest)) = segments.split_first() else {
        return Err(RouteError::NotFound);
    };
    let (version, tail) = match rest.split_first() {
        Some((&"v1", tail)) => (ApiVersion::V1, tail),
        _ => (ApiVersion::Legacy, rest),
    };
    let endpoint = match tail {
        ["register"] => auth(method, AuthEndpoint::Register)?,
        ["token"] => auth(method, AuthEndpoint::ObtainToken)?,
        ["token", "refresh"] => auth(method, AuthEndpoint::RefreshToken)?,
        ["logs"] => {
            if *method != Method::GET {
                return Err(RouteError::MethodNotAllowed);
            }
            Endpoint::ListLogs
        }
        [collection] => {
            let kind = kind_for(collection)?;
            match *method {
                Method::GET => Endpoint::List(kind),
                Method::POST => Endpoint::Create(kind),
                _ => return Err(RouteError::MethodNotAllowed),
            }
        }
        [collection, id] => {
            let kind = kind_for(collection)?;
            let key = parse_id(id)?;
            match *method {
                Method::GET => Endpoint::Retrieve(kind, key),
                Method::PUT => Endpoint::Replace(kind, key),
                Method::PATCH => Endpoint::Patch(kind, key),
                Method::DELETE => Endpoint::Delete(kind, key),
                _ => return Err(RouteError::MethodNotAllowed),
            }
        }
        ["tasks", id, "toggle"] => {
            let key = parse_id(id)?;
            if *method != Method::POST {
                return Err(RouteError::MethodNotAllowed);
            }
            Endpoint::Toggle(TaskId::from_uuid(key))
        }
        _ => return Err(RouteError::NotFound),
    };
    Ok(Route { version, endpoint })
}

fn auth(method: &Method, endpoint: AuthEndpoint) -> Result<Endpoint, RouteError> {
    if *method == Method::POST {
        Ok(Endpoint::Auth(endpoint))
    } else {
        Err(RouteError::MethodNotAllowed)
    }
}

fn kind_for(collection: &str) -> Result<EntityKind, RouteError> {
    EntityKind::from_collection_path(collection).ok_or(RouteError::NotFound)
}

fn parse_id(raw: &str) -> Result<Uuid, RouteError> {
    Uuid::parse_str(raw).map_err(|_| RouteError::NotFound)
}
