//! Transport-facing helpers for the hosting HTTP layer.
//!
//! The crate does not run a server. These helpers resolve request paths to
//! pipeline operations, extract the request origin, and map operation
//! outcomes to status codes and JSON bodies.

mod origin;
mod response;
mod routes;

pub use origin::{FORWARDED_FOR, origin_address};
pub use response::{
    audit_error_response, error_response, route_error_response, success_status, toggle_body,
};
pub use routes::{ApiVersion, AuthEndpoint, Endpoint, Route, RouteError, resolve};
