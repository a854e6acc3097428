//! Taskledger: multi-tenant task tracking with an audit trail.
//!
//! This crate provides the core of a task-management backend: typed task
//! records and their satellites (comments, attachments, schedules,
//! dependencies, teams), row-level access scoping, validation, a
//! transactional entity store, and an advisory audit log.
//!
//! # Architecture
//!
//! Taskledger follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, in-memory)
//! - **Services**: Orchestration of the above per inbound operation
//!
//! # Modules
//!
//! - [`access`]: Authenticated principals and row-level scope predicates
//! - [`tracker`]: Entities, validation, the entity store, and the operation
//!   pipeline
//! - [`audit`]: Append-only audit log, its sink, and maintenance
//! - [`transport`]: Route table, origin extraction, and status mapping for
//!   the hosting HTTP layer
//! - [`config`]: Service configuration
//! - [`app`]: Composition root wiring stores, sink, and pipeline together

pub mod access;
pub mod app;
pub mod audit;
pub mod config;
pub mod tracker;
pub mod transport;
