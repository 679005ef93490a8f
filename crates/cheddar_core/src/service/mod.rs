//! Caller-facing services over repositories.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from adapter construction and lifecycle.

pub mod repository_service;

pub use repository_service::RepositoryService;
