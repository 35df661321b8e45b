//! Auth module: three-layer architecture (domain, repository, service).
//!
//! This module centralizes registration, verification, password reset and
//! token issuing under the service crate.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;
pub mod tokens;

pub use service::AuthService;
