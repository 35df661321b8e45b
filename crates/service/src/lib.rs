//! Service layer of the marketplace on top of `models`.
//! - Keeps business rules (ownership, roles, payment state) out of handlers.
//! - Reuses validation and entity definitions in the `models` crate.
//! - Reports failures through `ServiceError`, mapped to HTTP by the server.

pub mod errors;
pub mod auth;
pub mod notify;
pub mod pagination;
pub mod stats;
pub mod events;
pub mod dashboard;
pub mod profile;
pub mod orders;
pub mod reviews;
pub mod reports;
#[cfg(test)]
pub mod test_support;
