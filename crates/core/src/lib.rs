//! Core services: the ownership guard, idempotent ingredient resolution,
//! the AI suggestion normalizer, the bulk import normalizer and the AI
//! usage quota. Everything here is driven through the repository layer in
//! `tastebook-db`; no locks are held across await points.

pub mod import;
pub mod ownership;
pub mod password;
pub mod quota;
pub mod resolve;
pub mod suggestion;
