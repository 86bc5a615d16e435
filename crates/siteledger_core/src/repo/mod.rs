//! Repository layer contracts and blob-store implementation.
//!
//! # Responsibility
//! - Define the use-case oriented site data access contract.
//! - Isolate codec and storage details from service orchestration.
//!
//! # Invariants
//! - Create, edit and rename pass `Site::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to store transport errors.

pub mod site_locks;
pub mod site_repo;
