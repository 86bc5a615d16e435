//! Site/access point domain model.
//!
//! # Responsibility
//! - Define the canonical records handled by the repository layer.
//! - Own validation and structural equality; no storage dependencies.
//!
//! # Invariants
//! - Every site is identified by its validated `name`.
//! - Access points never exist outside their owning site.

pub mod site;
