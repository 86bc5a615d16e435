//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn structured operation requests into structured responses.

pub mod request;
pub mod site_service;
