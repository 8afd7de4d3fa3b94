//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate import, validation, partitioning and repository calls into
//!   use-case level APIs.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod agent_service;
pub mod credential;
pub mod distribution_service;
