//! Domain model for agents, contact records and assigned lists.
//!
//! # Responsibility
//! - Define canonical data structures shared by import, distribution and
//!   persistence.
//! - Own field-level validation rules for agent registration.
//!
//! # Invariants
//! - Every agent is identified by a stable `AgentId`.
//! - Assigned lists reference agents by id and carry a name snapshot.

pub mod agent;
pub mod assigned_list;
pub mod contact;
