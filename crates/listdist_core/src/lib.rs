//! Core domain logic for contact-list distribution.
//! This crate is the single source of truth for upload validation and
//! distribution invariants; the HTTP server and CLI only call into it.

pub mod db;
pub mod distribute;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use distribute::{assign_to_agents, round_robin, DistributeError};
pub use import::{
    parse_table, parse_upload, CellValue, FileFormat, ImportError, ParsedTable, RawRow,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogLevel, LogTarget,
    LoggingError,
};
pub use model::agent::{Agent, AgentId, AgentValidationError, NewAgent};
pub use model::assigned_list::{AssignedList, ListDraft, ListId};
pub use model::contact::ContactRecord;
pub use repo::agent_repo::{AgentRepository, SqliteAgentRepository};
pub use repo::list_repo::{ListRepository, SqliteListRepository};
pub use repo::{RepoError, RepoResult};
pub use schema::{validate_table, SchemaError, REQUIRED_COLUMNS};
pub use service::agent_service::{AgentService, AgentServiceError};
pub use service::distribution_service::{
    DistributionOutcome, DistributionService, DistributionServiceError,
};
