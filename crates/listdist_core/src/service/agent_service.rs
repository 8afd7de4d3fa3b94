//! Agent registry use-case service.
//!
//! # Responsibility
//! - Register agents (validate, hash credential, persist).
//! - Expose list/get/remove for callers that feed the distributor.
//!
//! # Invariants
//! - Plain credentials never reach the repository.
//! - Validation runs before hashing so bad input costs no KDF work.

use crate::model::agent::{Agent, AgentId, AgentValidationError, NewAgent};
use crate::repo::agent_repo::AgentRepository;
use crate::repo::RepoError;
use crate::service::credential::hash_credential;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for agent use-cases.
#[derive(Debug)]
pub enum AgentServiceError {
    Validation(AgentValidationError),
    DuplicateEmail(String),
    AgentNotFound(AgentId),
    /// Credential could not be hashed.
    Credential(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AgentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => {
                write!(f, "an agent with email `{email}` already exists")
            }
            Self::AgentNotFound(id) => write!(f, "agent not found: {id}"),
            Self::Credential(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AgentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AgentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::NotFound { id, .. } => Self::AgentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<AgentValidationError> for AgentServiceError {
    fn from(value: AgentValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Agent service facade over repository implementations.
pub struct AgentService<R: AgentRepository> {
    repo: R,
}

impl<R: AgentRepository> AgentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new agent and returns its public record.
    pub fn register_agent(&self, agent: &NewAgent) -> Result<Agent, AgentServiceError> {
        agent.validate()?;
        let credential_hash =
            hash_credential(&agent.credential).map_err(AgentServiceError::Credential)?;

        match self.repo.create_agent(agent, &credential_hash) {
            Ok(created) => {
                info!(
                    "event=agent_register module=service status=ok agent_id={}",
                    created.id
                );
                Ok(created)
            }
            Err(err) => {
                warn!(
                    "event=agent_register module=service status=error error_code={}",
                    err.code()
                );
                Err(err.into())
            }
        }
    }

    /// Lists agents in registration order.
    pub fn list_agents(&self) -> Result<Vec<Agent>, AgentServiceError> {
        Ok(self.repo.list_agents()?)
    }

    pub fn get_agent(&self, id: AgentId) -> Result<Agent, AgentServiceError> {
        self.repo
            .get_agent(id)?
            .ok_or(AgentServiceError::AgentNotFound(id))
    }

    /// Removes an agent. Lists already assigned to it stay stored.
    pub fn remove_agent(&self, id: AgentId) -> Result<(), AgentServiceError> {
        self.repo.delete_agent(id)?;
        info!("event=agent_remove module=service status=ok agent_id={id}");
        Ok(())
    }
}
