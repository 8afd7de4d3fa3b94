//! Distribution run orchestration.
//!
//! # Responsibility
//! - Run the upload pipeline: parse, validate, fetch agents, partition,
//!   replace the stored distribution.
//! - Accept client-built distributions and check them against the registry
//!   before persisting.
//! - Serve read access to the stored distribution.
//!
//! # Invariants
//! - Parse and schema failures are reported before the registry is read.
//! - Nothing is written unless every earlier stage succeeded.
//! - A failed store write leaves the previous distribution in place.

use crate::distribute::{assign_to_agents, DistributeError};
use crate::import::{parse_table, FileFormat, ImportError};
use crate::model::agent::AgentId;
use crate::model::assigned_list::{AssignedList, ListDraft};
use crate::model::contact::ContactRecord;
use crate::repo::agent_repo::AgentRepository;
use crate::repo::list_repo::ListRepository;
use crate::repo::RepoError;
use crate::schema::{validate_table, SchemaError};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for distribution use-cases.
#[derive(Debug)]
pub enum DistributionServiceError {
    Import(ImportError),
    Schema(SchemaError),
    NoRecipients,
    /// Client payload has no groups.
    EmptyPayload,
    /// Client payload references an agent the registry does not know.
    UnknownAgent(AgentId),
    /// Client payload lists the same agent twice.
    DuplicateAgent(AgentId),
    /// Client payload item misses a required value. Indexes are 1-based.
    InvalidItem {
        list: usize,
        item: usize,
        column: &'static str,
    },
    /// No stored list for this agent.
    ListNotFound(AgentId),
    /// The replace transaction failed and was rolled back.
    StoreWriteFailure(RepoError),
    /// Read-side persistence failure.
    Repo(RepoError),
}

impl Display for DistributionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::NoRecipients => write!(f, "{}", DistributeError::NoRecipients),
            Self::EmptyPayload => write!(f, "invalid distribution data: no lists provided"),
            Self::UnknownAgent(id) => write!(f, "agent with id {id} not found"),
            Self::DuplicateAgent(id) => {
                write!(f, "agent with id {id} appears more than once")
            }
            Self::InvalidItem { list, item, column } => {
                write!(f, "list {list}, item {item}: {column} must not be empty")
            }
            Self::ListNotFound(id) => write!(f, "no list found for agent {id}"),
            Self::StoreWriteFailure(err) => write!(f, "failed to store distribution: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DistributionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Import(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::StoreWriteFailure(err) | Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ImportError> for DistributionServiceError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<SchemaError> for DistributionServiceError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DistributeError> for DistributionServiceError {
    fn from(value: DistributeError) -> Self {
        match value {
            DistributeError::NoRecipients => Self::NoRecipients,
        }
    }
}

impl From<RepoError> for DistributionServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of one successful distribution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionOutcome {
    /// Persisted lists in distribution order.
    pub lists: Vec<AssignedList>,
    /// Number of records distributed.
    pub total_items: usize,
    /// Number of agents that received a list (possibly empty).
    pub agent_count: usize,
}

impl DistributionOutcome {
    fn from_lists(lists: Vec<AssignedList>) -> Self {
        let total_items = lists.iter().map(|list| list.items.len()).sum();
        let agent_count = lists.len();
        Self {
            lists,
            total_items,
            agent_count,
        }
    }
}

/// Distribution service facade over the agent registry and the list store.
pub struct DistributionService<A: AgentRepository, L: ListRepository> {
    agents: A,
    lists: L,
}

impl<A: AgentRepository, L: ListRepository> DistributionService<A, L> {
    pub fn new(agents: A, lists: L) -> Self {
        Self { agents, lists }
    }

    /// Parses and validates an upload without touching storage.
    pub fn preview(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Vec<ContactRecord>, DistributionServiceError> {
        let format = FileFormat::from_file_name(file_name)?;
        let records = decode_records(format, bytes)?;
        info!(
            "event=upload_preview module=service status=ok format={} record_count={}",
            format.as_str(),
            records.len()
        );
        Ok(records)
    }

    /// Runs the full upload pipeline and replaces the stored distribution.
    pub fn distribute_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DistributionOutcome, DistributionServiceError> {
        let started_at = Instant::now();
        let format = match FileFormat::from_file_name(file_name) {
            Ok(format) => format,
            Err(err) => {
                warn!(
                    "event=distribution_run module=service status=error stage=format error_code=unsupported_format"
                );
                return Err(err.into());
            }
        };
        info!(
            "event=distribution_run module=service status=start format={} byte_count={}",
            format.as_str(),
            bytes.len()
        );

        let records = match decode_records(format, bytes) {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "event=distribution_run module=service status=error stage=validate duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };

        let outcome = self.distribute_records(&records)?;
        info!(
            "event=distribution_run module=service status=ok format={} record_count={} agent_count={} duration_ms={}",
            format.as_str(),
            outcome.total_items,
            outcome.agent_count,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    /// Partitions already-validated records across all registered agents and
    /// replaces the stored distribution.
    pub fn distribute_records(
        &self,
        records: &[ContactRecord],
    ) -> Result<DistributionOutcome, DistributionServiceError> {
        if records.is_empty() {
            return Err(SchemaError::EmptyInput.into());
        }

        let agents = self.agents.list_agents()?;
        let drafts = assign_to_agents(records, &agents)?;
        self.store(&drafts)
    }

    /// Persists a client-built distribution after checking it against the
    /// registry.
    pub fn distribute_payload(
        &self,
        drafts: &[ListDraft],
    ) -> Result<DistributionOutcome, DistributionServiceError> {
        if drafts.is_empty() {
            return Err(DistributionServiceError::EmptyPayload);
        }

        let mut seen = HashSet::with_capacity(drafts.len());
        for (list_index, draft) in drafts.iter().enumerate() {
            if !seen.insert(draft.agent_id) {
                return Err(DistributionServiceError::DuplicateAgent(draft.agent_id));
            }
            if self.agents.get_agent(draft.agent_id)?.is_none() {
                return Err(DistributionServiceError::UnknownAgent(draft.agent_id));
            }
            for (item_index, item) in draft.items.iter().enumerate() {
                if let Some(column) = item.first_blank_required() {
                    return Err(DistributionServiceError::InvalidItem {
                        list: list_index + 1,
                        item: item_index + 1,
                        column,
                    });
                }
            }
        }

        self.store(drafts)
    }

    /// Stored lists, most recent first.
    pub fn list_all(&self) -> Result<Vec<AssignedList>, DistributionServiceError> {
        Ok(self.lists.list_lists()?)
    }

    /// The stored list for one agent.
    pub fn get_by_agent(
        &self,
        agent_id: AgentId,
    ) -> Result<AssignedList, DistributionServiceError> {
        self.lists
            .get_list_for_agent(agent_id)?
            .ok_or(DistributionServiceError::ListNotFound(agent_id))
    }

    /// Number of records in the stored distribution.
    pub fn total_items(&self) -> Result<u64, DistributionServiceError> {
        Ok(self.lists.count_items()?)
    }

    fn store(
        &self,
        drafts: &[ListDraft],
    ) -> Result<DistributionOutcome, DistributionServiceError> {
        match self.lists.replace_lists(drafts) {
            Ok(lists) => Ok(DistributionOutcome::from_lists(lists)),
            Err(err) => {
                error!(
                    "event=distribution_store module=service status=error error_code=store_write_failed"
                );
                Err(DistributionServiceError::StoreWriteFailure(err))
            }
        }
    }
}

fn decode_records(
    format: FileFormat,
    bytes: &[u8],
) -> Result<Vec<ContactRecord>, DistributionServiceError> {
    let table = parse_table(format, bytes)?;
    Ok(validate_table(&table)?)
}
